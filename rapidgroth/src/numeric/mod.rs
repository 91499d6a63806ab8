/// bit twiddling on domain sizes and bucket widths
pub(crate) mod bitop;
