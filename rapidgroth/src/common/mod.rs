/// thread pool sizing
pub(crate) mod max_threads;
