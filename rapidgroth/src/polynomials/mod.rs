pub mod evaluation_domain;
pub(crate) mod polynomial_arithmetic;

pub use evaluation_domain::{Bn254EvaluationDomain, EvaluationDomain};
