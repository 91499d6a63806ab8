pub mod prover;
pub mod proving_key;
pub(crate) mod quotient;
pub(crate) mod reducer;
pub mod types;
