pub mod proof_system;

pub use proof_system::prover::{Prover, ProverConfig};
pub use proof_system::proving_key::{Coefficient, Matrix, ProvingKey};
pub use proof_system::types::Proof;
