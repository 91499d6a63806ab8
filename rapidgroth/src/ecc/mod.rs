/// bn254 types the prover works over
pub mod curves;
/// msm backends
pub mod scalar_multiplication;
