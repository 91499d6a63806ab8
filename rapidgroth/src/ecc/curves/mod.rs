use ark_ff::PrimeField;

pub use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G1Projective, G2Affine, G2Projective};

/// Canonical little-endian limbs of a scalar, the form msm backends consume.
pub type ScalarRepr = <Fr as PrimeField>::BigInt;

/// Bit length of the scalar field modulus. Canonical scalars never set a higher bit.
pub const SCALAR_BITS: usize = Fr::MODULUS_BIT_SIZE as usize;
