use rayon::prelude::*;

use crate::ecc::curves::{Fr, G1Affine, G2Affine};
use crate::errors::ProverError;

/// Which constraint matrix a [`Coefficient`] belongs to. C is never stored, the prover recovers
/// it as the pointwise product of A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Matrix {
    #[allow(missing_docs)]
    A,
    #[allow(missing_docs)]
    B,
}

/// One non-zero entry of the A or B matrix: `value` at (`row`, `col`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coefficient {
    #[allow(missing_docs)]
    pub matrix: Matrix,
    /// constraint index, below `domain_size`
    pub row: u32,
    /// witness index, below `n_vars`
    pub col: u32,
    #[allow(missing_docs)]
    pub value: Fr,
}

/// Groth16 proving key over bn254.
///
/// Immutable once built. A prover holds it behind an `Arc` and any number of proofs
/// can read it at the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvingKey {
    /// number of witness variables, including the constant one at index 0
    pub n_vars: usize,
    /// number of public inputs, stored at witness indices `1..=n_public`
    pub n_public: usize,
    /// evaluation domain size, a power of two covering every constraint row
    pub domain_size: usize,
    #[allow(missing_docs)]
    pub alpha1: G1Affine,
    #[allow(missing_docs)]
    pub beta1: G1Affine,
    #[allow(missing_docs)]
    pub beta2: G2Affine,
    /// only the verifier needs it, kept so a loaded key can be written back out
    pub gamma2: G2Affine,
    #[allow(missing_docs)]
    pub delta1: G1Affine,
    #[allow(missing_docs)]
    pub delta2: G2Affine,
    /// verifier bases for the public inputs, `n_public + 1` of them
    pub ic: Vec<G1Affine>,
    /// sparse entries of A and B in file order
    pub coefficients: Vec<Coefficient>,
    /// `n_vars` bases
    pub points_a: Vec<G1Affine>,
    /// `n_vars` bases
    pub points_b1: Vec<G1Affine>,
    /// `n_vars` bases
    pub points_b2: Vec<G2Affine>,
    /// one base per private variable, `n_vars - n_public - 1` of them
    pub points_c: Vec<G1Affine>,
    /// `domain_size` bases
    pub points_h: Vec<G1Affine>,
}

impl ProvingKey {
    /// Number of stored A and B coefficients.
    pub fn n_coefs(&self) -> usize {
        self.coefficients.len()
    }

    /// Number of private witness variables.
    pub fn n_private(&self) -> usize {
        self.n_vars.saturating_sub(self.n_public + 1)
    }

    /// Checks every structural invariant the prover relies on.
    pub fn validate(&self) -> Result<(), ProverError> {
        let invalid = |msg: String| Err(ProverError::InvalidKey(msg));

        if !self.domain_size.is_power_of_two() {
            return invalid(format!(
                "domain size {} is not a power of two",
                self.domain_size
            ));
        }
        if self.n_vars < self.n_public + 1 {
            return invalid(format!(
                "{} variables cannot hold the constant and {} public inputs",
                self.n_vars, self.n_public
            ));
        }
        let lengths = [
            ("ic", self.ic.len(), self.n_public + 1),
            ("A", self.points_a.len(), self.n_vars),
            ("B1", self.points_b1.len(), self.n_vars),
            ("B2", self.points_b2.len(), self.n_vars),
            ("C", self.points_c.len(), self.n_private()),
            ("H", self.points_h.len(), self.domain_size),
        ];
        for (name, actual, expected) in lengths {
            if actual != expected {
                return invalid(format!(
                    "{name} has {actual} points, expected {expected}"
                ));
            }
        }
        if let Some(c) = self.coefficients.par_iter().find_any(|c| {
            c.row as usize >= self.domain_size || c.col as usize >= self.n_vars
        }) {
            return invalid(format!(
                "coefficient at ({}, {}) is outside {} rows x {} variables",
                c.row, c.col, self.domain_size, self.n_vars
            ));
        }
        Ok(())
    }
}
