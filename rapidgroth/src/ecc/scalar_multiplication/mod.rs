//! Multi-scalar multiplication behind one interface.
//!
//! [`CpuMsm`] runs arkworks' bucket msm on the host. [`DeviceMsm`] stages bases and
//! scalars into the accelerator layout and hands them to a [`DeviceKernel`].
//! Both take canonical scalars and return the same group element for the same input.

mod device;
mod pippenger;
pub(crate) mod runtime_states;


use std::fmt::Debug;

use ark_ec::VariableBaseMSM;

use crate::ecc::curves::{G1Affine, G1Projective, G2Affine, G2Projective, ScalarRepr};
use crate::errors::ProverError;

pub use device::{
    DeviceFq2, DeviceG1Affine, DeviceG1Jacobian, DeviceG2Affine, DeviceG2Jacobian, DeviceKernel,
    DeviceMsm, DeviceScalar, Limbs,
};
pub use pippenger::HostKernel;

/// Computes Σ scalars[i]·points[i] in G1 and G2.
///
/// Implementations must be callable from several threads at once, the prover
/// issues its five msms concurrently.
pub trait MsmBackend: Send + Sync + Debug {
    /// msm in G1. `points` and `scalars` must have the same length.
    fn msm_g1(&self, points: &[G1Affine], scalars: &[ScalarRepr])
        -> Result<G1Projective, ProverError>;

    /// msm in G2. `points` and `scalars` must have the same length.
    fn msm_g2(&self, points: &[G2Affine], scalars: &[ScalarRepr])
        -> Result<G2Projective, ProverError>;
}

pub(crate) fn check_lengths(points: usize, scalars: usize) -> Result<(), ProverError> {
    if points != scalars {
        return Err(ProverError::MsmLength { points, scalars });
    }
    Ok(())
}

/// Host msm on arkworks' variable-base bucket method.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuMsm;

impl MsmBackend for CpuMsm {
    fn msm_g1(
        &self,
        points: &[G1Affine],
        scalars: &[ScalarRepr],
    ) -> Result<G1Projective, ProverError> {
        check_lengths(points.len(), scalars.len())?;
        Ok(G1Projective::msm_bigint(points, scalars))
    }

    fn msm_g2(
        &self,
        points: &[G2Affine],
        scalars: &[ScalarRepr],
    ) -> Result<G2Projective, ProverError> {
        check_lengths(points.len(), scalars.len())?;
        Ok(G2Projective::msm_bigint(points, scalars))
    }
}
