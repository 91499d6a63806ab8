use std::fmt::Debug;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInt, PrimeField, Zero};
use rayon::prelude::*;
use tracing::debug;

use super::{check_lengths, MsmBackend};
use crate::ecc::curves::{Fq, Fq2, G1Affine, G1Projective, G2Affine, G2Projective, ScalarRepr};
use crate::errors::ProverError;

/// Canonical (non-Montgomery) little-endian u64 limbs of a base or scalar field element.
pub type Limbs = [u64; 4];

/// A scalar as the device reads it.
pub type DeviceScalar = Limbs;

/// Affine G1 base. `(0, 0)` is the point at infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceG1Affine {
    #[allow(missing_docs)]
    pub x: Limbs,
    #[allow(missing_docs)]
    pub y: Limbs,
}

/// Jacobian G1 result, `z = 0` is the point at infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceG1Jacobian {
    #[allow(missing_docs)]
    pub x: Limbs,
    #[allow(missing_docs)]
    pub y: Limbs,
    #[allow(missing_docs)]
    pub z: Limbs,
}

/// `real + imaginary·u` in Fq2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFq2 {
    #[allow(missing_docs)]
    pub real: Limbs,
    #[allow(missing_docs)]
    pub imaginary: Limbs,
}

/// Affine G2 base. The device has no encoding for infinity, its scalar must be zero instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceG2Affine {
    #[allow(missing_docs)]
    pub x: DeviceFq2,
    #[allow(missing_docs)]
    pub y: DeviceFq2,
}

/// Jacobian G2 result, `z = 0` is the point at infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceG2Jacobian {
    #[allow(missing_docs)]
    pub x: DeviceFq2,
    #[allow(missing_docs)]
    pub y: DeviceFq2,
    #[allow(missing_docs)]
    pub z: DeviceFq2,
}

/// An accelerator that runs msms over the device layout.
///
/// Inputs have equal length, checked by [`DeviceMsm`] before the call.
pub trait DeviceKernel: Send + Sync + Debug {
    /// G1 msm on device buffers.
    fn g1_msm(
        &self,
        points: &[DeviceG1Affine],
        scalars: &[DeviceScalar],
    ) -> Result<DeviceG1Jacobian, ProverError>;

    /// G2 msm on device buffers.
    fn g2_msm(
        &self,
        points: &[DeviceG2Affine],
        scalars: &[DeviceScalar],
    ) -> Result<DeviceG2Jacobian, ProverError>;
}

pub(crate) fn fq_to_limbs(f: &Fq) -> Limbs {
    f.into_bigint().0
}

pub(crate) fn limbs_to_fq(limbs: &Limbs) -> Result<Fq, ProverError> {
    Fq::from_bigint(BigInt::new(*limbs))
        .ok_or_else(|| ProverError::Msm("device returned a non-canonical coordinate".into()))
}

pub(crate) fn fq2_to_device(f: &Fq2) -> DeviceFq2 {
    DeviceFq2 {
        real: fq_to_limbs(&f.c0),
        imaginary: fq_to_limbs(&f.c1),
    }
}

pub(crate) fn device_to_fq2(f: &DeviceFq2) -> Result<Fq2, ProverError> {
    Ok(Fq2::new(limbs_to_fq(&f.real)?, limbs_to_fq(&f.imaginary)?))
}

impl From<&G1Affine> for DeviceG1Affine {
    fn from(p: &G1Affine) -> Self {
        if p.is_zero() {
            return Self::default();
        }
        Self {
            x: fq_to_limbs(&p.x),
            y: fq_to_limbs(&p.y),
        }
    }
}

impl From<&G1Projective> for DeviceG1Jacobian {
    fn from(p: &G1Projective) -> Self {
        Self {
            x: fq_to_limbs(&p.x),
            y: fq_to_limbs(&p.y),
            z: fq_to_limbs(&p.z),
        }
    }
}

impl From<&G2Projective> for DeviceG2Jacobian {
    fn from(p: &G2Projective) -> Self {
        Self {
            x: fq2_to_device(&p.x),
            y: fq2_to_device(&p.y),
            z: fq2_to_device(&p.z),
        }
    }
}

pub(crate) fn g1_from_device(p: &DeviceG1Jacobian) -> Result<G1Projective, ProverError> {
    let z = limbs_to_fq(&p.z)?;
    if z.is_zero() {
        return Ok(G1Projective::zero());
    }
    let point = G1Projective::new_unchecked(limbs_to_fq(&p.x)?, limbs_to_fq(&p.y)?, z);
    if !point.into_affine().is_on_curve() {
        return Err(ProverError::Msm("device returned a G1 point off the curve".into()));
    }
    Ok(point)
}

pub(crate) fn g2_from_device(p: &DeviceG2Jacobian) -> Result<G2Projective, ProverError> {
    let z = device_to_fq2(&p.z)?;
    if z.is_zero() {
        return Ok(G2Projective::zero());
    }
    let point = G2Projective::new_unchecked(device_to_fq2(&p.x)?, device_to_fq2(&p.y)?, z);
    if !point.into_affine().is_on_curve() {
        return Err(ProverError::Msm("device returned a G2 point off the curve".into()));
    }
    Ok(point)
}

/// [`MsmBackend`] that converts to the device layout and runs a [`DeviceKernel`].
///
/// G2 bases at infinity keep their raw (zero) coordinates, but their scalar is zeroed
/// so the device never accumulates them.
#[derive(Debug, Default, Clone)]
pub struct DeviceMsm<K: DeviceKernel> {
    kernel: K,
}

impl<K: DeviceKernel> DeviceMsm<K> {
    /// Wraps `kernel`.
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }
}

impl<K: DeviceKernel> MsmBackend for DeviceMsm<K> {
    fn msm_g1(
        &self,
        points: &[G1Affine],
        scalars: &[ScalarRepr],
    ) -> Result<G1Projective, ProverError> {
        check_lengths(points.len(), scalars.len())?;
        let device_points: Vec<DeviceG1Affine> = points.par_iter().map(Into::into).collect();
        let device_scalars: Vec<DeviceScalar> = scalars.par_iter().map(|s| s.0).collect();
        debug!(n = points.len(), "device g1 msm");
        let result = self.kernel.g1_msm(&device_points, &device_scalars)?;
        g1_from_device(&result)
    }

    fn msm_g2(
        &self,
        points: &[G2Affine],
        scalars: &[ScalarRepr],
    ) -> Result<G2Projective, ProverError> {
        check_lengths(points.len(), scalars.len())?;
        let (device_points, device_scalars): (Vec<DeviceG2Affine>, Vec<DeviceScalar>) = points
            .par_iter()
            .zip(scalars.par_iter())
            .map(|(p, s)| {
                let point = DeviceG2Affine {
                    x: fq2_to_device(&p.x),
                    y: fq2_to_device(&p.y),
                };
                let scalar = if p.is_zero() { [0u64; 4] } else { s.0 };
                (point, scalar)
            })
            .unzip();
        debug!(n = points.len(), "device g2 msm");
        let result = self.kernel.g2_msm(&device_points, &device_scalars)?;
        g2_from_device(&result)
    }
}
