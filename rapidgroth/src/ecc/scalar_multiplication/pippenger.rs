use ark_ec::short_weierstrass::{Affine, Projective, SWCurveConfig};
use ark_ec::Group;
use ark_ff::Zero;
use rayon::prelude::*;

use super::device::{
    device_to_fq2, limbs_to_fq, DeviceG1Affine, DeviceG1Jacobian, DeviceG2Affine,
    DeviceG2Jacobian, DeviceKernel, DeviceScalar,
};
use super::runtime_states::{get_num_buckets, get_num_rounds, get_optimal_bucket_width};
use crate::ecc::curves::{G1Affine, G2Affine};
use crate::errors::ProverError;

/// [`DeviceKernel`] that runs a windowed bucket msm on the host, straight off the device layout.
///
/// Coordinates are taken as they come: no curve check on the inputs, same as a device would.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostKernel;

/// `c` bits of a little-endian 4-limb scalar starting at bit `offset`.
#[inline]
fn get_window(scalar: &DeviceScalar, offset: usize, c: usize) -> usize {
    let limb = offset / 64;
    if limb >= scalar.len() {
        return 0;
    }
    let shift = offset % 64;
    let mut bits = scalar[limb] >> shift;
    if shift + c > 64 && limb + 1 < scalar.len() {
        bits |= scalar[limb + 1] << (64 - shift);
    }
    (bits & ((1u64 << c) - 1)) as usize
}

/// Σ scalars[i]·points[i] by the bucket method, one rayon task per window.
pub(crate) fn pippenger<P: SWCurveConfig>(
    points: &[Affine<P>],
    scalars: &[DeviceScalar],
) -> Projective<P> {
    let num_points = points.len();
    let c = get_optimal_bucket_width(num_points);
    let num_buckets = get_num_buckets(num_points);

    let window_sums: Vec<Projective<P>> = (0..get_num_rounds(num_points))
        .into_par_iter()
        .map(|round| {
            let mut buckets = vec![Projective::<P>::zero(); num_buckets];
            for (point, scalar) in points.iter().zip(scalars) {
                let digit = get_window(scalar, round * c, c);
                if digit != 0 {
                    buckets[digit - 1] += point;
                }
            }
            // Σ d·bucket[d] as a running sum from the top bucket down
            let mut running = Projective::<P>::zero();
            let mut sum = Projective::<P>::zero();
            for bucket in buckets.into_iter().rev() {
                running += bucket;
                sum += running;
            }
            sum
        })
        .collect();

    window_sums
        .into_iter()
        .rev()
        .fold(Projective::<P>::zero(), |mut acc, window_sum| {
            for _ in 0..c {
                acc.double_in_place();
            }
            acc + window_sum
        })
}

impl DeviceKernel for HostKernel {
    fn g1_msm(
        &self,
        points: &[DeviceG1Affine],
        scalars: &[DeviceScalar],
    ) -> Result<DeviceG1Jacobian, ProverError> {
        let points = points
            .par_iter()
            .map(|p| {
                if *p == DeviceG1Affine::default() {
                    return Ok(G1Affine::identity());
                }
                Ok(G1Affine::new_unchecked(limbs_to_fq(&p.x)?, limbs_to_fq(&p.y)?))
            })
            .collect::<Result<Vec<_>, ProverError>>()?;
        Ok(DeviceG1Jacobian::from(&pippenger(&points, scalars)))
    }

    fn g2_msm(
        &self,
        points: &[DeviceG2Affine],
        scalars: &[DeviceScalar],
    ) -> Result<DeviceG2Jacobian, ProverError> {
        let points = points
            .par_iter()
            .map(|p| Ok(G2Affine::new_unchecked(device_to_fq2(&p.x)?, device_to_fq2(&p.y)?)))
            .collect::<Result<Vec<_>, ProverError>>()?;
        Ok(DeviceG2Jacobian::from(&pippenger(&points, scalars)))
    }
}
