use ark_ff::PrimeField;
use rayon::prelude::*;
use tracing::debug;

use crate::ecc::curves::{Fr, ScalarRepr};
use crate::errors::ProverError;
use crate::polynomials::polynomial_arithmetic::coset_shift;
use crate::polynomials::Bn254EvaluationDomain;

/// Interpolates `values` over the size-`domain_size` subgroup and re-evaluates the result on
/// the odd powers of ω_{2·domain_size}.
fn evaluate_on_coset(
    domain: &Bn254EvaluationDomain,
    values: &mut [Fr],
    domain_size: usize,
    power: usize,
) -> Result<(), ProverError> {
    domain.ifft(values, domain_size)?;
    coset_shift(values, domain, power);
    domain.fft(values, domain_size)
}

/// Scalars for the H msm: `A(x)·B(x) - C(x)` at `x = ω_{2n}^{2i+1}`, as canonical limbs.
///
/// `a`, `b`, `c` hold evaluations over the size-n subgroup and are consumed in place.
/// The three transforms run in parallel.
pub(crate) fn compute_quotient_scalars(
    domain: &Bn254EvaluationDomain,
    mut a: Vec<Fr>,
    mut b: Vec<Fr>,
    mut c: Vec<Fr>,
    domain_size: usize,
) -> Result<Vec<ScalarRepr>, ProverError> {
    let power = domain.log2(domain_size) + 1;
    if power > domain.log2_max_size() {
        return Err(ProverError::DomainSize {
            size: 2 * domain_size,
            max_size: domain.max_size(),
        });
    }

    let (ra, (rb, rc)) = rayon::join(
        || evaluate_on_coset(domain, &mut a, domain_size, power),
        || {
            rayon::join(
                || evaluate_on_coset(domain, &mut b, domain_size, power),
                || evaluate_on_coset(domain, &mut c, domain_size, power),
            )
        },
    );
    ra?;
    rb?;
    rc?;
    debug!(domain_size, "a, b, c moved to the odd coset");

    Ok(a.par_iter()
        .zip(b.par_iter())
        .zip(c.par_iter())
        .map(|((a, b), c)| (*a * b - c).into_bigint())
        .collect())
}
