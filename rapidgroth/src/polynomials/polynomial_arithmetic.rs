use ark_ff::FftField;
use rayon::prelude::*;

use super::evaluation_domain::EvaluationDomain;

/// Multiplies `values[i]` by the `i`-th power of the primitive `2^power`-th root of unity.
///
/// With `power = log2(n) + 1` this moves coefficients of a degree < n polynomial onto the
/// coset of odd powers of ω_{2n}, so a following size-n fft evaluates there.
pub(crate) fn coset_shift<F: FftField>(values: &mut [F], domain: &EvaluationDomain<F>, power: usize) {
    values
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, v)| *v *= domain.root(power, i));
}

/// Horner evaluation of `coeffs` at `z`.
#[cfg(test)]
pub(crate) fn evaluate<F: FftField>(coeffs: &[F], z: &F) -> F {
    coeffs.iter().rev().fold(F::zero(), |acc, c| acc * z + c)
}
