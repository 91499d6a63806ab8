use ark_ff::{FftField, Field};
use rayon::prelude::*;
use tracing::debug;

use crate::errors::ProverError;
use crate::numeric::bitop::Msb;

/// Below this many butterflies in one block the block is processed by a single thread.
pub(crate) const MIN_GROUP_PER_THREAD: usize = 1 << 10;

/// Below this many elements the root table is filled by a single thread.
const MIN_ROOTS_PER_THREAD: usize = 1 << 12;

/// Radix-2 fft engine over every power-of-two size up to `max_size`.
///
/// Only half of the `max_size`-th roots are stored, `ω^(i + max_size/2) = -ω^i` gives the rest.
#[derive(Debug, Clone)]
pub struct EvaluationDomain<F: FftField> {
    /// largest supported transform, always a power of 2
    max_size: usize,
    log2_max_size: usize,
    /// roots[i] = ω^i for i < max(max_size / 2, 1), ω a primitive max_size-th root of unity
    roots: Vec<F>,
    /// size_inverses[k] = (2^k)^{-1}
    size_inverses: Vec<F>,
}

/// The domain used by the prover.
pub type Bn254EvaluationDomain = EvaluationDomain<ark_bn254::Fr>;

/// Fills `roots` with successive powers of `root`, one chunk per thread.
fn compute_lookup_table<F: Field>(root: F, roots: &mut [F]) {
    roots
        .par_chunks_mut(MIN_ROOTS_PER_THREAD)
        .enumerate()
        .for_each(|(j, chunk)| {
            let mut work_root = root.pow([(j * MIN_ROOTS_PER_THREAD) as u64]);
            for r in chunk.iter_mut() {
                *r = work_root;
                work_root *= root;
            }
        });
}

fn bit_reverse_permutation<F>(values: &mut [F], log2_size: usize) {
    if log2_size == 0 {
        return;
    }
    let shift = usize::BITS as usize - log2_size;
    for i in 0..values.len() {
        let j = i.reverse_bits() >> shift;
        if i < j {
            values.swap(i, j);
        }
    }
}

#[inline(always)]
fn butterfly<F: Field>(x: &mut F, y: &mut F, twiddle: &F) {
    let t = *y * twiddle;
    *y = *x - t;
    *x += t;
}

fn butterflies<F: Field>(lo: &mut [F], hi: &mut [F], twiddles: &[F]) {
    if lo.len() >= MIN_GROUP_PER_THREAD {
        lo.par_iter_mut()
            .zip(hi.par_iter_mut())
            .zip(twiddles.par_iter())
            .for_each(|((x, y), w)| butterfly(x, y, w));
    } else {
        for ((x, y), w) in lo.iter_mut().zip(hi.iter_mut()).zip(twiddles) {
            butterfly(x, y, w);
        }
    }
}

impl<F: FftField> EvaluationDomain<F> {
    /// Precomputes roots for transforms of every power-of-two size up to `max_size`.
    ///
    /// Fails if `max_size` is not a power of two or exceeds the two-adicity of the field.
    pub fn new(max_size: usize) -> Result<Self, ProverError> {
        let domain_error = ProverError::DomainSize {
            size: max_size,
            max_size: 1usize << F::TWO_ADICITY,
        };
        if !max_size.is_power_of_two() {
            return Err(domain_error);
        }
        let log2_max_size = max_size.get_msb();
        if log2_max_size > F::TWO_ADICITY as usize {
            return Err(domain_error);
        }
        let root = F::get_root_of_unity(max_size as u64).ok_or(domain_error)?;

        let mut roots = vec![F::zero(); (max_size / 2).max(1)];
        compute_lookup_table(root, &mut roots);

        let two_inverse = F::from(2u64).inverse().ok_or(ProverError::DomainSize {
            size: max_size,
            max_size: 0,
        })?;
        let mut size_inverses = Vec::with_capacity(log2_max_size + 1);
        let mut acc = F::one();
        for _ in 0..=log2_max_size {
            size_inverses.push(acc);
            acc *= two_inverse;
        }

        debug!(max_size, "fft root table ready");
        Ok(Self {
            max_size,
            log2_max_size,
            roots,
            size_inverses,
        })
    }

    /// Largest transform size this domain supports.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// log2 of [`Self::max_size`].
    pub fn log2_max_size(&self) -> usize {
        self.log2_max_size
    }

    /// log2 of a power of two.
    ///
    /// # Panics
    /// If `size` is not a power of two.
    pub fn log2(&self, size: usize) -> usize {
        assert!(
            size.is_power_of_two(),
            "{size} is not a power of two, no log2 in the domain"
        );
        size.get_msb()
    }

    /// ω^e where ω is the primitive `max_size`-th root, for `e < max_size`.
    fn root_by_exponent(&self, e: usize) -> F {
        let half = self.roots.len();
        if e < half {
            self.roots[e]
        } else {
            -self.roots[e - half]
        }
    }

    /// `index`-th power of the primitive `2^power`-th root of unity.
    ///
    /// # Panics
    /// If `power` is above [`Self::log2_max_size`].
    pub fn root(&self, power: usize, index: usize) -> F {
        assert!(
            power <= self.log2_max_size,
            "no 2^{power}-th roots in a domain of size {}",
            self.max_size
        );
        let e = (index << (self.log2_max_size - power)) & (self.max_size - 1);
        self.root_by_exponent(e)
    }

    fn check_size(&self, len: usize, size: usize) -> Result<usize, ProverError> {
        if !size.is_power_of_two() || size > self.max_size || len != size {
            return Err(ProverError::DomainSize {
                size: len.max(size),
                max_size: self.max_size,
            });
        }
        Ok(size.get_msb())
    }

    /// Evaluates the polynomial with coefficients `values` on the size-`size` subgroup, in place.
    ///
    /// Output is in natural order, `values[i] = p(ω_size^i)`.
    pub fn fft(&self, values: &mut [F], size: usize) -> Result<(), ProverError> {
        let log2_size = self.check_size(values.len(), size)?;
        self.transform(values, log2_size, false);
        Ok(())
    }

    /// Inverse of [`Self::fft`]: evaluations in natural order back to coefficients.
    pub fn ifft(&self, values: &mut [F], size: usize) -> Result<(), ProverError> {
        let log2_size = self.check_size(values.len(), size)?;
        self.transform(values, log2_size, true);
        let size_inverse = self.size_inverses[log2_size];
        values.par_iter_mut().for_each(|v| *v *= size_inverse);
        Ok(())
    }

    fn transform(&self, values: &mut [F], log2_size: usize, inverse: bool) {
        let n = values.len();
        if n <= 1 {
            return;
        }
        bit_reverse_permutation(values, log2_size);

        let mut m = 1;
        while m < n {
            // twiddles of this round are the (2m)-th roots, ω_{2m} = ω^(max_size / 2m)
            let step = self.log2_max_size - (m.get_msb() + 1);
            let twiddles: Vec<F> = (0..m)
                .map(|j| {
                    let e = j << step;
                    if inverse && e != 0 {
                        self.root_by_exponent(self.max_size - e)
                    } else {
                        self.root_by_exponent(e)
                    }
                })
                .collect();
            values.par_chunks_mut(2 * m).for_each(|block| {
                let (lo, hi) = block.split_at_mut(m);
                butterflies(lo, hi, &twiddles);
            });
            m <<= 1;
        }
    }
}
