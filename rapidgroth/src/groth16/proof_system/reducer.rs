//! Sparse A·w and B·w over the evaluation domain.
//!
//! Coefficients are bucketed by row stripe once per key. Every stripe owns a disjoint
//! window of the output vectors, so stripes accumulate in parallel without locks and the
//! per-row sums match a sequential fold exactly.

use ark_ff::Zero;
use rayon::prelude::*;

use super::proving_key::{Coefficient, Matrix};
use crate::ecc::curves::Fr;

/// Upper bound on the number of row stripes.
pub(crate) const NUM_STRIPES: usize = 1024;

/// Coefficients grouped by the row stripe they write to.
#[derive(Debug, Clone)]
pub(crate) struct CoefficientPartition {
    domain_size: usize,
    stripe_rows: usize,
    stripes: Vec<Vec<Coefficient>>,
}

impl CoefficientPartition {
    /// Buckets `coefficients`. Rows must be below `domain_size`.
    pub(crate) fn new(coefficients: &[Coefficient], domain_size: usize) -> Self {
        let stripe_rows = ((domain_size + NUM_STRIPES - 1) / NUM_STRIPES).max(1);
        let num_stripes = (domain_size + stripe_rows - 1) / stripe_rows;

        let mut counts = vec![0usize; num_stripes];
        for c in coefficients {
            counts[c.row as usize / stripe_rows] += 1;
        }
        let mut stripes: Vec<Vec<Coefficient>> =
            counts.into_iter().map(Vec::with_capacity).collect();
        for c in coefficients {
            stripes[c.row as usize / stripe_rows].push(*c);
        }

        Self {
            domain_size,
            stripe_rows,
            stripes,
        }
    }

    pub(crate) fn num_stripes(&self) -> usize {
        self.stripes.len()
    }

    /// `(A·w, B·w)`, each of length `domain_size`. `witness` must cover every column.
    pub(crate) fn reduce(&self, witness: &[Fr]) -> (Vec<Fr>, Vec<Fr>) {
        let mut a = vec![Fr::zero(); self.domain_size];
        let mut b = vec![Fr::zero(); self.domain_size];

        a.par_chunks_mut(self.stripe_rows)
            .zip(b.par_chunks_mut(self.stripe_rows))
            .zip(self.stripes.par_iter())
            .enumerate()
            .for_each(|(i, ((a_stripe, b_stripe), coefficients))| {
                let first_row = i * self.stripe_rows;
                for c in coefficients {
                    let target = match c.matrix {
                        Matrix::A => &mut *a_stripe,
                        Matrix::B => &mut *b_stripe,
                    };
                    target[c.row as usize - first_row] += witness[c.col as usize] * c.value;
                }
            });

        (a, b)
    }
}

/// Single-threaded fold in file order, the reference [`CoefficientPartition::reduce`] must match.
#[cfg(test)]
pub(crate) fn reduce_sequential(
    coefficients: &[Coefficient],
    witness: &[Fr],
    domain_size: usize,
) -> (Vec<Fr>, Vec<Fr>) {
    let mut a = vec![Fr::zero(); domain_size];
    let mut b = vec![Fr::zero(); domain_size];
    for c in coefficients {
        let target = match c.matrix {
            Matrix::A => &mut a,
            Matrix::B => &mut b,
        };
        target[c.row as usize] += witness[c.col as usize] * c.value;
    }
    (a, b)
}

/// Pointwise `a[i]·b[i]`, the C evaluations of a satisfied system.
pub(crate) fn compute_c(a: &[Fr], b: &[Fr]) -> Vec<Fr> {
    a.par_iter().zip(b.par_iter()).map(|(x, y)| *x * y).collect()
}

#[cfg(test)]
mod tests {
    use ark_ff::{One, UniformRand};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use proptest::prelude::*;

    use super::*;

    fn random_coefficients(
        n: usize,
        domain_size: usize,
        n_vars: usize,
        rng: &mut StdRng,
    ) -> Vec<Coefficient> {
        use ark_std::rand::Rng;
        (0..n)
            .map(|_| Coefficient {
                matrix: if rng.gen() { Matrix::A } else { Matrix::B },
                row: rng.gen_range(0..domain_size) as u32,
                col: rng.gen_range(0..n_vars) as u32,
                value: Fr::rand(rng),
            })
            .collect()
    }

    #[test]
    fn stripes_partition_the_domain() {
        assert_eq!(CoefficientPartition::new(&[], 1).num_stripes(), 1);
        assert_eq!(CoefficientPartition::new(&[], 8).num_stripes(), 8);
        assert_eq!(CoefficientPartition::new(&[], 1 << 16).num_stripes(), NUM_STRIPES);
    }

    #[test]
    fn reduce_matches_sequential_fold() {
        let mut rng = StdRng::seed_from_u64(7);
        for (domain_size, n_vars, n_coefs) in [(1, 1, 3), (8, 5, 20), (4096, 300, 10_000)] {
            let coefficients = random_coefficients(n_coefs, domain_size, n_vars, &mut rng);
            let witness: Vec<Fr> = (0..n_vars).map(|_| Fr::rand(&mut rng)).collect();

            let partition = CoefficientPartition::new(&coefficients, domain_size);
            assert_eq!(
                partition.reduce(&witness),
                reduce_sequential(&coefficients, &witness, domain_size)
            );
        }
    }

    #[test]
    fn rows_without_coefficients_stay_zero() {
        let coefficients = [
            Coefficient {
                matrix: Matrix::A,
                row: 2,
                col: 0,
                value: Fr::from(3u64),
            },
            Coefficient {
                matrix: Matrix::A,
                row: 2,
                col: 1,
                value: Fr::from(4u64),
            },
            Coefficient {
                matrix: Matrix::B,
                row: 0,
                col: 1,
                value: Fr::one(),
            },
        ];
        let witness = [Fr::one(), Fr::from(10u64)];
        let (a, b) = CoefficientPartition::new(&coefficients, 4).reduce(&witness);

        assert_eq!(a, vec![Fr::zero(), Fr::zero(), Fr::from(43u64), Fr::zero()]);
        assert_eq!(b, vec![Fr::from(10u64), Fr::zero(), Fr::zero(), Fr::zero()]);
        assert_eq!(compute_c(&a, &b), vec![Fr::zero(); 4]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn reduce_ignores_coefficient_order(seed in any::<u64>(), log2_domain in 0usize..12) {
            let mut rng = StdRng::seed_from_u64(seed);
            let domain_size = 1 << log2_domain;
            let mut coefficients = random_coefficients(200, domain_size, 16, &mut rng);
            let witness: Vec<Fr> = (0..16).map(|_| Fr::rand(&mut rng)).collect();

            let expected = reduce_sequential(&coefficients, &witness, domain_size);
            coefficients.reverse();
            let reduced = CoefficientPartition::new(&coefficients, domain_size).reduce(&witness);
            prop_assert_eq!(reduced, expected);
        }
    }
}
