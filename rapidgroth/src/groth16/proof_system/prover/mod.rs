use std::sync::Arc;
use std::time::Instant;

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{One, PrimeField};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use tracing::{debug, info, info_span, trace, warn};

use super::proving_key::ProvingKey;
use super::quotient::compute_quotient_scalars;
use super::reducer::{compute_c, CoefficientPartition};
use super::types::Proof;
use crate::common::max_threads::compute_num_threads;
use crate::ecc::curves::{Fr, G1Projective, G2Projective, ScalarRepr};
use crate::ecc::scalar_multiplication::{CpuMsm, MsmBackend};
use crate::errors::{ConfigurationError, Error, ProverError};
use crate::polynomials::Bn254EvaluationDomain;

#[cfg(test)]
mod test;

/// Knobs for a [`Prover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverConfig {
    /// size of the prover's worker pool
    pub num_threads: usize,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            num_threads: compute_num_threads(),
        }
    }
}

impl ProverConfig {
    /// Config with an explicit pool size.
    pub fn with_num_threads(num_threads: usize) -> Self {
        Self { num_threads }
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool, ConfigurationError> {
        if self.num_threads == 0 {
            return Err(ConfigurationError::ZeroThreads);
        }
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(|i| format!("rapidgroth-{i}"))
            .build()?)
    }
}

/// Results of the five msms, before blinding.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MsmOutputs {
    pub(crate) a: G1Projective,
    pub(crate) b1: G1Projective,
    pub(crate) b2: G2Projective,
    pub(crate) c: G1Projective,
    pub(crate) h: G1Projective,
}

/// Groth16 prover bound to one proving key.
///
/// Construction precomputes the fft roots and the row-stripe partition of the coefficients.
/// After that `prove` only reads shared state, so one prover can serve concurrent calls.
#[derive(Debug)]
pub struct Prover<B: MsmBackend = CpuMsm> {
    key: Arc<ProvingKey>,
    domain: Bn254EvaluationDomain,
    partition: CoefficientPartition,
    backend: B,
    pool: rayon::ThreadPool,
}

impl Prover<CpuMsm> {
    /// Prover on the host msm backend.
    pub fn new(key: Arc<ProvingKey>, config: ProverConfig) -> Result<Self, Error> {
        Self::with_backend(key, config, CpuMsm)
    }
}

impl<B: MsmBackend> Prover<B> {
    /// Prover that runs its msms on `backend`.
    pub fn with_backend(
        key: Arc<ProvingKey>,
        config: ProverConfig,
        backend: B,
    ) -> Result<Self, Error> {
        key.validate()?;
        let pool = config.build_pool()?;

        let start = Instant::now();
        let (domain, partition) = pool.install(|| {
            rayon::join(
                || Bn254EvaluationDomain::new(2 * key.domain_size),
                || CoefficientPartition::new(&key.coefficients, key.domain_size),
            )
        });
        let domain = domain?;
        info!(
            n_vars = key.n_vars,
            n_public = key.n_public,
            domain_size = key.domain_size,
            n_coefs = key.n_coefs(),
            stripes = partition.num_stripes(),
            num_threads = config.num_threads,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "prover ready"
        );

        Ok(Self {
            key,
            domain,
            partition,
            backend,
            pool,
        })
    }

    /// The proving key this prover is bound to.
    pub fn key(&self) -> &Arc<ProvingKey> {
        &self.key
    }

    /// Proves knowledge of `witness`, blinding with the operating system's randomness.
    pub fn prove(&self, witness: &[Fr]) -> Result<Proof, ProverError> {
        self.prove_with_rng(witness, &mut OsRng)
    }

    /// Proves knowledge of `witness`, blinding with randomness drawn from `rng`.
    ///
    /// The witness is not checked against the constraints. An unsatisfying witness yields a
    /// proof that does not verify.
    pub fn prove_with_rng<R: RngCore + CryptoRng>(
        &self,
        witness: &[Fr],
        rng: &mut R,
    ) -> Result<Proof, ProverError> {
        let key = &*self.key;
        if witness.len() != key.n_vars {
            return Err(ProverError::WitnessLength {
                expected: key.n_vars,
                actual: witness.len(),
            });
        }
        if !witness[0].is_one() {
            warn!("witness[0] is not one, the proof will not verify");
        }

        let span = info_span!("prove", n_vars = key.n_vars, domain_size = key.domain_size);
        let _enter = span.enter();
        let start = Instant::now();

        let outputs = self.pool.install(|| self.run_msms(witness))?;

        let r = sample_blinding_scalar(rng)?;
        let s = sample_blinding_scalar(rng)?;
        let proof = combine(key, &outputs, r, s);
        debug!("msm outputs blinded");

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "proof generated"
        );
        Ok(proof)
    }

    /// Quotient scalars: reduce, pointwise product, coset evaluation.
    fn compute_h_scalars(&self, witness: &[Fr]) -> Result<Vec<ScalarRepr>, ProverError> {
        let domain_size = self.key.domain_size;
        let (a, b) = self.partition.reduce(witness);
        let c = compute_c(&a, &b);
        debug!(domain_size, "witness reduced over the domain");
        trace!(a0 = %a[0], b0 = %b[0], c0 = %c[0], "first reduced entries");
        compute_quotient_scalars(&self.domain, a, b, c, domain_size)
    }

    /// The five msms of a proof as concurrent tasks. The H branch first computes its scalars.
    fn run_msms(&self, witness: &[Fr]) -> Result<MsmOutputs, ProverError> {
        let key = &*self.key;
        let backend = &self.backend;

        let scalars: Vec<ScalarRepr> = witness.par_iter().map(|w| w.into_bigint()).collect();
        let private_scalars = &scalars[key.n_public + 1..];

        let ((a, b1), (b2, (c, h))) = rayon::join(
            || {
                rayon::join(
                    || backend.msm_g1(&key.points_a, &scalars),
                    || backend.msm_g1(&key.points_b1, &scalars),
                )
            },
            || {
                rayon::join(
                    || backend.msm_g2(&key.points_b2, &scalars),
                    || {
                        rayon::join(
                            || backend.msm_g1(&key.points_c, private_scalars),
                            || {
                                let h_scalars = self.compute_h_scalars(witness)?;
                                backend.msm_g1(&key.points_h, &h_scalars)
                            },
                        )
                    },
                )
            },
        );
        debug!("msms done");

        Ok(MsmOutputs {
            a: a?,
            b1: b1?,
            b2: b2?,
            c: c?,
            h: h?,
        })
    }
}

/// Blinding scalar from 31 random bytes read little-endian, so always below 2^248.
pub(crate) fn sample_blinding_scalar<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
) -> Result<Fr, ProverError> {
    let mut bytes = [0u8; 32];
    rng.try_fill_bytes(&mut bytes[..31])?;
    Ok(Fr::from_le_bytes_mod_order(&bytes))
}

/// Blinds the msm results with `r` and `s`:
///
/// ```text
/// A  = A + α + r·δ
/// B  = B + β + s·δ        (in G2 and in G1)
/// C  = C + H + s·A + r·B1 - r·s·δ
/// ```
pub(crate) fn combine(key: &ProvingKey, m: &MsmOutputs, r: Fr, s: Fr) -> Proof {
    let delta1 = key.delta1.into_group();

    let a = m.a + key.alpha1 + delta1 * r;
    let b2 = m.b2 + key.beta2 + key.delta2.into_group() * s;
    let b1 = m.b1 + key.beta1 + delta1 * s;
    let c = m.c + m.h + a * s + b1 * r - delta1 * (r * s);

    Proof::new(a.into_affine(), b2.into_affine(), c.into_affine())
}
