//! Deterministic helpers for tests and benches: toy circuits with a trusted setup,
//! a pairing check, fixed randomness and writers for the zkey and wtns formats.

use std::io::{self, Write};

use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, Group};
use ark_ff::{FftField, Field, One, PrimeField, UniformRand, Zero};
use byteorder::{LittleEndian, WriteBytesExt};
use proptest::prelude::*;
use rand::{CryptoRng, Rng, RngCore};

use crate::ecc::curves::{Bn254, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use crate::groth16::{Coefficient, Matrix, Proof, ProvingKey};
use crate::loader::{wtns, zkey};

/// Rng that emits `seed, seed + step, seed + 2·step, ...` as bytes.
#[derive(Debug, Clone)]
pub struct FixedRng {
    next: u8,
    step: u8,
}

impl FixedRng {
    /// Counting bytes from `seed`.
    pub fn new(seed: u8) -> Self {
        Self { next: seed, step: 1 }
    }

    /// Only zero bytes, so both blinding scalars are zero.
    pub fn zeros() -> Self {
        Self { next: 0, step: 0 }
    }
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for b in dest.iter_mut() {
            *b = self.next;
            self.next = self.next.wrapping_add(self.step);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for FixedRng {}

/// Rng whose fallible interface always fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}

impl CryptoRng for FailingRng {}

/// One rank-1 constraint `<a, w> · <b, w> = <c, w>` as sparse (variable, coefficient) lists.
#[derive(Debug, Clone, Default)]
pub struct Constraint {
    #[allow(missing_docs)]
    pub a: Vec<(usize, Fr)>,
    #[allow(missing_docs)]
    pub b: Vec<(usize, Fr)>,
    #[allow(missing_docs)]
    pub c: Vec<(usize, Fr)>,
}

impl Constraint {
    fn new(a: &[(usize, u64)], b: &[(usize, u64)], c: &[(usize, u64)]) -> Self {
        let lift = |terms: &[(usize, u64)]| terms.iter().map(|(i, v)| (*i, Fr::from(*v))).collect();
        Self {
            a: lift(a),
            b: lift(b),
            c: lift(c),
        }
    }
}

fn dot(terms: &[(usize, Fr)], witness: &[Fr]) -> Fr {
    terms.iter().map(|(i, v)| witness[*i] * v).sum()
}

/// A small R1CS together with a satisfying witness.
///
/// Variable 0 is the constant one, variables `1..=n_public` are the public inputs.
#[derive(Debug, Clone)]
pub struct ToyCircuit {
    n_public: usize,
    constraints: Vec<Constraint>,
    witness: Vec<Fr>,
}

/// Verifier half of a toy setup.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyingKey {
    #[allow(missing_docs)]
    pub alpha1: G1Affine,
    #[allow(missing_docs)]
    pub beta2: G2Affine,
    #[allow(missing_docs)]
    pub gamma2: G2Affine,
    #[allow(missing_docs)]
    pub delta2: G2Affine,
    #[allow(missing_docs)]
    pub ic: Vec<G1Affine>,
}

/// Output of [`ToyCircuit::setup`].
#[derive(Debug, Clone)]
pub struct ToySetup {
    #[allow(missing_docs)]
    pub key: ProvingKey,
    #[allow(missing_docs)]
    pub vk: VerifyingKey,
}

impl ToyCircuit {
    /// `x³ + x + 5 = out` with `x = 3`, `out = 35` public.
    pub fn cubic() -> Self {
        let x = 3u64;
        let witness = [1, x * x * x + x + 5, x, x * x, x * x * x].map(Fr::from);
        Self {
            n_public: 1,
            constraints: vec![
                Constraint::new(&[(2, 1)], &[(2, 1)], &[(3, 1)]),
                Constraint::new(&[(3, 1)], &[(2, 1)], &[(4, 1)]),
                Constraint::new(&[(4, 1), (2, 1), (0, 5)], &[(0, 1)], &[(1, 1)]),
            ],
            witness: witness.to_vec(),
        }
    }

    /// `out = x^(length + 1)` through `length` multiplications, `out` public.
    pub fn multiplication_chain(length: usize, x: Fr) -> Self {
        assert!(length >= 1, "a chain needs at least one multiplication");
        // [1, out, x, x^2, ..., x^(length + 1)]
        let mut powers = vec![x];
        for _ in 0..length {
            let last = powers[powers.len() - 1];
            powers.push(last * x);
        }
        let out = powers[length];
        let mut witness = vec![Fr::one(), out];
        witness.extend(powers);

        let one = Fr::one();
        let mut constraints: Vec<Constraint> = (0..length)
            .map(|i| Constraint {
                a: vec![(2 + i, one)],
                b: vec![(2, one)],
                c: vec![(3 + i, one)],
            })
            .collect();
        constraints.push(Constraint {
            a: vec![(2 + length, one)],
            b: vec![(0, one)],
            c: vec![(1, one)],
        });

        Self {
            n_public: 1,
            constraints,
            witness,
        }
    }

    /// `a · b = out` with every variable public, so there is nothing private to commit to.
    pub fn all_public(a: Fr, b: Fr) -> Self {
        let one = Fr::one();
        Self {
            n_public: 3,
            constraints: vec![Constraint {
                a: vec![(2, one)],
                b: vec![(3, one)],
                c: vec![(1, one)],
            }],
            witness: vec![one, a * b, a, b],
        }
    }

    /// `x · x = y` with both variables private, so there are no public inputs.
    pub fn private_square(x: Fr) -> Self {
        let one = Fr::one();
        Self {
            n_public: 0,
            constraints: vec![Constraint {
                a: vec![(1, one)],
                b: vec![(1, one)],
                c: vec![(2, one)],
            }],
            witness: vec![one, x, x * x],
        }
    }

    /// The full satisfying witness.
    pub fn witness(&self) -> &[Fr] {
        &self.witness
    }

    /// `witness[1..=n_public]`.
    pub fn public_inputs(&self) -> &[Fr] {
        &self.witness[1..=self.n_public]
    }

    #[allow(missing_docs)]
    pub fn n_public(&self) -> usize {
        self.n_public
    }

    /// Whether `witness` satisfies every constraint.
    pub fn is_satisfied_by(&self, witness: &[Fr]) -> bool {
        self.constraints
            .iter()
            .all(|c| dot(&c.a, witness) * dot(&c.b, witness) == dot(&c.c, witness))
    }

    /// Constraint rows followed by one `w_i · 0 = 0` row per public input and the constant,
    /// which keeps the public input polynomials independent.
    fn rows(&self) -> Vec<Constraint> {
        let mut rows = self.constraints.clone();
        rows.extend((0..=self.n_public).map(|i| Constraint {
            a: vec![(i, Fr::one())],
            ..Default::default()
        }));
        rows
    }

    /// Trusted setup with toxic waste drawn from `rng`.
    pub fn setup<R: Rng + ?Sized>(&self, rng: &mut R) -> ToySetup {
        let rows = self.rows();
        let n_vars = self.witness.len();
        let n_public = self.n_public;
        let domain_size = rows.len().next_power_of_two();

        let tau = Fr::rand(rng);
        let alpha = Fr::rand(rng);
        let beta = Fr::rand(rng);
        let gamma = Fr::rand(rng);
        let delta = Fr::rand(rng);
        let gamma_inv = gamma.inverse().expect("gamma is non-zero");
        let delta_inv = delta.inverse().expect("delta is non-zero");

        let lagrange = lagrange_at(domain_size, 0..domain_size, &tau);
        let mut u = vec![Fr::zero(); n_vars];
        let mut v = vec![Fr::zero(); n_vars];
        let mut w = vec![Fr::zero(); n_vars];
        let mut coefficients = Vec::new();
        for (row, constraint) in rows.iter().enumerate() {
            for (k, value) in &constraint.a {
                u[*k] += lagrange[row] * value;
                coefficients.push(Coefficient {
                    matrix: Matrix::A,
                    row: row as u32,
                    col: *k as u32,
                    value: *value,
                });
            }
            for (k, value) in &constraint.b {
                v[*k] += lagrange[row] * value;
                coefficients.push(Coefficient {
                    matrix: Matrix::B,
                    row: row as u32,
                    col: *k as u32,
                    value: *value,
                });
            }
            for (k, value) in &constraint.c {
                w[*k] += lagrange[row] * value;
            }
        }

        let t: Vec<Fr> = (0..n_vars).map(|k| beta * u[k] + alpha * v[k] + w[k]).collect();
        let ic_scalars: Vec<Fr> = t[..=n_public].iter().map(|x| *x * gamma_inv).collect();
        let c_scalars: Vec<Fr> = t[n_public + 1..].iter().map(|x| *x * delta_inv).collect();

        // H bases are the size-2n Lagrange polynomials at the odd points, over δ
        let odd = (0..domain_size).map(|i| 2 * i + 1);
        let h_scalars: Vec<Fr> = lagrange_at(2 * domain_size, odd, &tau)
            .into_iter()
            .map(|l| l * delta_inv)
            .collect();

        let key = ProvingKey {
            n_vars,
            n_public,
            domain_size,
            alpha1: g1(&[alpha])[0],
            beta1: g1(&[beta])[0],
            beta2: g2(&[beta])[0],
            gamma2: g2(&[gamma])[0],
            delta1: g1(&[delta])[0],
            delta2: g2(&[delta])[0],
            ic: g1(&ic_scalars),
            coefficients,
            points_a: g1(&u),
            points_b1: g1(&v),
            points_b2: g2(&v),
            points_c: g1(&c_scalars),
            points_h: g1(&h_scalars),
        };
        let vk = VerifyingKey {
            alpha1: key.alpha1,
            beta2: key.beta2,
            gamma2: key.gamma2,
            delta2: key.delta2,
            ic: key.ic.clone(),
        };
        ToySetup { key, vk }
    }
}

/// `L_m(τ) = ω^m (τ^N - 1) / (N (τ - ω^m))` over the size-`size` subgroup, for each `m`.
fn lagrange_at(size: usize, indices: impl Iterator<Item = usize>, tau: &Fr) -> Vec<Fr> {
    let omega = Fr::get_root_of_unity(size as u64).expect("size is a supported power of two");
    let z = tau.pow([size as u64]) - Fr::one();
    let n_inv = Fr::from(size as u64).inverse().expect("size is non-zero");
    indices
        .map(|m| {
            let y = omega.pow([m as u64]);
            y * z * n_inv * (*tau - y).inverse().expect("tau is outside the domain")
        })
        .collect()
}

fn g1(scalars: &[Fr]) -> Vec<G1Affine> {
    let g = G1Projective::generator();
    let points: Vec<G1Projective> = scalars.iter().map(|s| g * s).collect();
    G1Projective::normalize_batch(&points)
}

fn g2(scalars: &[Fr]) -> Vec<G2Affine> {
    let g = G2Projective::generator();
    let points: Vec<G2Projective> = scalars.iter().map(|s| g * s).collect();
    G2Projective::normalize_batch(&points)
}

/// Groth16 pairing check `e(A, B) = e(α, β)·e(Σ x_i·IC_i, γ)·e(C, δ)`.
pub fn verify(vk: &VerifyingKey, public_inputs: &[Fr], proof: &Proof) -> bool {
    if public_inputs.len() + 1 != vk.ic.len() {
        return false;
    }
    let acc = public_inputs
        .iter()
        .zip(&vk.ic[1..])
        .fold(vk.ic[0].into_group(), |acc, (x, base)| acc + *base * x);

    let lhs = Bn254::pairing(proof.a, proof.b);
    let rhs = Bn254::pairing(vk.alpha1, vk.beta2)
        + Bn254::pairing(acc.into_affine(), vk.gamma2)
        + Bn254::pairing(proof.c, vk.delta2);
    lhs == rhs
}

fn write_section(out: &mut Vec<u8>, id: u32, body: &[u8]) -> io::Result<()> {
    out.write_u32::<LittleEndian>(id)?;
    out.write_u64::<LittleEndian>(body.len() as u64)?;
    out.write_all(body)
}

fn write_limbs(out: &mut Vec<u8>, limbs: &[u64; 4]) -> io::Result<()> {
    for limb in limbs {
        out.write_u64::<LittleEndian>(*limb)?;
    }
    Ok(())
}

/// G1 point as two Montgomery coordinates, zeros for infinity.
fn write_g1(out: &mut Vec<u8>, p: &G1Affine) -> io::Result<()> {
    if p.is_zero() {
        return out.write_all(&[0u8; 64]);
    }
    write_limbs(out, &p.x.0 .0)?;
    write_limbs(out, &p.y.0 .0)
}

fn write_g2(out: &mut Vec<u8>, p: &G2Affine) -> io::Result<()> {
    if p.is_zero() {
        return out.write_all(&[0u8; 128]);
    }
    for f in [p.x.c0, p.x.c1, p.y.c0, p.y.c1] {
        write_limbs(out, &f.0 .0)?;
    }
    Ok(())
}

fn write_modulus<F: PrimeField<BigInt = ark_ff::BigInt<4>>>(out: &mut Vec<u8>) -> io::Result<()> {
    out.write_u32::<LittleEndian>(32)?;
    write_limbs(out, &F::MODULUS.0)
}

/// Encodes `key` in the snarkjs zkey layout.
pub fn write_zkey(key: &ProvingKey) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_all(zkey::ZKEY_MAGIC)?;
    out.write_u32::<LittleEndian>(1)?;
    out.write_u32::<LittleEndian>(9)?;

    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(zkey::GROTH16_KEY_TYPE)?;
    write_section(&mut out, zkey::SECTION_HEADER, &body)?;

    let mut body = Vec::new();
    write_modulus::<ark_bn254::Fq>(&mut body)?;
    write_modulus::<Fr>(&mut body)?;
    body.write_u32::<LittleEndian>(key.n_vars as u32)?;
    body.write_u32::<LittleEndian>(key.n_public as u32)?;
    body.write_u32::<LittleEndian>(key.domain_size as u32)?;
    write_g1(&mut body, &key.alpha1)?;
    write_g1(&mut body, &key.beta1)?;
    write_g2(&mut body, &key.beta2)?;
    write_g2(&mut body, &key.gamma2)?;
    write_g1(&mut body, &key.delta1)?;
    write_g2(&mut body, &key.delta2)?;
    write_section(&mut out, zkey::SECTION_GROTH16_HEADER, &body)?;

    let mut body = Vec::new();
    for p in &key.ic {
        write_g1(&mut body, p)?;
    }
    write_section(&mut out, zkey::SECTION_IC, &body)?;

    // coefficients are stored multiplied by R^2, R = 2^256 mod r
    let r = Fr::from(2u64).pow([256u64]);
    let r2 = r * r;
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(key.coefficients.len() as u32)?;
    for c in &key.coefficients {
        body.write_u32::<LittleEndian>(match c.matrix {
            Matrix::A => 0,
            Matrix::B => 1,
        })?;
        body.write_u32::<LittleEndian>(c.row)?;
        body.write_u32::<LittleEndian>(c.col)?;
        write_limbs(&mut body, &(c.value * r2).into_bigint().0)?;
    }
    write_section(&mut out, zkey::SECTION_COEFFICIENTS, &body)?;

    let write_g1_section = |out: &mut Vec<u8>, id: u32, points: &[G1Affine]| -> io::Result<()> {
        let mut body = Vec::new();
        for p in points {
            write_g1(&mut body, p)?;
        }
        write_section(out, id, &body)
    };
    write_g1_section(&mut out, zkey::SECTION_POINTS_A, &key.points_a)?;
    write_g1_section(&mut out, zkey::SECTION_POINTS_B1, &key.points_b1)?;
    let mut body = Vec::new();
    for p in &key.points_b2 {
        write_g2(&mut body, p)?;
    }
    write_section(&mut out, zkey::SECTION_POINTS_B2, &body)?;
    write_g1_section(&mut out, zkey::SECTION_POINTS_C, &key.points_c)?;
    write_g1_section(&mut out, zkey::SECTION_POINTS_H, &key.points_h)?;

    Ok(out)
}

/// Encodes `witness` in the circom wtns layout.
pub fn write_wtns(witness: &[Fr]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_all(wtns::WTNS_MAGIC)?;
    out.write_u32::<LittleEndian>(2)?;
    out.write_u32::<LittleEndian>(2)?;

    let mut body = Vec::new();
    write_modulus::<Fr>(&mut body)?;
    body.write_u32::<LittleEndian>(witness.len() as u32)?;
    write_section(&mut out, wtns::SECTION_HEADER, &body)?;

    let mut body = Vec::new();
    for w in witness {
        write_limbs(&mut body, &w.into_bigint().0)?;
    }
    write_section(&mut out, wtns::SECTION_VALUES, &body)?;
    Ok(out)
}

/// Arbitrary scalar field elements.
pub fn arb_fr() -> impl Strategy<Value = Fr> {
    any::<[u8; 32]>().prop_map(|bytes| Fr::from_le_bytes_mod_order(&bytes))
}
