use std::fmt;
use std::str::FromStr;

use ark_ec::AffineRepr;
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::ecc::curves::{Fq, Fq2, Fr, G1Affine, G2Affine};
use crate::errors::LoadError;

/// A Groth16 proof: `π_A ∈ G1`, `π_B ∈ G2`, `π_C ∈ G1`.
///
/// Serializes to the snarkjs json layout and to arkworks' compressed binary encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(try_from = "ProofJson", into = "ProofJson")]
pub struct Proof {
    #[allow(missing_docs)]
    pub a: G1Affine,
    #[allow(missing_docs)]
    pub b: G2Affine,
    #[allow(missing_docs)]
    pub c: G1Affine,
}

/// The json shape: projective coordinates with `z = 1`, base field elements in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ProofJson {
    pi_a: [String; 3],
    pi_b: [[String; 2]; 3],
    pi_c: [String; 3],
    protocol: String,
}

const PROTOCOL: &str = "groth16";

/// Decimal rendering of a field element, `"0"` for zero.
pub(crate) fn to_decimal<F: PrimeField>(x: &F) -> String {
    let n: BigUint = (*x).into();
    n.to_string()
}

pub(crate) fn from_decimal<F: PrimeField>(s: &str, what: &'static str) -> Result<F, LoadError> {
    let n = BigUint::from_str(s)
        .map_err(|_| LoadError::Malformed(format!("{what}: {s:?} is not a decimal integer")))?;
    let modulus: BigUint = F::MODULUS.into();
    if n >= modulus {
        return Err(LoadError::NonCanonical { what });
    }
    Ok(F::from(n))
}

/// Affine coordinates of a G1 point, `(0, 0)` for the point at infinity.
fn g1_coordinates(p: &G1Affine) -> (Fq, Fq) {
    if p.is_zero() {
        (Fq::zero(), Fq::zero())
    } else {
        (p.x, p.y)
    }
}

fn g2_coordinates(p: &G2Affine) -> (Fq2, Fq2) {
    if p.is_zero() {
        (Fq2::zero(), Fq2::zero())
    } else {
        (p.x, p.y)
    }
}

fn g1_json(p: &G1Affine) -> [String; 3] {
    let (x, y) = g1_coordinates(p);
    [to_decimal(&x), to_decimal(&y), "1".to_string()]
}

fn fq2_json(f: &Fq2) -> [String; 2] {
    [to_decimal(&f.c0), to_decimal(&f.c1)]
}

fn g2_json(p: &G2Affine) -> [[String; 2]; 3] {
    let (x, y) = g2_coordinates(p);
    [fq2_json(&x), fq2_json(&y), ["1".to_string(), "0".to_string()]]
}

fn g1_from_json(p: &[String; 3], what: &'static str) -> Result<G1Affine, LoadError> {
    if p[2] != "1" {
        return Err(LoadError::Malformed(format!("{what}: z must be 1")));
    }
    let x: Fq = from_decimal(&p[0], what)?;
    let y: Fq = from_decimal(&p[1], what)?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }
    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(LoadError::NotOnCurve { what });
    }
    Ok(point)
}

fn fq2_from_json(f: &[String; 2], what: &'static str) -> Result<Fq2, LoadError> {
    Ok(Fq2::new(from_decimal(&f[0], what)?, from_decimal(&f[1], what)?))
}

fn g2_from_json(p: &[[String; 2]; 3], what: &'static str) -> Result<G2Affine, LoadError> {
    if p[2][0] != "1" || p[2][1] != "0" {
        return Err(LoadError::Malformed(format!("{what}: z must be 1")));
    }
    let x = fq2_from_json(&p[0], what)?;
    let y = fq2_from_json(&p[1], what)?;
    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }
    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(LoadError::NotOnCurve { what });
    }
    Ok(point)
}

impl From<Proof> for ProofJson {
    fn from(proof: Proof) -> Self {
        Self {
            pi_a: g1_json(&proof.a),
            pi_b: g2_json(&proof.b),
            pi_c: g1_json(&proof.c),
            protocol: PROTOCOL.to_string(),
        }
    }
}

impl TryFrom<ProofJson> for Proof {
    type Error = LoadError;

    fn try_from(json: ProofJson) -> Result<Self, Self::Error> {
        if json.protocol != PROTOCOL {
            return Err(LoadError::Malformed(format!(
                "unsupported protocol {:?}",
                json.protocol
            )));
        }
        Ok(Self {
            a: g1_from_json(&json.pi_a, "pi_a")?,
            b: g2_from_json(&json.pi_b, "pi_b")?,
            c: g1_from_json(&json.pi_c, "pi_c")?,
        })
    }
}

impl Proof {
    /// Wraps three affine points.
    pub fn new(a: G1Affine, b: G2Affine, c: G1Affine) -> Self {
        Self { a, b, c }
    }

    /// Compact snarkjs json, keys in the order `pi_a`, `pi_b`, `pi_c`, `protocol`.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses snarkjs proof json. Points are checked to be on the curve.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Public signals as a json array of decimal strings, `["1","35"]`.
pub fn public_signals_json(public_inputs: &[Fr]) -> serde_json::Result<String> {
    let signals: Vec<String> = public_inputs.iter().map(to_decimal).collect();
    serde_json::to_string(&signals)
}
