use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use rayon::prelude::*;
use tracing::{debug, info};

use super::binfile::{
    check_modulus, fr_from_canonical, g1_from_montgomery, g2_from_montgomery, take, truncated,
    BinFile, FIELD_BYTES, G1_BYTES, G2_BYTES, R_INV_SQUARED,
};
use crate::ecc::curves::{Fq, Fr, G1Affine, G2Affine};
use crate::errors::LoadError;
use crate::groth16::{Coefficient, Matrix, ProvingKey};

#[allow(missing_docs)]
pub const ZKEY_MAGIC: &[u8; 4] = b"zkey";
/// Key type stored in the first section for groth16 keys.
pub const GROTH16_KEY_TYPE: u32 = 1;

#[allow(missing_docs)]
pub const SECTION_HEADER: u32 = 1;
#[allow(missing_docs)]
pub const SECTION_GROTH16_HEADER: u32 = 2;
#[allow(missing_docs)]
pub const SECTION_IC: u32 = 3;
#[allow(missing_docs)]
pub const SECTION_COEFFICIENTS: u32 = 4;
#[allow(missing_docs)]
pub const SECTION_POINTS_A: u32 = 5;
#[allow(missing_docs)]
pub const SECTION_POINTS_B1: u32 = 6;
#[allow(missing_docs)]
pub const SECTION_POINTS_B2: u32 = 7;
#[allow(missing_docs)]
pub const SECTION_POINTS_C: u32 = 8;
#[allow(missing_docs)]
pub const SECTION_POINTS_H: u32 = 9;

/// m, row, col, value
const COEFFICIENT_BYTES: usize = 3 * 4 + FIELD_BYTES;

/// Sizes and setup elements from the groth16 header section.
#[derive(Debug, Clone, PartialEq)]
pub struct ZkeyHeader {
    #[allow(missing_docs)]
    pub n_vars: usize,
    #[allow(missing_docs)]
    pub n_public: usize,
    #[allow(missing_docs)]
    pub domain_size: usize,
    #[allow(missing_docs)]
    pub alpha1: G1Affine,
    #[allow(missing_docs)]
    pub beta1: G1Affine,
    #[allow(missing_docs)]
    pub beta2: G2Affine,
    #[allow(missing_docs)]
    pub gamma2: G2Affine,
    #[allow(missing_docs)]
    pub delta1: G1Affine,
    #[allow(missing_docs)]
    pub delta2: G2Affine,
}

fn read_u32(cursor: &mut Cursor<&[u8]>, what: &'static str) -> Result<u32, LoadError> {
    cursor.read_u32::<LittleEndian>().map_err(truncated(what))
}

fn parse_header(file: &BinFile<'_>) -> Result<ZkeyHeader, LoadError> {
    let mut cursor = Cursor::new(file.section(SECTION_HEADER)?);
    let key_type = read_u32(&mut cursor, "key type")?;
    if key_type != GROTH16_KEY_TYPE {
        return Err(LoadError::UnsupportedKeyType(key_type));
    }

    let mut cursor = Cursor::new(file.section(SECTION_GROTH16_HEADER)?);
    let n8q = read_u32(&mut cursor, "base field size")? as u64;
    check_modulus::<Fq>(take(&mut cursor, n8q, "base field modulus")?, "base field modulus")?;
    let n8r = read_u32(&mut cursor, "scalar field size")? as u64;
    check_modulus::<Fr>(take(&mut cursor, n8r, "scalar field modulus")?, "scalar field modulus")?;

    let n_vars = read_u32(&mut cursor, "variable count")? as usize;
    let n_public = read_u32(&mut cursor, "public input count")? as usize;
    let domain_size = read_u32(&mut cursor, "domain size")? as usize;

    let mut g1 = |what| -> Result<G1Affine, LoadError> {
        g1_from_montgomery(take(&mut cursor, G1_BYTES as u64, what)?, what)
    };
    let alpha1 = g1("alpha1")?;
    let beta1 = g1("beta1")?;
    let mut g2 = |what| -> Result<G2Affine, LoadError> {
        g2_from_montgomery(take(&mut cursor, G2_BYTES as u64, what)?, what)
    };
    let beta2 = g2("beta2")?;
    let gamma2 = g2("gamma2")?;
    let delta1 = g1_from_montgomery(take(&mut cursor, G1_BYTES as u64, "delta1")?, "delta1")?;
    let delta2 = g2_from_montgomery(take(&mut cursor, G2_BYTES as u64, "delta2")?, "delta2")?;

    if n_vars < n_public + 1 {
        return Err(LoadError::Malformed(format!(
            "{n_vars} variables cannot hold the constant and {n_public} public inputs"
        )));
    }
    if !domain_size.is_power_of_two() {
        return Err(LoadError::Malformed(format!(
            "domain size {domain_size} is not a power of two"
        )));
    }

    Ok(ZkeyHeader {
        n_vars,
        n_public,
        domain_size,
        alpha1,
        beta1,
        beta2,
        gamma2,
        delta1,
        delta2,
    })
}

/// Reads only the header sections, enough to size output buffers.
pub fn read_header(data: &[u8]) -> Result<ZkeyHeader, LoadError> {
    parse_header(&BinFile::parse(data, ZKEY_MAGIC)?)
}

fn g1_section(
    file: &BinFile<'_>,
    id: u32,
    count: usize,
    what: &'static str,
) -> Result<Vec<G1Affine>, LoadError> {
    file.section_sized(id, count * G1_BYTES)?
        .par_chunks_exact(G1_BYTES)
        .map(|bytes| g1_from_montgomery(bytes, what))
        .collect()
}

fn g2_section(
    file: &BinFile<'_>,
    id: u32,
    count: usize,
    what: &'static str,
) -> Result<Vec<G2Affine>, LoadError> {
    file.section_sized(id, count * G2_BYTES)?
        .par_chunks_exact(G2_BYTES)
        .map(|bytes| g2_from_montgomery(bytes, what))
        .collect()
}

fn parse_coefficient(bytes: &[u8]) -> Result<Coefficient, LoadError> {
    let mut cursor = Cursor::new(bytes);
    let matrix = match read_u32(&mut cursor, "coefficient matrix")? {
        0 => Matrix::A,
        1 => Matrix::B,
        m => {
            return Err(LoadError::Malformed(format!(
                "coefficient matrix {m} is neither A (0) nor B (1)"
            )))
        }
    };
    let row = read_u32(&mut cursor, "coefficient row")?;
    let col = read_u32(&mut cursor, "coefficient column")?;
    let value = fr_from_canonical(&bytes[12..], "coefficient value")? * *R_INV_SQUARED;
    Ok(Coefficient {
        matrix,
        row,
        col,
        value,
    })
}

fn coefficients_section(file: &BinFile<'_>) -> Result<Vec<Coefficient>, LoadError> {
    let body = file.section(SECTION_COEFFICIENTS)?;
    let n_coefs = read_u32(&mut Cursor::new(body), "coefficient count")? as usize;
    let body = file.section_sized(SECTION_COEFFICIENTS, 4 + n_coefs * COEFFICIENT_BYTES)?;
    body[4..]
        .par_chunks_exact(COEFFICIENT_BYTES)
        .map(parse_coefficient)
        .collect()
}

/// Reads a groth16 proving key in the snarkjs zkey layout.
///
/// Every point is checked to be on its curve. Coefficient indices are checked later by
/// [`ProvingKey::validate`].
pub fn read_zkey(data: &[u8]) -> Result<ProvingKey, LoadError> {
    let file = BinFile::parse(data, ZKEY_MAGIC)?;
    let header = parse_header(&file)?;
    debug!(version = file.version(), "zkey header read");

    let n_vars = header.n_vars;
    let n_private = n_vars - header.n_public - 1;

    let ic = g1_section(&file, SECTION_IC, header.n_public + 1, "ic")?;
    let coefficients = coefficients_section(&file)?;
    let points_a = g1_section(&file, SECTION_POINTS_A, n_vars, "A")?;
    let points_b1 = g1_section(&file, SECTION_POINTS_B1, n_vars, "B1")?;
    let points_b2 = g2_section(&file, SECTION_POINTS_B2, n_vars, "B2")?;
    let points_c = g1_section(&file, SECTION_POINTS_C, n_private, "C")?;
    let points_h = g1_section(&file, SECTION_POINTS_H, header.domain_size, "H")?;

    info!(
        n_vars,
        n_public = header.n_public,
        domain_size = header.domain_size,
        n_coefs = coefficients.len(),
        "proving key loaded"
    );

    Ok(ProvingKey {
        n_vars,
        n_public: header.n_public,
        domain_size: header.domain_size,
        alpha1: header.alpha1,
        beta1: header.beta1,
        beta2: header.beta2,
        gamma2: header.gamma2,
        delta1: header.delta1,
        delta2: header.delta2,
        ic,
        coefficients,
        points_a,
        points_b1,
        points_b2,
        points_c,
        points_h,
    })
}
