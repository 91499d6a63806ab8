use std::collections::HashMap;
use std::io::{Cursor, Read};

use ark_ff::{BigInt, PrimeField, Zero};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use once_cell::sync::Lazy;

use crate::ecc::curves::{Fq, Fq2, Fr, G1Affine, G2Affine};
use crate::errors::LoadError;

/// Bytes per field element in both formats.
pub(crate) const FIELD_BYTES: usize = 32;
pub(crate) const G1_BYTES: usize = 2 * FIELD_BYTES;
pub(crate) const G2_BYTES: usize = 4 * FIELD_BYTES;

/// R⁻² for R = 2^256 mod r. Stored coefficients carry an extra R² factor.
///
/// The element whose Montgomery form is 1 has value R⁻¹.
pub(crate) static R_INV_SQUARED: Lazy<Fr> = Lazy::new(|| {
    let r_inv = Fr::new_unchecked(BigInt::from(1u64));
    r_inv * r_inv
});

/// A parsed section container. Section bodies borrow from the input buffer.
#[derive(Debug)]
pub(crate) struct BinFile<'a> {
    version: u32,
    sections: HashMap<u32, &'a [u8]>,
}

pub(crate) fn truncated(what: &'static str) -> impl FnOnce(std::io::Error) -> LoadError {
    move |_| LoadError::Truncated { what }
}

impl<'a> BinFile<'a> {
    /// Splits `data` into sections. Repeated ids keep their first occurrence.
    pub(crate) fn parse(data: &'a [u8], magic: &[u8; 4]) -> Result<Self, LoadError> {
        let mut cursor = Cursor::new(data);
        let mut found = [0u8; 4];
        cursor
            .read_exact(&mut found)
            .map_err(truncated("file magic"))?;
        if &found != magic {
            return Err(LoadError::BadMagic {
                expected: *magic,
                found,
            });
        }
        let version = cursor
            .read_u32::<LittleEndian>()
            .map_err(truncated("format version"))?;
        let n_sections = cursor
            .read_u32::<LittleEndian>()
            .map_err(truncated("section count"))?;

        let mut sections = HashMap::new();
        for _ in 0..n_sections {
            let id = cursor
                .read_u32::<LittleEndian>()
                .map_err(truncated("section id"))?;
            let size = cursor
                .read_u64::<LittleEndian>()
                .map_err(truncated("section length"))?;
            let body = take(&mut cursor, size, "section body")?;
            sections.entry(id).or_insert(body);
        }

        Ok(Self { version, sections })
    }

    pub(crate) fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn section(&self, id: u32) -> Result<&'a [u8], LoadError> {
        self.sections
            .get(&id)
            .copied()
            .ok_or(LoadError::MissingSection(id))
    }

    /// Section `id`, which must be exactly `expected` bytes long.
    pub(crate) fn section_sized(&self, id: u32, expected: usize) -> Result<&'a [u8], LoadError> {
        let body = self.section(id)?;
        if body.len() != expected {
            return Err(LoadError::SectionSize {
                section: id,
                expected: expected as u64,
                actual: body.len() as u64,
            });
        }
        Ok(body)
    }
}

/// The next `len` bytes of the cursor's buffer, borrowed.
pub(crate) fn take<'a>(
    cursor: &mut Cursor<&'a [u8]>,
    len: u64,
    what: &'static str,
) -> Result<&'a [u8], LoadError> {
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| start.checked_add(len))
        .filter(|end| *end <= data.len())
        .ok_or(LoadError::Truncated { what })?;
    cursor.set_position(end as u64);
    Ok(&data[start..end])
}

pub(crate) fn read_limbs(bytes: &[u8]) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    LittleEndian::read_u64_into(&bytes[..FIELD_BYTES], &mut limbs);
    limbs
}

/// Fails unless `bytes` is the little-endian modulus of `F`.
pub(crate) fn check_modulus<F: PrimeField<BigInt = BigInt<4>>>(
    bytes: &[u8],
    what: &'static str,
) -> Result<(), LoadError> {
    if bytes.len() != FIELD_BYTES || read_limbs(bytes) != F::MODULUS.0 {
        return Err(LoadError::CurveMismatch { what });
    }
    Ok(())
}

/// Field element stored canonically.
pub(crate) fn fr_from_canonical(bytes: &[u8], what: &'static str) -> Result<Fr, LoadError> {
    Fr::from_bigint(BigInt::new(read_limbs(bytes))).ok_or(LoadError::NonCanonical { what })
}

/// Base field element stored in Montgomery form.
pub(crate) fn fq_from_montgomery(bytes: &[u8], what: &'static str) -> Result<Fq, LoadError> {
    let repr = BigInt::new(read_limbs(bytes));
    if repr >= Fq::MODULUS {
        return Err(LoadError::NonCanonical { what });
    }
    Ok(Fq::new_unchecked(repr))
}

/// G1 point as two Montgomery coordinates, all zero for infinity.
pub(crate) fn g1_from_montgomery(bytes: &[u8], what: &'static str) -> Result<G1Affine, LoadError> {
    let x = fq_from_montgomery(&bytes[..FIELD_BYTES], what)?;
    let y = fq_from_montgomery(&bytes[FIELD_BYTES..G1_BYTES], what)?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(LoadError::NotOnCurve { what });
    }
    Ok(p)
}

/// G2 point as `x.c0, x.c1, y.c0, y.c1` in Montgomery form, all zero for infinity.
///
/// Only the curve equation is checked, not the subgroup.
pub(crate) fn g2_from_montgomery(bytes: &[u8], what: &'static str) -> Result<G2Affine, LoadError> {
    let mut coordinates = [Fq::zero(); 4];
    for (i, c) in coordinates.iter_mut().enumerate() {
        *c = fq_from_montgomery(&bytes[i * FIELD_BYTES..(i + 1) * FIELD_BYTES], what)?;
    }
    let [x0, x1, y0, y1] = coordinates;
    let x = Fq2::new(x0, x1);
    let y = Fq2::new(y0, y1);
    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(LoadError::NotOnCurve { what });
    }
    Ok(p)
}
