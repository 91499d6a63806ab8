use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};
use rayon::prelude::*;
use tracing::debug;

use super::binfile::{check_modulus, fr_from_canonical, take, truncated, BinFile, FIELD_BYTES};
use crate::ecc::curves::Fr;
use crate::errors::LoadError;

#[allow(missing_docs)]
pub const WTNS_MAGIC: &[u8; 4] = b"wtns";
/// `n8, prime, n_witness`
pub const SECTION_HEADER: u32 = 1;
/// `n_witness` canonical values
pub const SECTION_VALUES: u32 = 2;

/// Reads a circom witness. Entry 0 is the constant wire.
pub fn read_wtns(data: &[u8]) -> Result<Vec<Fr>, LoadError> {
    let file = BinFile::parse(data, WTNS_MAGIC)?;

    let mut cursor = Cursor::new(file.section(SECTION_HEADER)?);
    let n8 = cursor
        .read_u32::<LittleEndian>()
        .map_err(truncated("witness field size"))?;
    check_modulus::<Fr>(
        take(&mut cursor, u64::from(n8), "witness prime")?,
        "witness prime",
    )?;
    let n_witness = cursor
        .read_u32::<LittleEndian>()
        .map_err(truncated("witness count"))? as usize;

    let witness = file
        .section_sized(SECTION_VALUES, n_witness * FIELD_BYTES)?
        .par_chunks_exact(FIELD_BYTES)
        .map(|bytes| fr_from_canonical(bytes, "witness value"))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(version = file.version(), n_witness, "witness loaded");
    Ok(witness)
}
