use ark_ff::{Field, One};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use proptest::prelude::*;

use super::binfile::R_INV_SQUARED;
use super::{read_header, read_wtns, read_zkey, wtns, zkey};
use crate::ecc::curves::Fr;
use crate::errors::LoadError;
use crate::groth16::ProvingKey;
use crate::test_utils::{arb_fr, write_wtns, write_zkey, ToyCircuit};

/// offset of the key type inside a zkey written by `write_zkey`
const KEY_TYPE_OFFSET: usize = 24;
/// offset of the first byte of `q` in the groth16 header
const BASE_MODULUS_OFFSET: usize = 44;
/// offset of alpha1's x coordinate
const ALPHA1_OFFSET: usize = 124;

fn toy_key() -> ProvingKey {
    ToyCircuit::cubic().setup(&mut ark_std::test_rng()).key
}

fn zkey_bytes() -> Vec<u8> {
    write_zkey(&toy_key()).unwrap()
}

/// Splits a container into its sections.
fn split(data: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let n_sections = LittleEndian::read_u32(&data[8..12]);
    let mut pos = 12;
    let mut sections = Vec::new();
    for _ in 0..n_sections {
        let id = LittleEndian::read_u32(&data[pos..]);
        let len = LittleEndian::read_u64(&data[pos + 4..]) as usize;
        pos += 12;
        sections.push((id, data[pos..pos + len].to_vec()));
        pos += len;
    }
    sections
}

fn assemble(magic: &[u8; 4], version: u32, sections: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = magic.to_vec();
    out.write_u32::<LittleEndian>(version).unwrap();
    out.write_u32::<LittleEndian>(sections.len() as u32).unwrap();
    for (id, body) in sections {
        out.write_u32::<LittleEndian>(*id).unwrap();
        out.write_u64::<LittleEndian>(body.len() as u64).unwrap();
        out.extend_from_slice(body);
    }
    out
}

fn with_section(data: &[u8], id: u32, mut edit: impl FnMut(&mut Vec<u8>)) -> Vec<u8> {
    let mut sections = split(data);
    for (section, body) in sections.iter_mut() {
        if *section == id {
            edit(body);
        }
    }
    assemble(&data[..4].try_into().unwrap(), LittleEndian::read_u32(&data[4..8]), &sections)
}

#[test]
fn zkey_round_trips() {
    let key = toy_key();
    let loaded = read_zkey(&write_zkey(&key).unwrap()).unwrap();
    assert_eq!(loaded, key);
    loaded.validate().unwrap();
}

#[test]
fn chain_zkey_round_trips() {
    let key = ToyCircuit::multiplication_chain(33, Fr::from(2u64))
        .setup(&mut ark_std::test_rng())
        .key;
    assert_eq!(read_zkey(&write_zkey(&key).unwrap()).unwrap(), key);
}

#[test]
fn header_alone_gives_sizes() {
    let key = toy_key();
    let header = read_header(&write_zkey(&key).unwrap()).unwrap();
    assert_eq!(header.n_vars, key.n_vars);
    assert_eq!(header.n_public, key.n_public);
    assert_eq!(header.domain_size, key.domain_size);
    assert_eq!(header.delta2, key.delta2);
}

#[test]
fn section_order_does_not_matter() {
    let data = zkey_bytes();
    let mut sections = split(&data);
    sections.reverse();
    let shuffled = assemble(zkey::ZKEY_MAGIC, 1, &sections);
    assert_eq!(read_zkey(&shuffled).unwrap(), toy_key());
}

#[test]
fn stored_coefficients_lose_their_r_squared_factor() {
    let r = Fr::from(2u64).pow([256u64]);
    assert_eq!(*R_INV_SQUARED * r * r, Fr::one());
}

#[test]
fn bad_magic() {
    let mut data = zkey_bytes();
    data[..4].copy_from_slice(b"wtns");
    assert!(matches!(
        read_zkey(&data),
        Err(LoadError::BadMagic { found, .. }) if &found == b"wtns"
    ));
}

#[test]
fn truncated_file() {
    let mut data = zkey_bytes();
    data.truncate(data.len() - 1);
    assert!(matches!(read_zkey(&data), Err(LoadError::Truncated { .. })));
    assert!(matches!(read_zkey(&data[..6]), Err(LoadError::Truncated { .. })));
}

#[test]
fn plonk_keys_are_rejected() {
    let mut data = zkey_bytes();
    data[KEY_TYPE_OFFSET] = 2;
    assert!(matches!(
        read_zkey(&data),
        Err(LoadError::UnsupportedKeyType(2))
    ));
}

#[test]
fn foreign_curve_is_rejected() {
    let mut data = zkey_bytes();
    data[BASE_MODULUS_OFFSET] ^= 1;
    assert!(matches!(
        read_header(&data),
        Err(LoadError::CurveMismatch { .. })
    ));
}

#[test]
fn off_curve_point_is_rejected() {
    let mut data = zkey_bytes();
    data[ALPHA1_OFFSET] ^= 1;
    assert!(matches!(
        read_zkey(&data),
        Err(LoadError::NotOnCurve { what: "alpha1" })
    ));
}

#[test]
fn coordinate_above_the_modulus_is_rejected() {
    let mut data = zkey_bytes();
    data[ALPHA1_OFFSET..ALPHA1_OFFSET + 32].fill(0xff);
    assert!(matches!(
        read_zkey(&data),
        Err(LoadError::NonCanonical { what: "alpha1" })
    ));
}

#[test]
fn short_point_section_is_rejected() {
    let mut key = toy_key();
    key.points_h.pop();
    assert!(matches!(
        read_zkey(&write_zkey(&key).unwrap()),
        Err(LoadError::SectionSize {
            section: zkey::SECTION_POINTS_H,
            ..
        })
    ));
}

#[test]
fn missing_section_is_rejected() {
    let data = zkey_bytes();
    let sections: Vec<_> = split(&data)
        .into_iter()
        .filter(|(id, _)| *id != zkey::SECTION_POINTS_C)
        .collect();
    assert!(matches!(
        read_zkey(&assemble(zkey::ZKEY_MAGIC, 1, &sections)),
        Err(LoadError::MissingSection(zkey::SECTION_POINTS_C))
    ));
}

#[test]
fn unknown_matrix_is_rejected() {
    let data = with_section(&zkey_bytes(), zkey::SECTION_COEFFICIENTS, |body| {
        LittleEndian::write_u32(&mut body[4..8], 2);
    });
    assert!(matches!(read_zkey(&data), Err(LoadError::Malformed(_))));
}

#[test]
fn coefficient_count_must_match_the_section() {
    let data = with_section(&zkey_bytes(), zkey::SECTION_COEFFICIENTS, |body| {
        let n = LittleEndian::read_u32(&body[..4]);
        LittleEndian::write_u32(&mut body[..4], n + 1);
    });
    assert!(matches!(
        read_zkey(&data),
        Err(LoadError::SectionSize {
            section: zkey::SECTION_COEFFICIENTS,
            ..
        })
    ));
}

#[test]
fn out_of_range_coefficient_loads_but_fails_validation() {
    let data = with_section(&zkey_bytes(), zkey::SECTION_COEFFICIENTS, |body| {
        LittleEndian::write_u32(&mut body[12..16], u32::MAX);
    });
    let key = read_zkey(&data).unwrap();
    assert!(key.validate().is_err());
}

#[test]
fn witness_round_trips() {
    let circuit = ToyCircuit::cubic();
    let data = write_wtns(circuit.witness()).unwrap();
    assert_eq!(read_wtns(&data).unwrap(), circuit.witness());
    assert!(read_wtns(&write_wtns(&[]).unwrap()).unwrap().is_empty());
}

#[test]
fn witness_for_another_prime_is_rejected() {
    let data = with_section(
        &write_wtns(ToyCircuit::cubic().witness()).unwrap(),
        wtns::SECTION_HEADER,
        |body| body[4] ^= 1,
    );
    assert!(matches!(
        read_wtns(&data),
        Err(LoadError::CurveMismatch { .. })
    ));
}

#[test]
fn witness_count_must_match_the_values() {
    let data = with_section(
        &write_wtns(ToyCircuit::cubic().witness()).unwrap(),
        wtns::SECTION_VALUES,
        |body| body.truncate(body.len() - 32),
    );
    assert!(matches!(
        read_wtns(&data),
        Err(LoadError::SectionSize {
            section: wtns::SECTION_VALUES,
            ..
        })
    ));
}

#[test]
fn witness_value_above_the_modulus_is_rejected() {
    let data = with_section(
        &write_wtns(ToyCircuit::cubic().witness()).unwrap(),
        wtns::SECTION_VALUES,
        |body| body[32..64].fill(0xff),
    );
    assert!(matches!(
        read_wtns(&data),
        Err(LoadError::NonCanonical { .. })
    ));
}

#[test]
fn zkey_is_not_a_witness() {
    assert!(matches!(
        read_wtns(&zkey_bytes()),
        Err(LoadError::BadMagic { .. })
    ));
}

proptest! {
    #[test]
    fn any_witness_round_trips(witness in proptest::collection::vec(arb_fr(), 0..64)) {
        let data = write_wtns(&witness).unwrap();
        prop_assert_eq!(read_wtns(&data).unwrap(), witness);
    }
}
