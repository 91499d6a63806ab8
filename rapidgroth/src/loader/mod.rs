//! Readers for the circom/snarkjs binary formats: `.zkey` proving keys and `.wtns` witnesses.
//!
//! Both are a 4-byte magic, a version, and a list of `(id, length, body)` sections.

pub(crate) mod binfile;
pub mod wtns;
pub mod zkey;

#[cfg(test)]
mod tests;

pub use wtns::read_wtns;
pub use zkey::{read_header, read_zkey, ZkeyHeader};
