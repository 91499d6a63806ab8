#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub
)]

//! rapidgroth: a multi-threaded groth16 prover over bn254 for circom/snarkjs proving keys.
//!
//! Load a key with [`loader::read_zkey`], build a [`Prover`] once, then prove any number of
//! witnesses against it, concurrently if you like. [`api`] wraps the whole pipeline behind
//! byte buffers and status codes.

/// buffer-level entry points
pub mod api;
/// random utilities
pub(crate) mod common;
/// curve types and msm backends
pub mod ecc;
/// error types
pub mod errors;
/// the groth16 prover
pub mod groth16;
/// zkey and wtns readers
pub mod loader;
/// bitops mostly
pub(crate) mod numeric;
/// ffts over power-of-two domains
pub mod polynomials;

/// Test utilities.
#[cfg(any(test, feature = "test_utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test_utils")))]
pub mod test_utils;

pub use common::max_threads::compute_num_threads;
pub use errors::Error;
pub use groth16::{Proof, Prover, ProverConfig, ProvingKey};
