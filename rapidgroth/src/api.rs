//! Buffer-in, buffer-out entry point.
//!
//! [`groth16_prover`] and [`groth16_public_size_for_zkey_buf`] report through integer status
//! codes and caller-provided buffers, for callers on the far side of a process or language
//! boundary. Rust callers should prefer [`prove_from_buffers`].

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::errors::{Error, ProverError};
use crate::groth16::proof_system::types::public_signals_json;
use crate::groth16::{Proof, Prover, ProverConfig};
use crate::loader::{read_header, read_wtns, read_zkey};

/// The proof was written.
pub const PROVER_OK: i32 = 0;
/// Anything not covered by a more specific code. See the error message.
pub const PROVER_ERROR: i32 = 1;
/// An output buffer was too small. The required sizes were written back.
pub const PROVER_ERROR_SHORT_BUFFER: i32 = 2;
/// The witness does not have one entry per variable of the key.
pub const PROVER_INVALID_WITNESS_LENGTH: i32 = 3;

/// Capacity every proof buffer must have.
pub const PROOF_BUFFER_SIZE: usize = 4096;

/// Upper bound on the bytes of one public signal: 77 decimal digits, quotes and a comma.
const PUBLIC_SIGNAL_BYTES: usize = 77 + 3;

/// Capacity a proof buffer must have.
pub fn groth16_proof_size() -> usize {
    PROOF_BUFFER_SIZE
}

/// Capacity a public signals buffer must have for `n_public` inputs, brackets and NUL included.
pub fn public_buffer_size(n_public: usize) -> usize {
    3 + n_public * PUBLIC_SIGNAL_BYTES
}

/// Result of a successful proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProverOutput {
    #[allow(missing_docs)]
    pub proof: Proof,
    /// snarkjs proof json
    pub proof_json: String,
    /// public signals as a json array of decimal strings
    pub public_json: String,
}

/// Proves with the witness in `wtns` against the key in `zkey`, on a default-sized pool.
pub fn prove_from_buffers(zkey: &[u8], wtns: &[u8]) -> Result<ProverOutput, Error> {
    prove_from_buffers_with_config(zkey, wtns, ProverConfig::default())
}

/// [`prove_from_buffers`] with an explicit prover configuration.
pub fn prove_from_buffers_with_config(
    zkey: &[u8],
    wtns: &[u8],
    config: ProverConfig,
) -> Result<ProverOutput, Error> {
    let start = Instant::now();
    let key = read_zkey(zkey)?;
    let witness = read_wtns(wtns)?;
    if witness.len() != key.n_vars {
        return Err(ProverError::WitnessLength {
            expected: key.n_vars,
            actual: witness.len(),
        }
        .into());
    }

    let n_public = key.n_public;
    let prover = Prover::new(Arc::new(key), config)?;
    let proof = prover.prove(&witness)?;

    let output = ProverOutput {
        proof,
        proof_json: proof.to_json_string()?,
        public_json: public_signals_json(&witness[1..=n_public])?,
    };
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "buffers proven"
    );
    Ok(output)
}

/// Copies `msg` into `error_msg`, truncated to fit, NUL-terminated.
fn write_error(error_msg: &mut [u8], msg: &str) {
    let Some(capacity) = error_msg.len().checked_sub(1) else {
        return;
    };
    let n = msg.len().min(capacity);
    error_msg[..n].copy_from_slice(&msg.as_bytes()[..n]);
    error_msg[n] = 0;
}

/// Copies `s` and a trailing NUL into `buf`. `false` if it does not fit.
fn write_c_string(buf: &mut [u8], s: &str) -> bool {
    if s.len() >= buf.len() {
        return false;
    }
    buf[..s.len()].copy_from_slice(s.as_bytes());
    buf[s.len()] = 0;
    true
}

fn status_of(e: &Error) -> i32 {
    match e {
        Error::Prover(ProverError::WitnessLength { .. }) => PROVER_INVALID_WITNESS_LENGTH,
        _ => PROVER_ERROR,
    }
}

fn fail(e: &Error, error_msg: &mut [u8]) -> i32 {
    error!(error = %e, "prover failed");
    write_error(error_msg, &e.to_string());
    status_of(e)
}

/// Writes the public buffer capacity `zkey` needs into `public_size`.
pub fn groth16_public_size_for_zkey_buf(
    zkey: &[u8],
    public_size: &mut usize,
    error_msg: &mut [u8],
) -> i32 {
    match read_header(zkey) {
        Ok(header) => {
            *public_size = public_buffer_size(header.n_public);
            PROVER_OK
        }
        Err(e) => fail(&e.into(), error_msg),
    }
}

/// Proves and writes the NUL-terminated proof and public signals json into the buffers.
///
/// Buffer capacities are the slice lengths. On success `proof_size` and `public_size` hold the
/// json lengths without the NUL. If a buffer is too small nothing is proven, the required
/// capacities are written back and [`PROVER_ERROR_SHORT_BUFFER`] is returned.
pub fn groth16_prover(
    zkey: &[u8],
    wtns: &[u8],
    proof_buf: &mut [u8],
    proof_size: &mut usize,
    public_buf: &mut [u8],
    public_size: &mut usize,
    error_msg: &mut [u8],
) -> i32 {
    groth16_prover_with_config(
        zkey,
        wtns,
        proof_buf,
        proof_size,
        public_buf,
        public_size,
        error_msg,
        ProverConfig::default(),
    )
}

/// [`groth16_prover`] with an explicit prover configuration.
#[allow(clippy::too_many_arguments)]
pub fn groth16_prover_with_config(
    zkey: &[u8],
    wtns: &[u8],
    proof_buf: &mut [u8],
    proof_size: &mut usize,
    public_buf: &mut [u8],
    public_size: &mut usize,
    error_msg: &mut [u8],
    config: ProverConfig,
) -> i32 {
    let header = match read_header(zkey) {
        Ok(header) => header,
        Err(e) => return fail(&e.into(), error_msg),
    };
    let public_needed = public_buffer_size(header.n_public);
    if proof_buf.len() < PROOF_BUFFER_SIZE || public_buf.len() < public_needed {
        *proof_size = PROOF_BUFFER_SIZE;
        *public_size = public_needed;
        write_error(
            error_msg,
            &format!(
                "proof buffer needs {PROOF_BUFFER_SIZE} bytes (got {}), public buffer needs \
                 {public_needed} (got {})",
                proof_buf.len(),
                public_buf.len()
            ),
        );
        return PROVER_ERROR_SHORT_BUFFER;
    }

    let output = match prove_from_buffers_with_config(zkey, wtns, config) {
        Ok(output) => output,
        Err(e) => return fail(&e, error_msg),
    };
    if !write_c_string(proof_buf, &output.proof_json)
        || !write_c_string(public_buf, &output.public_json)
    {
        *proof_size = PROOF_BUFFER_SIZE.max(output.proof_json.len() + 1);
        *public_size = public_needed.max(output.public_json.len() + 1);
        write_error(error_msg, "output does not fit the buffers");
        return PROVER_ERROR_SHORT_BUFFER;
    }
    *proof_size = output.proof_json.len();
    *public_size = output.public_json.len();
    PROVER_OK
}
