use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rapidgroth::api::{
    groth16_proof_size, groth16_prover_with_config, groth16_public_size_for_zkey_buf, PROVER_OK,
};
use rapidgroth::errors::ConfigurationError;
use rapidgroth::groth16::ProverConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Groth16 prover for circom/snarkjs proving keys.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// proving key (.zkey)
    zkey: PathBuf,
    /// witness (.wtns)
    witness: PathBuf,
    /// where to write the proof json
    proof: PathBuf,
    /// where to write the public signals json
    public: PathBuf,
    /// worker threads, defaults to the available parallelism rounded down to a power of two
    #[arg(long)]
    threads: Option<usize>,
}

fn run(cli: Cli) -> Result<()> {
    if cli.proof == cli.public {
        return Err(ConfigurationError::Usage(format!(
            "proof and public signals would both be written to {}",
            cli.proof.display()
        ))
        .into());
    }
    let config = cli
        .threads
        .map(ProverConfig::with_num_threads)
        .unwrap_or_default();

    let zkey = std::fs::read(&cli.zkey)
        .with_context(|| format!("reading proving key {}", cli.zkey.display()))?;
    let wtns = std::fs::read(&cli.witness)
        .with_context(|| format!("reading witness {}", cli.witness.display()))?;
    info!(
        zkey_bytes = zkey.len(),
        wtns_bytes = wtns.len(),
        num_threads = config.num_threads,
        "inputs read"
    );

    let mut error_msg = vec![0u8; 256];
    let mut public_size = 0;
    let status = groth16_public_size_for_zkey_buf(&zkey, &mut public_size, &mut error_msg);
    if status != PROVER_OK {
        bail!("sizing public buffer failed with status {status}: {}", c_str(&error_msg));
    }

    let mut proof_buf = vec![0u8; groth16_proof_size()];
    let mut public_buf = vec![0u8; public_size];
    let mut proof_size = 0;
    let status = groth16_prover_with_config(
        &zkey,
        &wtns,
        &mut proof_buf,
        &mut proof_size,
        &mut public_buf,
        &mut public_size,
        &mut error_msg,
        config,
    );
    if status != PROVER_OK {
        bail!("proving failed with status {status}: {}", c_str(&error_msg));
    }

    std::fs::write(&cli.proof, &proof_buf[..proof_size])
        .with_context(|| format!("writing proof to {}", cli.proof.display()))?;
    std::fs::write(&cli.public, &public_buf[..public_size])
        .with_context(|| format!("writing public signals to {}", cli.public.display()))?;
    Ok(())
}

/// Text of a NUL-terminated message buffer.
fn c_str(buf: &[u8]) -> String {
    let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
