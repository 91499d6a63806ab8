use thiserror::Error;

/// Invalid prover configuration or command line usage. Nothing was proven.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A worker pool needs at least one thread.
    #[error("thread count must be at least 1")]
    ZeroThreads,
    /// Rayon refused to build the worker pool.
    #[error("could not build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Wrong command line arguments.
    #[error("{0}")]
    Usage(String),
}

/// Malformed proving key, witness or proof encoding.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The buffer ended before `what` could be read.
    #[error("unexpected end of input while reading {what}")]
    Truncated {
        /// what was being read
        what: &'static str,
    },
    /// The file does not start with the expected 4-byte tag.
    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        /// tag we wanted
        expected: [u8; 4],
        /// tag we got
        found: [u8; 4],
    },
    /// A section the format requires is not present.
    #[error("section {0} is missing")]
    MissingSection(u32),
    /// A section length disagrees with the counts in the header.
    #[error("section {section} is {actual} bytes, expected {expected}")]
    SectionSize {
        /// section id
        section: u32,
        /// byte length implied by the header
        expected: u64,
        /// byte length found
        actual: u64,
    },
    /// Only groth16 keys can be proven with.
    #[error("unsupported key type {0}, only groth16 (1) is supported")]
    UnsupportedKeyType(u32),
    /// The key or witness was generated for another field.
    #[error("{what} does not match bn254")]
    CurveMismatch {
        /// which modulus was wrong
        what: &'static str,
    },
    /// Field bytes encode an integer at or above the modulus.
    #[error("{what} is not a canonical field element")]
    NonCanonical {
        /// which element
        what: &'static str,
    },
    /// Decoded coordinates do not satisfy the curve equation.
    #[error("{what} is not a valid curve point")]
    NotOnCurve {
        /// which point
        what: &'static str,
    },
    /// Anything else structurally wrong with the input.
    #[error("{0}")]
    Malformed(String),
}

/// Fatal failure of an in-flight proof. No partial proof exists when this is returned.
#[derive(Debug, Error)]
pub enum ProverError {
    /// The witness does not have one entry per circuit variable.
    #[error("witness has {actual} entries but the proving key expects {expected}")]
    WitnessLength {
        /// `n_vars` of the key
        expected: usize,
        /// witness length
        actual: usize,
    },
    /// A transform was requested on a domain the root tables do not cover.
    #[error("domain of size {size} is not covered by the fft tables (max {max_size})")]
    DomainSize {
        /// requested size
        size: usize,
        /// largest size the tables support
        max_size: usize,
    },
    /// The proving key breaks one of its structural invariants.
    #[error("invalid proving key: {0}")]
    InvalidKey(String),
    /// The blinding randomness could not be drawn.
    #[error("randomness source failed: {0}")]
    Randomness(#[from] rand::Error),
    /// An msm was called with mismatched point and scalar counts.
    #[error("msm over {points} points was given {scalars} scalars")]
    MsmLength {
        /// number of bases
        points: usize,
        /// number of scalars
        scalars: usize,
    },
    /// The msm backend reported a failure.
    #[error("msm backend failed: {0}")]
    Msm(String),
}

/// Everything that can go wrong between raw input buffers and a serialized proof.
#[derive(Debug, Error)]
pub enum Error {
    /// see [`ConfigurationError`]
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// see [`LoadError`]
    #[error(transparent)]
    Load(#[from] LoadError),
    /// see [`ProverError`]
    #[error(transparent)]
    Prover(#[from] ProverError),
    /// The proof or public signals could not be rendered as json.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
