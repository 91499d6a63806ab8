pub mod proof;

pub use proof::{public_signals_json, Proof};
