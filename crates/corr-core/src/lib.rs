#![deny(missing_docs)]
#![doc = "Core value types for CorrBayes: correlated uncertain scalars, structured errors and deterministic randomness."]

pub mod errors;
pub mod gvar;
pub mod rng;

pub use errors::{CorrError, ErrorInfo};
pub use gvar::Gvar;
pub use rng::{derive_substream_seed, RngHandle};
