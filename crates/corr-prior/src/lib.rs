#![deny(missing_docs)]
#![doc = "Prior derivation for Bayesian correlator fits: effective-mass transforms, dirty single-correlator and transition-amplitude estimates, and the subset-carving orchestrator."]

pub mod math;
pub mod orchestrate;
pub mod prior;
pub mod threepoint;
pub mod transforms;
pub mod twopoint;

pub use math::{safelog, zero_buffered};
pub use orchestrate::{derive_priors, PriorConfig};
pub use prior::{Prior, PriorValue};
pub use threepoint::{three_point_prior, ThreePointOpts};
pub use twopoint::{two_point_prior, TwoPointOpts};

/// Default multiplicative inflation applied to derived prior widths.
pub const DEFAULT_LOOSENER: f64 = 0.3;

/// Default scale used to buffer distrusted estimates away from zero.
pub const DEFAULT_ZERO_BUFFER: f64 = 0.1;
