#![deny(missing_docs)]
#![doc = "Dataset layer for CorrBayes: structured correlator keys and the aligned sample store."]

pub mod dataset;
pub mod key;

pub use dataset::{Correlator, CorrelatorSet, Dataset};
pub use key::{classify, CorrelatorKey, KeyClass, ThreePointKey, TwoPointKey};
