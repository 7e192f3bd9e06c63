//! Prior derivation over a whole dataset.
//!
//! A random subset of the sample rows is carved off, averaged, and used to
//! derive priors; the rows are removed from the caller's dataset so the
//! later fit never sees the data its priors were deduced from.

use corr_core::errors::{CorrError, ErrorInfo};
use corr_core::rng::RngHandle;
use corr_data::dataset::Dataset;
use corr_data::key::{classify, KeyClass};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::prior::Prior;
use crate::threepoint::{three_point_prior, ThreePointOpts};
use crate::twopoint::{two_point_prior, TwoPointOpts};
use crate::{DEFAULT_LOOSENER, DEFAULT_ZERO_BUFFER};

/// Configuration for a prior-derivation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorConfig {
    /// Number of sample rows to carve off for the derivation.
    pub nsubset: usize,
    /// Number of exponential-decay terms per tower.
    pub nexp: usize,
    /// Registered current labels; keys containing one are 3-point keys.
    pub currents: Vec<String>,
    /// 2-point window cut override.
    pub tcut_2pt: Option<usize>,
    /// 3-point ratio window cut override.
    pub tcut_3pt: Option<usize>,
    /// Relative-width inflation applied to derived estimates.
    pub loosener: f64,
    /// Scale used to buffer distrusted excited-state estimates.
    pub zero_buffer: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            nsubset: 1,
            nexp: 4,
            currents: Vec::new(),
            tcut_2pt: None,
            tcut_3pt: None,
            loosener: DEFAULT_LOOSENER,
            zero_buffer: DEFAULT_ZERO_BUFFER,
        }
    }
}

impl PriorConfig {
    /// Checks the input contract.
    pub fn validate(&self) -> Result<(), CorrError> {
        if self.nsubset == 0 {
            return Err(CorrError::Prior(ErrorInfo::new(
                "invalid-config",
                "nsubset must be a positive integer",
            )));
        }
        if self.nexp == 0 {
            return Err(CorrError::Prior(ErrorInfo::new(
                "invalid-config",
                "nexp must be a positive integer",
            )));
        }
        Ok(())
    }

    fn two_point_opts(&self) -> TwoPointOpts {
        TwoPointOpts {
            nexp: self.nexp,
            tcut: self.tcut_2pt,
            loosener: self.loosener,
            zero_buffer: self.zero_buffer,
        }
    }

    fn three_point_opts(&self) -> ThreePointOpts {
        ThreePointOpts {
            nexp: self.nexp,
            tcut_3pt: self.tcut_3pt,
            tcut_2pt: self.tcut_2pt,
            loosener: self.loosener,
        }
    }
}

/// Derives a combined prior from a randomly carved subset of the dataset.
///
/// The drawn rows are removed from `dataset` in place, positionally and
/// identically for every key, so the surviving rows stay aligned and are
/// disjoint from the data behind the returned prior. A failure on any key
/// aborts the whole pass; no partial prior is returned.
pub fn derive_priors(
    dataset: &mut Dataset,
    config: &PriorConfig,
    rng: &mut RngHandle,
) -> Result<Prior, CorrError> {
    config.validate()?;

    let indices = dataset.draw_subset(rng, config.nsubset)?;
    debug!("rows selected for prior derivation: {indices:?}");

    let subset = dataset.subset_average(&indices)?;
    dataset.remove_rows(&indices)?;
    debug!("selected rows removed from dataset");

    let mut prior = Prior::new();
    for (key, correlator) in &subset {
        let fragment = match classify(key, &config.currents) {
            KeyClass::ThreePoint(current) => {
                three_point_prior(&subset, key, &current, &config.three_point_opts())
                    .map_err(|err| err.with_context("while-processing", key.clone()))?
            }
            KeyClass::TwoPoint => two_point_prior(correlator, key, &config.two_point_opts())
                .map_err(|err| err.with_context("while-processing", key.clone()))?,
        };
        prior.merge(fragment);
    }
    Ok(prior)
}
