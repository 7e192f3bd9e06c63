//! Dirty fit of a 3-point transition amplitude.
//!
//! The ratio `R(t) = C3(t) / ( C2_1(T-t) * C2_2(t) )` equals `J / (a1 a2)`
//! for a transition amplitude `J` and 2-point ground amplitudes `a1`, `a2`,
//! so `J = R * a1 * a2`. The builder estimates the amplitudes from the
//! companion 2-point correlators, averages the smoothed ratio over the
//! central window, and seeds the non-oscillating coupling matrix with the
//! resulting `J`.

use corr_core::errors::{CorrError, ErrorInfo};
use corr_core::gvar::Gvar;
use corr_data::dataset::CorrelatorSet;
use corr_data::key::ThreePointKey;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::prior::{Prior, PriorValue};
use crate::transforms::{amp_superav2, ratio, superav2};
use crate::twopoint::analysis_window;
use crate::DEFAULT_LOOSENER;

/// Options for the 3-point transition-amplitude dirty fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreePointOpts {
    /// Number of exponential-decay terms per tower.
    pub nexp: usize,
    /// Ratio window cut; `None` picks `T / 3` (integer-truncated).
    pub tcut_3pt: Option<usize>,
    /// 2-point window cut; `None` picks `Tlat / 10` (integer-truncated).
    pub tcut_2pt: Option<usize>,
    /// Relative-width inflation applied to derived estimates.
    pub loosener: f64,
}

impl Default for ThreePointOpts {
    fn default() -> Self {
        Self {
            nexp: 4,
            tcut_3pt: None,
            tcut_2pt: None,
            loosener: DEFAULT_LOOSENER,
        }
    }
}

impl ThreePointOpts {
    /// Ensures the configuration is well-formed and returns a sanitised copy.
    pub fn sanitised(&self) -> Self {
        Self {
            nexp: self.nexp.max(1),
            tcut_3pt: self.tcut_3pt,
            tcut_2pt: self.tcut_2pt,
            loosener: if self.loosener > 0.0 {
                self.loosener
            } else {
                DEFAULT_LOOSENER
            },
        }
    }
}

/// Derives the transition-amplitude prior fragment for a 3-point key.
///
/// The collection must hold the 3-point correlator under `key` and a
/// companion 2-point correlator for each meson; a missing companion or a
/// malformed key is an error carrying the offending key and the expected
/// shape.
pub fn three_point_prior(
    correlators: &CorrelatorSet,
    key: &str,
    current: &str,
    opts: &ThreePointOpts,
) -> Result<Prior, CorrError> {
    let opts = opts.sanitised();
    debug!("performing dirty fit on correlator {key}");

    let parsed = ThreePointKey::parse(key, current)?;
    let separation = parsed.separation;
    debug!(
        "found meson labels = {}, {}, T = {separation}",
        parsed.meson1, parsed.meson2
    );

    let c3 = correlators.get(key).ok_or_else(|| {
        CorrError::Data(
            ErrorInfo::new("unknown-key", "3-point correlator not present in collection")
                .with_context("key", key),
        )
    })?;
    if c3.len() != separation {
        return Err(CorrError::Data(
            ErrorInfo::new(
                "separation-mismatch",
                "3-point correlator length disagrees with the separation in its key",
            )
            .with_context("key", key)
            .with_context("separation", separation.to_string())
            .with_context("length", c3.len().to_string()),
        ));
    }

    let tcut_3pt = opts.tcut_3pt.unwrap_or(separation / 3);
    debug!("tcut_3pt set to {tcut_3pt}");

    // ground amplitudes of the companion 2-point correlators
    let mut c2 = Vec::with_capacity(2);
    let mut amps = Vec::with_capacity(2);
    for meson in [&parsed.meson1, &parsed.meson2] {
        let companion = parsed.companion_key(meson);
        debug!("finding amplitude for {meson} via {companion}");
        let correlator = correlators.get(&companion).ok_or_else(|| {
            CorrError::Data(
                ErrorInfo::new(
                    "missing-companion",
                    "cannot find the 2-point correlator to go with this 3-point key",
                )
                .with_context("key", key)
                .with_context("companion", companion.clone())
                .with_hint("every 3-point key needs 2-point correlators for both mesons"),
            )
        })?;

        let tlat = correlator.len();
        let tcut_2pt = opts.tcut_2pt.unwrap_or(tlat / 10);
        let amp = Gvar::weighted_avg(analysis_window(
            &amp_superav2(correlator),
            tcut_2pt,
            (tlat / 2).saturating_sub(tcut_2pt),
            &companion,
        )?)?
        .loosen(opts.loosener);
        debug!("amp = {amp}");

        c2.push(correlator);
        amps.push(amp);
    }

    // J = smoothed ratio over the central window, times both amplitudes
    let smoothed = superav2(&ratio(c3, c2[0], c2[1])?);
    let j = Gvar::weighted_avg(analysis_window(
        &smoothed,
        tcut_3pt,
        separation.saturating_sub(tcut_3pt),
        key,
    )?)?
        * amps[0].clone()
        * amps[1].clone();
    let j = j.loosen(opts.loosener);
    debug!("J = {j}");

    let tag = parsed.tag();
    let mut result = Prior::new();
    for name in ["Vnn_", "Von_", "Vno_", "Voo_"] {
        let matrix: Vec<Vec<Gvar>> = (0..opts.nexp)
            .map(|_| (0..opts.nexp).map(|_| Gvar::new(0.01, 1.0)).collect())
            .collect();
        result.insert(format!("{name}{tag}"), PriorValue::Matrix(matrix))?;
    }
    if let Some(PriorValue::Matrix(matrix)) = result.get_mut(&format!("Vnn_{tag}")) {
        matrix[0][0] = j;
    }

    debug!("result = {result}");
    Ok(result.parenthesized())
}
