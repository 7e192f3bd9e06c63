//! Dirty fit of a single 2-point correlator.
//!
//! Produces loose guesses for the ground and first-excited masses and
//! amplitudes of both the non-oscillating and oscillating towers, packaged
//! as log-parameter priors. These are starting beliefs for a later fit,
//! not measurements.

use corr_core::errors::{CorrError, ErrorInfo};
use corr_core::gvar::Gvar;
use corr_data::key::TwoPointKey;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::math::{safelog, zero_buffered};
use crate::prior::{Prior, PriorValue};
use crate::transforms::{amp_superav2, effective_mass, superav2};
use crate::{DEFAULT_LOOSENER, DEFAULT_ZERO_BUFFER};

/// Options for the single-correlator dirty fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoPointOpts {
    /// Number of exponential-decay terms per tower.
    pub nexp: usize,
    /// Analysis window cut; `None` picks `Tlat / 10` (integer-truncated).
    pub tcut: Option<usize>,
    /// Relative-width inflation applied to derived estimates.
    pub loosener: f64,
    /// Scale used to buffer distrusted excited-state estimates away from zero.
    pub zero_buffer: f64,
}

impl Default for TwoPointOpts {
    fn default() -> Self {
        Self {
            nexp: 4,
            tcut: None,
            loosener: DEFAULT_LOOSENER,
            zero_buffer: DEFAULT_ZERO_BUFFER,
        }
    }
}

impl TwoPointOpts {
    /// Ensures the configuration is well-formed and returns a sanitised copy.
    pub fn sanitised(&self) -> Self {
        Self {
            nexp: self.nexp.max(1),
            tcut: self.tcut,
            loosener: if self.loosener > 0.0 {
                self.loosener
            } else {
                DEFAULT_LOOSENER
            },
            zero_buffer: if self.zero_buffer > 0.0 {
                self.zero_buffer
            } else {
                DEFAULT_ZERO_BUFFER
            },
        }
    }
}

/// Clips a transformed correlator to the analysis window `[lo, hi)`.
pub(crate) fn analysis_window<'a>(
    series: &'a [Gvar],
    lo: usize,
    hi: usize,
    key: &str,
) -> Result<&'a [Gvar], CorrError> {
    if lo >= hi || hi > series.len() {
        return Err(CorrError::Prior(
            ErrorInfo::new("empty-window", "analysis window is empty for this correlator")
                .with_context("key", key)
                .with_context("window", format!("[{lo}, {hi})"))
                .with_context("available", series.len().to_string())
                .with_hint("lower the time cut or provide a longer correlator"),
        ));
    }
    Ok(&series[lo..hi])
}

/// Derives a prior fragment for a single 2-point correlator.
///
/// Keys of the form `meson.ss` yield parameters named after the meson and
/// its source letter; any other key is treated whole as the meson label
/// with an empty source.
pub fn two_point_prior(
    correlator: &[Gvar],
    key: &str,
    opts: &TwoPointOpts,
) -> Result<Prior, CorrError> {
    let opts = opts.sanitised();
    debug!("performing dirty fit on correlator {key}");

    let tlat = correlator.len();
    let tcut = opts.tcut.unwrap_or(tlat / 10);
    let window_hi = (tlat / 2).saturating_sub(tcut);
    debug!("tcut set to {tcut}");

    // ground state energy and amplitude from the smoothed correlator
    let mass = Gvar::weighted_avg(analysis_window(
        &effective_mass(&superav2(correlator)),
        tcut,
        window_hi,
        key,
    )?)?
    .loosen(opts.loosener);
    debug!("mass = {mass}");

    let amp = Gvar::weighted_avg(analysis_window(
        &amp_superav2(correlator),
        tcut,
        window_hi,
        key,
    )?)?
    .loosen(opts.loosener);
    debug!("amplitude = {amp}");

    // correlator with the fitted ground-state exponential removed
    let excited: Vec<Gvar> = correlator
        .iter()
        .enumerate()
        .map(|(t, c)| c.clone() - amp.clone() * (-(mass.clone() * t as f64)).exp())
        .collect();

    // first excited energy and amplitude, averaged pointwise and buffered
    // away from zero: only their rough scale and spread are trusted
    let spectrum = Gvar::mean_avg(analysis_window(
        &effective_mass(&superav2(&excited)),
        tcut,
        window_hi,
        key,
    )?)?
    .loosen(opts.loosener);
    let spectrum = zero_buffered(&spectrum, opts.zero_buffer);

    let spectrum_amp = Gvar::mean_avg(analysis_window(
        &amp_superav2(&excited),
        tcut,
        window_hi,
        key,
    )?)?
    .loosen(opts.loosener);
    let spectrum_amp = zero_buffered(&spectrum_amp, opts.zero_buffer);

    let label = TwoPointKey::from_key(key);
    let meson = label.meson.clone();
    let source = label.source_label();
    debug!("found meson label = {meson}, source label = {source}");

    let mut result = Prior::new();

    let mut amps: Vec<Gvar> = (0..opts.nexp).map(|_| safelog(&spectrum_amp)).collect();
    amps[0] = safelog(&amp);
    result.insert(format!("log{meson}:a{source}"), PriorValue::Series(amps))?;

    let mut energies: Vec<Gvar> = (0..opts.nexp).map(|_| safelog(&spectrum)).collect();
    energies[0] = safelog(&mass);
    result.insert(format!("logdE:{meson}"), PriorValue::Series(energies))?;

    // oscillating tower guesses: ground amplitude smaller and ground
    // energy larger than the non-oscillating estimates
    let osc_amps: Vec<Gvar> = (0..opts.nexp)
        .map(|_| safelog(&Gvar::new(amp.mean() / 2.0, amp.mean())))
        .collect();
    result.insert(format!("logo{meson}:a{source}"), PriorValue::Series(osc_amps))?;

    let mut osc_energies: Vec<Gvar> = (0..opts.nexp).map(|_| safelog(&spectrum)).collect();
    osc_energies[0] = safelog(&Gvar::new(mass.mean() * 1.5, mass.mean()));
    result.insert(format!("logdE:o{meson}"), PriorValue::Series(osc_energies))?;

    debug!("result = {result}");
    Ok(result.parenthesized())
}
