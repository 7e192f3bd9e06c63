//! Correlated uncertain scalars with linear error propagation.
//!
//! A [`Gvar`] is a Gaussian random variable represented by its mean and a
//! sparse derivative vector with respect to independent unit-variance
//! primaries. Arithmetic combines derivative vectors linearly, so values
//! built from shared primaries stay correlated: `x - x` has exactly zero
//! width, and covariances survive arbitrary chains of transforms. Primary
//! identifiers are allocated from a process-wide counter, which is the
//! shared correlation-structure store referenced by every value.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{CorrError, ErrorInfo};

static NEXT_PRIMARY: AtomicU64 = AtomicU64::new(1);

fn fresh_primary() -> u64 {
    NEXT_PRIMARY.fetch_add(1, Ordering::Relaxed)
}

/// Gaussian random variable with tracked correlations.
#[derive(Debug, Clone, PartialEq)]
pub struct Gvar {
    mean: f64,
    deriv: BTreeMap<u64, f64>,
}

impl Gvar {
    /// Creates an independent variable with the given mean and standard deviation.
    pub fn new(mean: f64, sdev: f64) -> Self {
        let mut deriv = BTreeMap::new();
        if sdev != 0.0 {
            deriv.insert(fresh_primary(), sdev.abs());
        }
        Self { mean, deriv }
    }

    /// Creates a variable with zero uncertainty.
    pub fn exact(mean: f64) -> Self {
        Self {
            mean,
            deriv: BTreeMap::new(),
        }
    }

    /// Returns the mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the variance.
    pub fn var(&self) -> f64 {
        self.deriv.values().map(|d| d * d).sum()
    }

    /// Returns the standard deviation.
    pub fn sdev(&self) -> f64 {
        self.var().sqrt()
    }

    /// Returns the covariance with another variable.
    pub fn cov(&self, other: &Gvar) -> f64 {
        self.deriv
            .iter()
            .filter_map(|(id, da)| other.deriv.get(id).map(|db| da * db))
            .sum()
    }

    /// Inflates the relative width by `(1 + factor)` without moving the mean.
    pub fn loosen(&self, factor: f64) -> Gvar {
        self.chain(self.mean, 1.0 + factor)
    }

    /// Exponential with linear error propagation.
    pub fn exp(&self) -> Gvar {
        let value = self.mean.exp();
        self.chain(value, value)
    }

    /// Natural logarithm with linear error propagation.
    ///
    /// A non-positive mean yields a non-finite result mean; callers that
    /// need a total function should go through their own fallback policy.
    pub fn ln(&self) -> Gvar {
        self.chain(self.mean.ln(), 1.0 / self.mean)
    }

    /// Square root with linear error propagation.
    pub fn sqrt(&self) -> Gvar {
        let value = self.mean.sqrt();
        self.chain(value, 0.5 / value)
    }

    /// Integer power with linear error propagation.
    pub fn powi(&self, exponent: i32) -> Gvar {
        self.chain(
            self.mean.powi(exponent),
            f64::from(exponent) * self.mean.powi(exponent - 1),
        )
    }

    /// Averages equal-length sample rows into one correlated sequence.
    ///
    /// Element `t` of the result has the sample mean of slice `t` and one
    /// derivative entry per sample row, so the full slice-by-slice
    /// covariance of the mean is estimated and shared across the sequence.
    pub fn from_samples(samples: &[Vec<f64>]) -> Result<Vec<Gvar>, CorrError> {
        if samples.is_empty() {
            return Err(CorrError::Data(ErrorInfo::new(
                "empty-samples",
                "cannot average an empty sample collection",
            )));
        }
        let length = samples[0].len();
        if samples.iter().any(|row| row.len() != length) {
            return Err(CorrError::Data(
                ErrorInfo::new("ragged-samples", "sample rows have unequal lengths")
                    .with_context("expected", length.to_string()),
            ));
        }

        let n = samples.len() as f64;
        let primaries: Vec<u64> = samples.iter().map(|_| fresh_primary()).collect();
        let mut averaged = Vec::with_capacity(length);
        for t in 0..length {
            let mean = samples.iter().map(|row| row[t]).sum::<f64>() / n;
            let mut deriv = BTreeMap::new();
            for (row, id) in samples.iter().zip(primaries.iter()) {
                let coefficient = (row[t] - mean) / n;
                if coefficient != 0.0 {
                    deriv.insert(*id, coefficient);
                }
            }
            averaged.push(Gvar { mean, deriv });
        }
        Ok(averaged)
    }

    /// Correlated inverse-variance weighted average of a window.
    ///
    /// Windows of exact values (no propagated uncertainty anywhere) fall
    /// back to the scatter estimate: mean of the window with the standard
    /// error of that mean as width. Mixed windows where only some entries
    /// are exact use the plain correlated average instead, as an infinite
    /// weight would discard the rest of the window.
    pub fn weighted_avg(window: &[Gvar]) -> Result<Gvar, CorrError> {
        if window.is_empty() {
            return Err(CorrError::Data(ErrorInfo::new(
                "empty-window",
                "cannot average an empty window",
            )));
        }
        if window.iter().all(|v| v.var() == 0.0) {
            let n = window.len() as f64;
            let mean = window.iter().map(Gvar::mean).sum::<f64>() / n;
            let var = window
                .iter()
                .map(|v| (v.mean() - mean).powi(2))
                .sum::<f64>()
                / (n * n);
            return Ok(Gvar::new(mean, var.sqrt()));
        }
        if window.iter().any(|v| v.var() == 0.0) {
            return Self::mean_avg(window);
        }

        let total: f64 = window.iter().map(|v| 1.0 / v.var()).sum();
        let mut result = Gvar::exact(0.0);
        for value in window {
            result = result + value.clone() * (1.0 / (value.var() * total));
        }
        Ok(result)
    }

    /// Plain arithmetic average of a window, correlations preserved.
    pub fn mean_avg(window: &[Gvar]) -> Result<Gvar, CorrError> {
        if window.is_empty() {
            return Err(CorrError::Data(ErrorInfo::new(
                "empty-window",
                "cannot average an empty window",
            )));
        }
        let weight = 1.0 / window.len() as f64;
        let mut result = Gvar::exact(0.0);
        for value in window {
            result = result + value.clone() * weight;
        }
        Ok(result)
    }

    /// Applies a differentiable map: new mean plus chain-rule scaling of the
    /// derivative vector.
    fn chain(&self, mean: f64, slope: f64) -> Gvar {
        Gvar {
            mean,
            deriv: self.deriv.iter().map(|(id, d)| (*id, d * slope)).collect(),
        }
    }

    fn combine(&self, other: &Gvar, mean: f64, slope_self: f64, slope_other: f64) -> Gvar {
        let mut deriv: BTreeMap<u64, f64> = self
            .deriv
            .iter()
            .map(|(id, d)| (*id, d * slope_self))
            .collect();
        for (id, d) in &other.deriv {
            *deriv.entry(*id).or_insert(0.0) += d * slope_other;
        }
        Gvar { mean, deriv }
    }
}

impl fmt::Display for Gvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} +- {}", self.mean, self.sdev())
    }
}

impl Add for Gvar {
    type Output = Gvar;

    fn add(self, other: Gvar) -> Gvar {
        self.combine(&other, self.mean + other.mean, 1.0, 1.0)
    }
}

impl Sub for Gvar {
    type Output = Gvar;

    fn sub(self, other: Gvar) -> Gvar {
        self.combine(&other, self.mean - other.mean, 1.0, -1.0)
    }
}

impl Mul for Gvar {
    type Output = Gvar;

    fn mul(self, other: Gvar) -> Gvar {
        self.combine(&other, self.mean * other.mean, other.mean, self.mean)
    }
}

impl Div for Gvar {
    type Output = Gvar;

    fn div(self, other: Gvar) -> Gvar {
        self.combine(
            &other,
            self.mean / other.mean,
            1.0 / other.mean,
            -self.mean / (other.mean * other.mean),
        )
    }
}

impl Neg for Gvar {
    type Output = Gvar;

    fn neg(self) -> Gvar {
        self.chain(-self.mean, -1.0)
    }
}

impl Add<f64> for Gvar {
    type Output = Gvar;

    fn add(self, shift: f64) -> Gvar {
        self.chain(self.mean + shift, 1.0)
    }
}

impl Add<Gvar> for f64 {
    type Output = Gvar;

    fn add(self, value: Gvar) -> Gvar {
        value + self
    }
}

impl Sub<f64> for Gvar {
    type Output = Gvar;

    fn sub(self, shift: f64) -> Gvar {
        self.chain(self.mean - shift, 1.0)
    }
}

impl Sub<Gvar> for f64 {
    type Output = Gvar;

    fn sub(self, value: Gvar) -> Gvar {
        -value + self
    }
}

impl Mul<f64> for Gvar {
    type Output = Gvar;

    fn mul(self, scale: f64) -> Gvar {
        self.chain(self.mean * scale, scale)
    }
}

impl Mul<Gvar> for f64 {
    type Output = Gvar;

    fn mul(self, value: Gvar) -> Gvar {
        value * self
    }
}

impl Div<f64> for Gvar {
    type Output = Gvar;

    fn div(self, scale: f64) -> Gvar {
        self.chain(self.mean / scale, 1.0 / scale)
    }
}

impl Div<Gvar> for f64 {
    type Output = Gvar;

    fn div(self, value: Gvar) -> Gvar {
        let mean = self / value.mean;
        value.chain(mean, -self / (value.mean * value.mean))
    }
}
