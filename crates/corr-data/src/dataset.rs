//! Aligned store of correlator measurement samples.
//!
//! Every key holds the same number of sample rows and rows are aligned
//! across keys: row `s` under one key was measured on the same gauge
//! configuration as row `s` under every other key. The alignment is
//! validated once, at insertion time, and positional row removal is
//! applied identically across all keys so it survives the prior-subset
//! carve-out.

use std::collections::{BTreeMap, BTreeSet};

use corr_core::errors::{CorrError, ErrorInfo};
use corr_core::gvar::Gvar;
use corr_core::rng::RngHandle;
use rand::seq::index::sample;

/// One correlator: uncertain values indexed by time slice.
pub type Correlator = Vec<Gvar>;

/// Averaged correlators keyed by their dataset key.
pub type CorrelatorSet = BTreeMap<String, Correlator>;

/// Keyed collection of aligned correlator samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: BTreeMap<String, Vec<Vec<f64>>>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from keyed sample rows, validating alignment.
    pub fn from_rows(rows: BTreeMap<String, Vec<Vec<f64>>>) -> Result<Self, CorrError> {
        let mut dataset = Self::new();
        for (key, samples) in rows {
            dataset.insert(key, samples)?;
        }
        Ok(dataset)
    }

    /// Inserts sample rows under a key.
    ///
    /// Rows must be rectangular within the key and their count must match
    /// every key already present.
    pub fn insert(&mut self, key: impl Into<String>, samples: Vec<Vec<f64>>) -> Result<(), CorrError> {
        let key = key.into();
        if samples.is_empty() {
            return Err(CorrError::Data(
                ErrorInfo::new("empty-rows", "a key needs at least one sample row")
                    .with_context("key", key),
            ));
        }
        let length = samples[0].len();
        if length == 0 || samples.iter().any(|row| row.len() != length) {
            return Err(CorrError::Data(
                ErrorInfo::new("ragged-rows", "sample rows under a key must share one length")
                    .with_context("key", key),
            ));
        }
        if let Some(expected) = self.rows.values().map(Vec::len).next() {
            if samples.len() != expected {
                return Err(CorrError::Data(
                    ErrorInfo::new(
                        "misaligned-samples",
                        "every key must hold the same number of sample rows",
                    )
                    .with_context("key", key)
                    .with_context("expected", expected.to_string())
                    .with_context("found", samples.len().to_string()),
                ));
            }
        }
        self.rows.insert(key, samples);
        Ok(())
    }

    /// Iterates over the dataset keys in deterministic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset holds no keys.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of sample rows held under every key.
    pub fn nsamples(&self) -> usize {
        self.rows.values().map(Vec::len).next().unwrap_or(0)
    }

    /// Sample rows stored under a key.
    pub fn rows(&self, key: &str) -> Option<&[Vec<f64>]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Draws distinct row indices uniformly without replacement.
    pub fn draw_subset(&self, rng: &mut RngHandle, nsubset: usize) -> Result<Vec<usize>, CorrError> {
        let nsamples = self.nsamples();
        if nsubset == 0 {
            return Err(CorrError::Rng(ErrorInfo::new(
                "empty-subset",
                "subset size must be at least one",
            )));
        }
        if nsubset > nsamples {
            return Err(CorrError::Rng(
                ErrorInfo::new("subset-too-large", "subset size exceeds the available samples")
                    .with_context("nsubset", nsubset.to_string())
                    .with_context("nsamples", nsamples.to_string()),
            ));
        }
        let mut indices = sample(rng, nsamples, nsubset).into_vec();
        indices.sort_unstable();
        Ok(indices)
    }

    /// Correlated average of the selected rows under one key.
    pub fn average_rows(&self, key: &str, indices: &[usize]) -> Result<Correlator, CorrError> {
        let rows = self.rows.get(key).ok_or_else(|| {
            CorrError::Data(
                ErrorInfo::new("unknown-key", "key not present in dataset").with_context("key", key),
            )
        })?;
        let selected = select_rows(rows, indices, key)?;
        Gvar::from_samples(&selected)
    }

    /// Correlated averages of the selected rows for every key.
    pub fn subset_average(&self, indices: &[usize]) -> Result<CorrelatorSet, CorrError> {
        let mut averaged = CorrelatorSet::new();
        for key in self.rows.keys() {
            averaged.insert(key.clone(), self.average_rows(key, indices)?);
        }
        Ok(averaged)
    }

    /// Removes the given row indices from every key, preserving the order of
    /// the surviving rows.
    pub fn remove_rows(&mut self, indices: &[usize]) -> Result<(), CorrError> {
        let nsamples = self.nsamples();
        let removed: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(out_of_range) = removed.iter().find(|&&idx| idx >= nsamples) {
            return Err(CorrError::Data(
                ErrorInfo::new("row-out-of-range", "row index exceeds the available samples")
                    .with_context("index", out_of_range.to_string())
                    .with_context("nsamples", nsamples.to_string()),
            ));
        }
        for rows in self.rows.values_mut() {
            let mut index = 0;
            rows.retain(|_| {
                let keep = !removed.contains(&index);
                index += 1;
                keep
            });
        }
        Ok(())
    }
}

fn select_rows(rows: &[Vec<f64>], indices: &[usize], key: &str) -> Result<Vec<Vec<f64>>, CorrError> {
    indices
        .iter()
        .map(|&idx| {
            rows.get(idx).cloned().ok_or_else(|| {
                CorrError::Data(
                    ErrorInfo::new("row-out-of-range", "row index exceeds the available samples")
                        .with_context("key", key)
                        .with_context("index", idx.to_string()),
                )
            })
        })
        .collect()
}
