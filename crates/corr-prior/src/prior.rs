//! Insertion-ordered prior dictionary.
//!
//! The downstream fit consumes parameters in emission order, so entries are
//! kept in the order the builders produced them rather than sorted by name.

use std::fmt;

use corr_core::errors::{CorrError, ErrorInfo};
use corr_core::gvar::Gvar;
use log::debug;

/// A single prior entry: one parameter, a tower of exponential terms, or a
/// coupling matrix between towers.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorValue {
    /// One uncertain parameter.
    Scalar(Gvar),
    /// One entry per exponential-decay term.
    Series(Vec<Gvar>),
    /// Coupling terms between two towers, `nexp x nexp`.
    Matrix(Vec<Vec<Gvar>>),
}

/// Ordered mapping from parameter name to prior entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prior {
    entries: Vec<(String, PriorValue)>,
}

impl Prior {
    /// Creates an empty prior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fresh entry; re-inserting a name is an error.
    pub fn insert(&mut self, name: impl Into<String>, value: PriorValue) -> Result<(), CorrError> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(CorrError::Prior(
                ErrorInfo::new("duplicate-parameter", "parameter already present in prior")
                    .with_context("name", name),
            ));
        }
        self.entries.push((name, value));
        Ok(())
    }

    /// Looks up an entry by name.
    ///
    /// Names are matched as stored, with one convenience: a query for a
    /// `log...` parameter also finds its parenthesized form `log(...)`, so
    /// callers need not care whether the decorative bracketing pass ran.
    pub fn get(&self, name: &str) -> Option<&PriorValue> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    /// Mutable lookup with the same name matching as [`Prior::get`].
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PriorValue> {
        self.position(name).map(|idx| &mut self.entries[idx].1)
    }

    /// Whether an entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the prior holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriorValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Parameter names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Absorbs another fragment. Under normal key-naming discipline the
    /// fragments are disjoint; a colliding name is overwritten in place
    /// (a meson measured with several source/sink codes legitimately
    /// re-emits its energy parameters) and logged.
    pub fn merge(&mut self, fragment: Prior) {
        for (name, value) in fragment.entries {
            match self.position(&name) {
                Some(idx) => {
                    debug!("prior parameter {name} re-emitted - keeping the latest estimate");
                    self.entries[idx].1 = value;
                }
                None => self.entries.push((name, value)),
            }
        }
    }

    /// Decorative bracketing applied to the assembled dictionary before it
    /// is returned: `log<name>` becomes `log(<name>)`, the grouped-name
    /// convention expected by the fitting framework.
    pub fn parenthesized(mut self) -> Prior {
        for (name, _) in &mut self.entries {
            if let Some(inner) = name.strip_prefix("log") {
                if !inner.is_empty() && !inner.starts_with('(') {
                    *name = format!("log({inner})");
                }
            }
        }
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.entries.iter().position(|(stored, _)| stored == name) {
            return Some(idx);
        }
        name.strip_prefix("log")
            .filter(|inner| !inner.is_empty() && !inner.starts_with('('))
            .and_then(|inner| {
                let bracketed = format!("log({inner})");
                self.entries.iter().position(|(stored, _)| *stored == bracketed)
            })
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            match value {
                PriorValue::Scalar(scalar) => writeln!(f, "{name}: {scalar}")?,
                PriorValue::Series(series) => {
                    writeln!(f, "{name}: [{} terms]", series.len())?;
                }
                PriorValue::Matrix(matrix) => {
                    writeln!(f, "{name}: [{0} x {0} terms]", matrix.len())?;
                }
            }
        }
        Ok(())
    }
}
