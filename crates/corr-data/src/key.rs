//! Structured correlator keys and their grammar.
//!
//! Dataset keys encode physics metadata by naming convention: a 2-point
//! correlator is keyed `meson.ss` (meson label plus a source/sink letter
//! pair, e.g. `etac.ll` for a local-local eta_c correlator) and a 3-point
//! correlator is keyed `meson1.current.meson2_T{T}.ss` with `T` the
//! source/sink temporal separation. Keys are parsed once, up front, into
//! tagged values; nothing downstream re-probes the raw strings.

use std::fmt;

use corr_core::errors::{CorrError, ErrorInfo};
use serde::{Deserialize, Serialize};

const THREE_POINT_SHAPE: &str = "meson1.current.meson2_T{T}.ss";

/// Label data carried by a 2-point correlator key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPointKey {
    /// Meson label, e.g. `etac`.
    pub meson: String,
    /// Optional source/sink letter pair, e.g. `('l', 'l')`.
    pub source_sink: Option<(char, char)>,
}

impl TwoPointKey {
    /// Reads a 2-point key, falling back to "whole key is the meson label"
    /// when the `meson.ss` shape does not match.
    pub fn from_key(key: &str) -> Self {
        if let Some((meson, suffix)) = key.rsplit_once('.') {
            let letters: Vec<char> = suffix.chars().collect();
            if !meson.is_empty()
                && letters.len() == 2
                && letters.iter().all(|c| c.is_ascii_alphabetic())
            {
                return Self {
                    meson: meson.to_string(),
                    source_sink: Some((letters[0], letters[1])),
                };
            }
        }
        Self {
            meson: key.to_string(),
            source_sink: None,
        }
    }

    /// Source label used in prior parameter names (empty when absent).
    pub fn source_label(&self) -> String {
        self.source_sink
            .map(|(source, _)| source.to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for TwoPointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_sink {
            Some((source, sink)) => write!(f, "{}.{}{}", self.meson, source, sink),
            None => write!(f, "{}", self.meson),
        }
    }
}

/// Label data carried by a 3-point correlator key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreePointKey {
    /// Meson on the source side of the current insertion.
    pub meson1: String,
    /// Current label, e.g. `V` or `S`.
    pub current: String,
    /// Meson on the sink side of the current insertion.
    pub meson2: String,
    /// Source/sink temporal separation `T`.
    pub separation: usize,
    /// Optional source/sink letter pair.
    pub source_sink: Option<(char, char)>,
}

impl ThreePointKey {
    /// Parses a 3-point key against the required shape for a known current.
    ///
    /// Malformed keys are an error: the caller routed this key here because
    /// a registered current matched, so a shape mismatch means the dataset
    /// itself needs fixing, not silent reinterpretation.
    pub fn parse(key: &str, current: &str) -> Result<Self, CorrError> {
        let malformed = |message: &str| {
            CorrError::Key(
                ErrorInfo::new("malformed-3pt-key", message)
                    .with_context("key", key)
                    .with_context("current", current)
                    .with_context("expected", THREE_POINT_SHAPE)
                    .with_hint("3-point keys must look like D.V.pi_T15.ll"),
            )
        };

        let (body, source_sink) = split_source_sink(key);

        let t_index = body
            .rfind("_T")
            .ok_or_else(|| malformed("no _T{T} separation marker in key"))?;
        let digits = &body[t_index + 2..];
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("separation must be a 1-2 digit integer"));
        }
        let separation: usize = digits
            .parse()
            .map_err(|_| malformed("separation must be a 1-2 digit integer"))?;

        let tag = &body[..t_index];
        let needle = format!(".{current}.");
        let current_index = tag
            .find(&needle)
            .ok_or_else(|| malformed("current label not found between meson labels"))?;
        let meson1 = &tag[..current_index];
        let meson2 = &tag[current_index + needle.len()..];
        if meson1.is_empty() || meson2.is_empty() {
            return Err(malformed("meson labels on both sides of the current are required"));
        }

        Ok(Self {
            meson1: meson1.to_string(),
            current: current.to_string(),
            meson2: meson2.to_string(),
            separation,
            source_sink,
        })
    }

    /// Tag naming the transition, `meson1.current.meson2`.
    pub fn tag(&self) -> String {
        format!("{}.{}.{}", self.meson1, self.current, self.meson2)
    }

    /// Dataset key of the companion 2-point correlator for one of the mesons.
    ///
    /// Companion keys double the sink label: `D.V.pi_T15.ls` looks up
    /// `D.ss` and `pi.ss`. Keys without a letter pair use the bare meson.
    pub fn companion_key(&self, meson: &str) -> String {
        match self.source_sink {
            Some((_, sink)) => format!("{meson}.{sink}{sink}"),
            None => meson.to_string(),
        }
    }
}

impl fmt::Display for ThreePointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}_T{}",
            self.meson1, self.current, self.meson2, self.separation
        )?;
        if let Some((source, sink)) = self.source_sink {
            write!(f, ".{source}{sink}")?;
        }
        Ok(())
    }
}

/// A fully classified correlator key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelatorKey {
    /// 2-point correlator key.
    TwoPoint(TwoPointKey),
    /// 3-point correlator key.
    ThreePoint(ThreePointKey),
}

impl CorrelatorKey {
    /// Parses a key, using the registered current list to decide its class.
    pub fn parse(key: &str, currents: &[String]) -> Result<Self, CorrError> {
        match classify(key, currents) {
            KeyClass::ThreePoint(current) => {
                Ok(Self::ThreePoint(ThreePointKey::parse(key, &current)?))
            }
            KeyClass::TwoPoint => Ok(Self::TwoPoint(TwoPointKey::from_key(key))),
        }
    }
}

impl fmt::Display for CorrelatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelatorKey::TwoPoint(key) => key.fmt(f),
            CorrelatorKey::ThreePoint(key) => key.fmt(f),
        }
    }
}

/// Outcome of classifying a key against the registered current list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyClass {
    /// The key names a 3-point correlator for the given current.
    ThreePoint(String),
    /// The key names a 2-point correlator.
    TwoPoint,
}

/// Classifies a key: the first registered current found as a substring tags
/// it as 3-point, otherwise it is treated as 2-point.
pub fn classify(key: &str, currents: &[String]) -> KeyClass {
    for current in currents {
        if !current.is_empty() && key.contains(current.as_str()) {
            return KeyClass::ThreePoint(current.clone());
        }
    }
    KeyClass::TwoPoint
}

fn split_source_sink(key: &str) -> (&str, Option<(char, char)>) {
    if let Some((body, suffix)) = key.rsplit_once('.') {
        let letters: Vec<char> = suffix.chars().collect();
        if !body.is_empty() && letters.len() == 2 && letters.iter().all(|c| c.is_ascii_alphabetic())
        {
            return (body, Some((letters[0], letters[1])));
        }
    }
    (key, None)
}
