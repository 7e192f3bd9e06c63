//! Structured error types shared across the CorrBayes crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CorrError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (correlator keys, window bounds, sizes).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller repair the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the CorrBayes pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CorrError {
    /// Dataset shape and alignment errors.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Correlator key grammar errors.
    #[error("key error: {0}")]
    Key(ErrorInfo),
    /// Prior construction errors.
    #[error("prior error: {0}")]
    Prior(ErrorInfo),
    /// Randomness and seeding errors.
    #[error("rng error: {0}")]
    Rng(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl CorrError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CorrError::Data(info)
            | CorrError::Key(info)
            | CorrError::Prior(info)
            | CorrError::Rng(info) => info,
        }
    }

    /// Returns a copy of the error with one more context entry attached.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let attach = |info: ErrorInfo| info.with_context(key, value);
        match self {
            CorrError::Data(info) => CorrError::Data(attach(info)),
            CorrError::Key(info) => CorrError::Key(attach(info)),
            CorrError::Prior(info) => CorrError::Prior(attach(info)),
            CorrError::Rng(info) => CorrError::Rng(attach(info)),
        }
    }
}
