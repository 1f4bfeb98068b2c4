//! Error type returned by the sampler, its settings loader and its writers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and offending values behind a [`DmcError`].
///
/// `code` is a short kebab-case tag (`non-positive-beta`, `range-step`, ...)
/// that tests and callers can match on without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case tag identifying the failure.
    pub code: String,
    /// What went wrong.
    pub message: String,
    /// Offending parameters keyed by name.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested fix, if there is an obvious one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload without context or hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records the value of an offending parameter.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a suggested fix.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Renders as `code: message [key=value, ...] (hint: ...)`.
impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        let mut entries = self.context.iter();
        if let Some((key, value)) = entries.next() {
            write!(f, " [{key}={value}")?;
            for (key, value) in entries {
                write!(f, ", {key}={value}")?;
            }
            f.write_str("]")?;
        }
        match &self.hint {
            Some(hint) => write!(f, " (hint: {hint})"),
            None => Ok(()),
        }
    }
}

/// Every failure the DMC crates report, grouped by where it originates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum DmcError {
    /// Diagram parameters or vertex lists that violate the model invariants.
    #[error("invalid parameter: {0}")]
    InvalidParameter(ErrorInfo),
    /// A run finished without collecting a single post-thermalization sample.
    #[error("no measurements: {0}")]
    NoMeasurements(ErrorInfo),
    /// Settings file schema and range errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// File-system and report writer errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
}

impl DmcError {
    /// Payload shared by every family.
    pub fn info(&self) -> &ErrorInfo {
        let (DmcError::InvalidParameter(info)
        | DmcError::NoMeasurements(info)
        | DmcError::Config(info)
        | DmcError::Io(info)) = self;
        info
    }

    /// Shorthand for `self.info().code`.
    pub fn code(&self) -> &str {
        &self.info().code
    }
}
