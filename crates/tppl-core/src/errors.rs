//! Structured error types shared across the TreePPL bridge crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic payload carried by every [`TpplError`].
///
/// `code` is a stable kebab-case identifier (`unknown-tag`,
/// `matrix-shape-mismatch`, `json-parse`, ...) that tests and callers match on;
/// `message` is for humans only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code.
    pub code: String,
    /// Diagnostic message.
    pub message: String,
    /// Offending tag, field, shape, sample index or raw-output preview.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// What the caller can do about it, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records one diagnostic detail, replacing an earlier value for `key`.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Looks up one diagnostic detail.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

// Renders as `message [code] (key=value, ...); hint: ...`.
impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        let mut details = self.context.iter();
        if let Some((key, value)) = details.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in details {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "; hint: {hint}")?;
        }
        Ok(())
    }
}

/// Discriminant of a [`TpplError`], for callers that branch on the kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`TpplError::UnknownTag`].
    UnknownTag,
    /// See [`TpplError::DuplicateTag`].
    DuplicateTag,
    /// See [`TpplError::Shape`].
    Shape,
    /// See [`TpplError::MalformedOutput`].
    MalformedOutput,
    /// See [`TpplError::DegenerateWeights`].
    DegenerateWeights,
    /// See [`TpplError::UnsupportedSampleType`].
    UnsupportedSampleType,
    /// See [`TpplError::InvalidField`].
    InvalidField,
    /// See [`TpplError::Config`].
    Config,
    /// See [`TpplError::Runtime`].
    Runtime,
}

/// Canonical error type for the TreePPL bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum TpplError {
    /// A wire discriminant names a tag with no registered constructor.
    #[error("unknown tag: {0}")]
    UnknownTag(ErrorInfo),
    /// Two different constructors were registered under one tag.
    #[error("duplicate tag: {0}")]
    DuplicateTag(ErrorInfo),
    /// Matrix payload whose data length disagrees with its declared shape.
    #[error("shape error: {0}")]
    Shape(ErrorInfo),
    /// Runtime output that is not a well-formed result document.
    #[error("malformed output: {0}")]
    MalformedOutput(ErrorInfo),
    /// Weighted draw over an empty or all-zero weight vector.
    #[error("degenerate weights: {0}")]
    DegenerateWeights(ErrorInfo),
    /// Sample values that a numeric summary cannot handle.
    #[error("unsupported sample type: {0}")]
    UnsupportedSampleType(ErrorInfo),
    /// Reserved, missing, unexpected or mistyped fields.
    #[error("invalid field: {0}")]
    InvalidField(ErrorInfo),
    /// Configuration loading and validation errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Failure reported by the external runtime collaborator.
    #[error("runtime error: {0}")]
    Runtime(ErrorInfo),
}

impl TpplError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            TpplError::UnknownTag(info)
            | TpplError::DuplicateTag(info)
            | TpplError::Shape(info)
            | TpplError::MalformedOutput(info)
            | TpplError::DegenerateWeights(info)
            | TpplError::UnsupportedSampleType(info)
            | TpplError::InvalidField(info)
            | TpplError::Config(info)
            | TpplError::Runtime(info) => info,
        }
    }

    /// Returns the kind of the error without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TpplError::UnknownTag(_) => ErrorKind::UnknownTag,
            TpplError::DuplicateTag(_) => ErrorKind::DuplicateTag,
            TpplError::Shape(_) => ErrorKind::Shape,
            TpplError::MalformedOutput(_) => ErrorKind::MalformedOutput,
            TpplError::DegenerateWeights(_) => ErrorKind::DegenerateWeights,
            TpplError::UnsupportedSampleType(_) => ErrorKind::UnsupportedSampleType,
            TpplError::InvalidField(_) => ErrorKind::InvalidField,
            TpplError::Config(_) => ErrorKind::Config,
            TpplError::Runtime(_) => ErrorKind::Runtime,
        }
    }
}

/// Builds a lossy UTF-8 preview of raw bytes truncated to `limit` bytes.
pub fn byte_preview(bytes: &[u8], limit: usize) -> String {
    let end = bytes.len().min(limit);
    let mut preview = String::from_utf8_lossy(&bytes[..end]).into_owned();
    if bytes.len() > limit {
        preview.push_str("...");
    }
    preview
}
