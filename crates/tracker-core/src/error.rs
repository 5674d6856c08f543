use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Document-level and pipeline errors produced by the cost tracker.
///
/// These abort the current load or period selection. Per-record problems are
/// reported through [`RecordError`] and [`Diagnostic`] instead.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The usage export could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The uploaded bytes are not a well-formed JSON document.
    #[error("Invalid JSON file: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// The document exceeds the configured size cap.
    #[error("Document is {size} bytes, larger than the {limit} byte limit")]
    DocumentTooLarge { size: usize, limit: usize },

    /// A period was selected that matches no records in a non-empty load.
    #[error("No data available for {0}.")]
    NoDataForPeriod(String),

    /// A period label is not of the form `YYYY-MM`.
    #[error("Invalid period: {0} (expected YYYY-MM)")]
    UnknownPeriod(String),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the tracker crates.
pub type Result<T> = std::result::Result<T, TrackerError>;

// ── Record-level failures ─────────────────────────────────────────────────────

/// Why a single raw record was rejected during normalization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Missing key in record: '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid timestamp '{value}' (expected YYYY-MM-DDTHH:MM:SS.ffffff)")]
    InvalidTimestamp { value: String },

    #[error("Invalid numeric value for '{field}': {value}")]
    InvalidNumeric { field: &'static str, value: String },

    #[error("Expected a record object, got {found}")]
    MalformedRecord { found: &'static str },

    #[error("Expected {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

impl RecordError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            RecordError::MissingField { .. } => DiagnosticKind::MissingField,
            RecordError::InvalidTimestamp { .. } => DiagnosticKind::InvalidTimestamp,
            RecordError::InvalidNumeric { .. } => DiagnosticKind::InvalidNumeric,
            RecordError::MalformedRecord { .. } => DiagnosticKind::MalformedRecord,
            RecordError::UnexpectedShape { .. } => DiagnosticKind::UnexpectedShape,
        }
    }

    /// The record key the failure refers to, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            RecordError::MissingField { field } | RecordError::InvalidNumeric { field, .. } => {
                Some(field)
            }
            RecordError::InvalidTimestamp { .. } => Some("timestamp"),
            _ => None,
        }
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// Category of a non-fatal problem found while normalizing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    MissingField,
    InvalidTimestamp,
    InvalidNumeric,
    /// An array element that is not a JSON object.
    MalformedRecord,
    /// A keyed-by-user value that is not an array, or a root that is neither
    /// an object nor an array.
    UnexpectedShape,
    /// Every record was dropped (or there were none).
    NoValidData,
}

impl DiagnosticKind {
    /// `true` for kinds rendered as warnings rather than errors.
    pub fn is_warning(self) -> bool {
        matches!(self, DiagnosticKind::NoValidData)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingField => "MissingField",
            DiagnosticKind::InvalidTimestamp => "InvalidTimestamp",
            DiagnosticKind::InvalidNumeric => "InvalidNumeric",
            DiagnosticKind::MalformedRecord => "MalformedRecord",
            DiagnosticKind::UnexpectedShape => "UnexpectedShape",
            DiagnosticKind::NoValidData => "NoValidData",
        };
        f.write_str(name)
    }
}

/// Where in the input document a diagnostic originated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RecordLocation {
    /// Record `index` in the list under a user key.
    Keyed { user: String, index: usize },
    /// Record `index` in a flat top-level list.
    Flat { index: usize },
    /// The value stored under a user key as a whole.
    KeyedEntry { user: String },
    /// The document as a whole.
    Document,
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordLocation::Keyed { user, index } => write!(f, "{user}[{index}]"),
            RecordLocation::Flat { index } => write!(f, "[{index}]"),
            RecordLocation::KeyedEntry { user } => write!(f, "{user}"),
            RecordLocation::Document => f.write_str("document"),
        }
    }
}

/// A non-fatal, user-facing description of one skipped record or a
/// document-level issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub field: Option<String>,
    pub location: RecordLocation,
    pub message: String,
}

impl Diagnostic {
    pub fn from_record_error(error: &RecordError, location: RecordLocation) -> Self {
        Self {
            kind: error.kind(),
            field: error.field().map(str::to_string),
            location,
            message: error.to_string(),
        }
    }

    pub fn no_valid_data() -> Self {
        Self {
            kind: DiagnosticKind::NoValidData,
            field: None,
            location: RecordLocation::Document,
            message: "No valid data found to process.".to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.location, self.message)
    }
}
