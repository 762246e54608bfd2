use std::fmt;

/// Run-level errors. Record-level normalization failures are not here —
/// they are recovered locally as orphan entries (see `NormalizeError`).
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty match fields, bad column reference, etc.).
    ConfigValidation(String),
    /// IO error (CSV read, file read).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Error reported by a record-source collaborator, carried unmodified.
/// The run produces zero entries with a failure marker, never partial output.
#[derive(Debug, Clone)]
pub struct SourceReadError {
    pub message: String,
}

impl fmt::Display for SourceReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source read error: {}", self.message)
    }
}

impl std::error::Error for SourceReadError {}

/// A single record could not be canonicalized. Isolated to that record:
/// it is excluded from matching and reported as an orphan with reason
/// `normalization_failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeError {
    pub field: String,
    pub reason: NormalizeReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeReason {
    Missing,
    Null,
    WrongKind,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.reason {
            NormalizeReason::Missing => "missing",
            NormalizeReason::Null => "null",
            NormalizeReason::WrongKind => "not a string or number",
        };
        write!(f, "field '{}' is {what}", self.field)
    }
}

impl std::error::Error for NormalizeError {}
