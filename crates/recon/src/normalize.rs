use serde::Deserialize;
use serde_json::Value;

use crate::config::ReconConfig;
use crate::error::{NormalizeError, NormalizeReason};
use crate::model::{NormalizedRecord, RawRecord, SourceSnapshot, SourceTag};

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Per-field canonicalization policy. The original comparison scripts did
/// ad hoc trim/lowercase at each call site; the modes make that explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Trim + lowercase, nothing else.
    ExactText,
    /// Trim + lowercase + strip characters outside `[a-z0-9 ]`, with
    /// interior whitespace runs collapsed.
    AlnumText,
    /// Lowercase + strip every non-alphanumeric character. Kept as a string
    /// so unit suffixes stay distinguishable ("12B" vs "12").
    NumericAsText,
}

/// Canonicalize one field value. Pure and idempotent.
pub fn normalize_value(raw: &str, mode: NormalizeMode) -> String {
    match mode {
        NormalizeMode::ExactText => raw.trim().to_lowercase(),
        NormalizeMode::AlnumText => {
            let lowered = raw.to_lowercase();
            let stripped: String = lowered
                .chars()
                .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
                .collect();
            stripped.split_whitespace().collect::<Vec<_>>().join(" ")
        }
        NormalizeMode::NumericAsText => raw
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Record normalization
// ---------------------------------------------------------------------------

/// A record excluded from matching; surfaces in the report as an orphan
/// with reason `normalization_failed`.
#[derive(Debug, Clone)]
pub struct NormalizeFailure {
    pub row: usize,
    /// Identifier if it was extractable; the report synthesizes one otherwise.
    pub id: Option<String>,
    pub error: NormalizeError,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
    pub records: Vec<NormalizedRecord>,
    pub failures: Vec<NormalizeFailure>,
}

/// Text form of a raw value. `Ok(None)` means the field is null.
fn value_text(value: &Value) -> Result<Option<String>, NormalizeReason> {
    match value {
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Null => Ok(None),
        _ => Err(NormalizeReason::WrongKind),
    }
}

/// Normalize one raw record. Required match fields must be present and
/// non-null; secondary fields degrade to the empty canonical value, which
/// never counts as agreement. `id_field` comes from the snapshot.
pub fn normalize_record(
    config: &ReconConfig,
    tag: SourceTag,
    id_field: &str,
    row: usize,
    raw: &RawRecord,
) -> Result<NormalizedRecord, NormalizeError> {
    let id = match raw.get(id_field) {
        None => {
            return Err(NormalizeError { field: id_field.into(), reason: NormalizeReason::Missing })
        }
        Some(v) => match value_text(v) {
            Ok(Some(text)) => text.trim().to_string(),
            Ok(None) => {
                return Err(NormalizeError { field: id_field.into(), reason: NormalizeReason::Null })
            }
            Err(reason) => return Err(NormalizeError { field: id_field.into(), reason }),
        },
    };

    let mut record = NormalizedRecord { row, id, canonical: Default::default() };

    for field in &config.match_fields {
        let column = config.column_for(tag, field);
        let text = match raw.get(column) {
            None => {
                return Err(NormalizeError { field: field.clone(), reason: NormalizeReason::Missing })
            }
            Some(v) => match value_text(v) {
                Ok(Some(text)) => text,
                Ok(None) => {
                    return Err(NormalizeError { field: field.clone(), reason: NormalizeReason::Null })
                }
                Err(reason) => return Err(NormalizeError { field: field.clone(), reason }),
            },
        };
        record
            .canonical
            .insert(field.clone(), normalize_value(&text, config.mode_for(field)));
    }

    for field in &config.secondary_fields {
        let column = config.column_for(tag, field);
        let canonical = match raw.get(column).map(value_text) {
            Some(Ok(Some(text))) => normalize_value(&text, config.mode_for(field)),
            // Missing, null, or unusable secondary values become the empty
            // canonical value rather than failing the record.
            _ => String::new(),
        };
        record.canonical.insert(field.clone(), canonical);
    }

    Ok(record)
}

/// Normalize a whole snapshot, splitting failures out per record.
pub fn normalize_snapshot(
    config: &ReconConfig,
    tag: SourceTag,
    snapshot: &SourceSnapshot,
) -> NormalizeOutput {
    let mut out = NormalizeOutput::default();
    for (row, raw) in snapshot.rows.iter().enumerate() {
        match normalize_record(config, tag, &snapshot.id_field, row, raw) {
            Ok(record) => out.records.push(record),
            Err(error) => {
                let id = raw
                    .get(&snapshot.id_field)
                    .and_then(|v| value_text(v).ok().flatten())
                    .map(|s| s.trim().to_string());
                out.failures.push(NormalizeFailure { row, id, error });
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
