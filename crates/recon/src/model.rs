use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::SourceReadError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Which of the two reconciled sources a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    A,
    B,
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "a"),
            Self::B => write!(f, "b"),
        }
    }
}

/// A single raw row as delivered by a record-source collaborator.
/// Values are strings, numbers, or null; never mutated after read.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub fields: BTreeMap<String, Value>,
}

impl RawRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// A finite point-in-time read of one source: its identifier field name
/// plus every row, in source order.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub id_field: String,
    pub rows: Vec<RawRecord>,
}

/// Pre-loaded input for one reconciliation run. A source that failed to
/// read arrives as the collaborator's error, unmodified.
pub struct ReconInput {
    pub source_a: Result<SourceSnapshot, SourceReadError>,
    pub source_b: Result<SourceSnapshot, SourceReadError>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Canonical comparable forms of one record's match + secondary fields.
/// `row` points back at the originating RawRecord in its snapshot.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub row: usize,
    pub id: String,
    pub canonical: BTreeMap<String, String>,
}

/// Blocking key: the normalized required match fields, in config order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatchKey(pub Vec<String>);

impl MatchKey {
    pub fn of(record: &NormalizedRecord, match_fields: &[String]) -> Self {
        MatchKey(
            match_fields
                .iter()
                .map(|f| record.canonical.get(f).cloned().unwrap_or_default())
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Candidate pairs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    NoMatch,
}

/// One compared (A, B) pair. Indexes are positions in the normalized
/// record vectors, not row numbers. NO_MATCH pairs are discarded as soon
/// as they are produced.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub a: usize,
    pub b: usize,
    pub matched_fields: Vec<String>,
    pub verdict: Verdict,
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Matched,
    OrphanA,
    OrphanB,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::OrphanA => write!(f, "orphan_a"),
            Self::OrphanB => write!(f, "orphan_b"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanReason {
    NoCandidate,
    NormalizationFailed,
    LostTiebreak,
}

impl std::fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCandidate => write!(f, "no_candidate"),
            Self::NormalizationFailed => write!(f, "normalization_failed"),
            Self::LostTiebreak => write!(f, "lost_tiebreak"),
        }
    }
}

/// `KeyOnly`: only the required match fields agreed.
/// `Corroborated`: at least one secondary field agreed as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    KeyOnly,
    Corroborated,
}

/// One line of the correspondence list. Owns copies of the identifying
/// fields so the report outlives the in-memory records.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationEntry {
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b_id: Option<String>,
    pub matched_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<OrphanReason>,
    pub fields: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_a: usize,
    pub total_b: usize,
    pub matched: usize,
    pub orphan_a: usize,
    pub orphan_b: usize,
}

impl ReconSummary {
    pub fn zero() -> Self {
        Self {
            total_a: 0,
            total_b: 0,
            matched: 0,
            orphan_a: 0,
            orphan_b: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
}

/// Set when a source snapshot could not be read; the run then carries
/// zero entries rather than a partial report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: SourceTag,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub entries: Vec<ReconciliationEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SourceFailure>,
}
