use crate::config::ReconConfig;
use crate::model::{
    Confidence, EntryKind, NormalizedRecord, OrphanReason, ReconSummary, ReconciliationEntry,
    SourceTag,
};
use crate::normalize::{NormalizeFailure, NormalizeOutput};
use crate::resolve::Resolution;

/// Assemble the correspondence list and summary counts.
///
/// Entry order is deterministic: matched entries by A identifier, then A
/// orphans by identifier, then B orphans by identifier. Every input record
/// appears exactly once. No I/O here; serialization is the caller's job.
pub fn build_report(
    config: &ReconConfig,
    a: &NormalizeOutput,
    b: &NormalizeOutput,
    resolution: &Resolution,
) -> (Vec<ReconciliationEntry>, ReconSummary) {
    let mut entries = Vec::new();

    let mut matched: Vec<ReconciliationEntry> = resolution
        .matches
        .iter()
        .map(|m| {
            let rec_a = &a.records[m.a];
            let rec_b = &b.records[m.b];
            let confidence = if m.matched_fields.len() > config.match_fields.len() {
                Confidence::Corroborated
            } else {
                Confidence::KeyOnly
            };
            ReconciliationEntry {
                kind: EntryKind::Matched,
                a_id: Some(rec_a.id.clone()),
                b_id: Some(rec_b.id.clone()),
                matched_fields: m.matched_fields.clone(),
                confidence: Some(confidence),
                reason: None,
                fields: rec_a.canonical.clone(),
            }
        })
        .collect();
    matched.sort_by(|x, y| x.a_id.cmp(&y.a_id));
    entries.extend(matched);

    entries.extend(orphan_entries(SourceTag::A, &a.records, &resolution.orphan_a, &a.failures));
    entries.extend(orphan_entries(SourceTag::B, &b.records, &resolution.orphan_b, &b.failures));

    let summary = ReconSummary {
        total_a: a.records.len() + a.failures.len(),
        total_b: b.records.len() + b.failures.len(),
        matched: resolution.matches.len(),
        orphan_a: resolution.orphan_a.len() + a.failures.len(),
        orphan_b: resolution.orphan_b.len() + b.failures.len(),
    };

    (entries, summary)
}

fn orphan_entries(
    tag: SourceTag,
    records: &[NormalizedRecord],
    unmatched: &[(usize, OrphanReason)],
    failures: &[NormalizeFailure],
) -> Vec<ReconciliationEntry> {
    let kind = match tag {
        SourceTag::A => EntryKind::OrphanA,
        SourceTag::B => EntryKind::OrphanB,
    };

    let mut entries: Vec<ReconciliationEntry> = Vec::with_capacity(unmatched.len() + failures.len());
    for &(index, reason) in unmatched {
        let record = &records[index];
        entries.push(entry(kind, tag, record.id.clone(), reason, record.canonical.clone()));
    }
    for failure in failures {
        let id = failure.id.clone().unwrap_or_else(|| format!("{tag}:row{}", failure.row));
        entries.push(entry(kind, tag, id, OrphanReason::NormalizationFailed, Default::default()));
    }
    entries.sort_by(|x, y| orphan_id(x).cmp(&orphan_id(y)));
    entries
}

fn entry(
    kind: EntryKind,
    tag: SourceTag,
    id: String,
    reason: OrphanReason,
    fields: std::collections::BTreeMap<String, String>,
) -> ReconciliationEntry {
    let (a_id, b_id) = match tag {
        SourceTag::A => (Some(id), None),
        SourceTag::B => (None, Some(id)),
    };
    ReconciliationEntry {
        kind,
        a_id,
        b_id,
        matched_fields: Vec::new(),
        confidence: None,
        reason: Some(reason),
        fields,
    }
}

fn orphan_id(entry: &ReconciliationEntry) -> &Option<String> {
    if entry.a_id.is_some() {
        &entry.a_id
    } else {
        &entry.b_id
    }
}
