use crate::block::BlockIndex;
use crate::config::ReconConfig;
use crate::model::{CandidatePair, NormalizedRecord, Verdict};

/// Apply the match predicate to one (A, B) pair.
///
/// MATCH iff every required match field is equal and non-empty after
/// normalization; empty-vs-empty never counts as agreement. Agreeing
/// non-empty secondary fields are recorded but not required.
pub fn compare(
    a_index: usize,
    b_index: usize,
    a: &NormalizedRecord,
    b: &NormalizedRecord,
    config: &ReconConfig,
) -> CandidatePair {
    let empty = String::new();
    for field in &config.match_fields {
        let va = a.canonical.get(field).unwrap_or(&empty);
        let vb = b.canonical.get(field).unwrap_or(&empty);
        if va.is_empty() || va != vb {
            return CandidatePair {
                a: a_index,
                b: b_index,
                matched_fields: Vec::new(),
                verdict: Verdict::NoMatch,
            };
        }
    }

    let mut matched_fields = config.match_fields.clone();
    for field in &config.secondary_fields {
        let va = a.canonical.get(field).unwrap_or(&empty);
        let vb = b.canonical.get(field).unwrap_or(&empty);
        if !va.is_empty() && va == vb {
            matched_fields.push(field.clone());
        }
    }
    matched_fields.sort_unstable();

    CandidatePair { a: a_index, b: b_index, matched_fields, verdict: Verdict::Match }
}

/// Compare blocks shared by both indexes, then run the direct fallback pass
/// for records whose blocks were over the cap. Emits MATCH pairs only;
/// NO_MATCH pairs are dropped on the spot to bound memory.
pub fn match_candidates(
    a_records: &[NormalizedRecord],
    b_records: &[NormalizedRecord],
    a_blocks: &BlockIndex,
    b_blocks: &BlockIndex,
    config: &ReconConfig,
) -> Vec<CandidatePair> {
    let mut candidates = Vec::new();
    let mut push = |pair: CandidatePair| {
        if pair.verdict == Verdict::Match {
            candidates.push(pair);
        }
    };

    // Keyed pass. BTreeMap iteration keeps this independent of input order.
    for (key, a_members) in &a_blocks.blocks {
        if let Some(b_members) = b_blocks.blocks.get(key) {
            for &ai in a_members {
                for &bi in b_members {
                    push(compare(ai, bi, &a_records[ai], &b_records[bi], config));
                }
            }
        }
    }

    // Fallback pass: unreliable-block records against the whole other side.
    for &ai in &a_blocks.fallback {
        for (bi, b) in b_records.iter().enumerate() {
            push(compare(ai, bi, &a_records[ai], b, config));
        }
    }
    for &bi in &b_blocks.fallback {
        for (ai, a) in a_records.iter().enumerate() {
            if a_blocks.is_fallback(ai) {
                continue; // already compared above
            }
            push(compare(ai, bi, a, &b_records[bi], config));
        }
    }

    candidates
}
