use std::collections::{BTreeMap, VecDeque};

use crate::model::{CandidatePair, NormalizedRecord, OrphanReason};

/// Final per-record states after conflict resolution.
#[derive(Debug, Default)]
pub struct Resolution {
    pub matches: Vec<ResolvedMatch>,
    pub orphan_a: Vec<(usize, OrphanReason)>,
    pub orphan_b: Vec<(usize, OrphanReason)>,
}

#[derive(Debug, Clone)]
pub struct ResolvedMatch {
    pub a: usize,
    pub b: usize,
    pub matched_fields: Vec<String>,
}

/// Reduce MATCH candidates to at most one accepted match per A record, with
/// at most one claimant per B record (the mapping is injective into B).
///
/// Tie-break when an A record has several candidates: larger matched-field
/// set first, then lexicographically smallest B identifier. When two A
/// records claim the same B record the same rule runs between the claimants
/// (then smallest A identifier); a displaced claimant falls back to its
/// next-best candidate before being orphaned. Preference orders are strict,
/// so the outcome does not depend on input or processing order. This stage
/// never errors; every indeterminate case lands in a defined orphan state.
pub fn resolve(
    candidates: &[CandidatePair],
    a_records: &[NormalizedRecord],
    b_records: &[NormalizedRecord],
) -> Resolution {
    // Candidates per A record, best first.
    let mut per_a: Vec<Vec<&CandidatePair>> = vec![Vec::new(); a_records.len()];
    let mut b_had_candidate = vec![false; b_records.len()];
    for pair in candidates {
        per_a[pair.a].push(pair);
        b_had_candidate[pair.b] = true;
    }
    for list in &mut per_a {
        list.sort_by(|x, y| {
            y.matched_fields
                .len()
                .cmp(&x.matched_fields.len())
                .then_with(|| b_records[x.b].id.cmp(&b_records[y.b].id))
        });
    }

    // Claim loop: each unresolved A record proposes to its next-best B
    // record; a contested B record keeps the stronger claimant and the
    // displaced one re-enters the queue at its following candidate.
    let mut claim: BTreeMap<usize, &CandidatePair> = BTreeMap::new();
    let mut cursor = vec![0usize; a_records.len()];
    let mut exhausted: Vec<usize> = Vec::new();

    let mut queue: VecDeque<usize> = {
        let mut order: Vec<usize> = (0..a_records.len()).collect();
        order.sort_by(|&x, &y| a_records[x].id.cmp(&a_records[y].id));
        order.into()
    };

    while let Some(a) = queue.pop_front() {
        let mut placed = false;
        while cursor[a] < per_a[a].len() {
            let pair = per_a[a][cursor[a]];
            cursor[a] += 1;

            match claim.get(&pair.b) {
                None => {
                    claim.insert(pair.b, pair);
                    placed = true;
                    break;
                }
                Some(incumbent) => {
                    let challenger_wins = pair
                        .matched_fields
                        .len()
                        .cmp(&incumbent.matched_fields.len())
                        .then_with(|| a_records[incumbent.a].id.cmp(&a_records[pair.a].id))
                        .is_gt();
                    if challenger_wins {
                        let displaced = claim.insert(pair.b, pair).map(|p| p.a);
                        if let Some(loser) = displaced {
                            queue.push_back(loser);
                        }
                        placed = true;
                        break;
                    }
                }
            }
        }
        if !placed {
            exhausted.push(a);
        }
    }

    let mut resolution = Resolution::default();
    for pair in claim.values() {
        resolution.matches.push(ResolvedMatch {
            a: pair.a,
            b: pair.b,
            matched_fields: pair.matched_fields.clone(),
        });
    }
    for a in exhausted {
        let reason =
            if per_a[a].is_empty() { OrphanReason::NoCandidate } else { OrphanReason::LostTiebreak };
        resolution.orphan_a.push((a, reason));
    }
    for b in 0..b_records.len() {
        if !claim.contains_key(&b) {
            let reason = if b_had_candidate[b] {
                OrphanReason::LostTiebreak
            } else {
                OrphanReason::NoCandidate
            };
            resolution.orphan_b.push((b, reason));
        }
    }
    resolution
}
