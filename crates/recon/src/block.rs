use std::collections::BTreeMap;

use crate::model::{MatchKey, NormalizedRecord};

/// Records of one source grouped by blocking key. `fallback` holds records
/// from blocks that exceeded the cap; they are excluded from keyed matching
/// and compared directly instead, so a degenerate key collision can neither
/// mass-match nor blow up cost.
#[derive(Debug, Default)]
pub struct BlockIndex {
    pub blocks: BTreeMap<MatchKey, Vec<usize>>,
    pub fallback: Vec<usize>,
}

impl BlockIndex {
    /// Build the keyed index over normalized records. Indexes are positions
    /// in `records`; block membership preserves input order.
    pub fn build(records: &[NormalizedRecord], match_fields: &[String], block_cap: usize) -> Self {
        let mut blocks: BTreeMap<MatchKey, Vec<usize>> = BTreeMap::new();
        for (i, record) in records.iter().enumerate() {
            blocks.entry(MatchKey::of(record, match_fields)).or_default().push(i);
        }

        let mut fallback = Vec::new();
        blocks.retain(|_, members| {
            if members.len() > block_cap {
                fallback.extend(members.iter().copied());
                false
            } else {
                true
            }
        });
        fallback.sort_unstable();

        BlockIndex { blocks, fallback }
    }

    pub fn is_fallback(&self, index: usize) -> bool {
        self.fallback.binary_search(&index).is_ok()
    }
}
