use crate::block::BlockIndex;
use crate::config::ReconConfig;
use crate::error::{ReconError, SourceReadError};
use crate::matcher::match_candidates;
use crate::model::{ReconInput, ReconMeta, ReconResult, ReconSummary, SourceFailure, SourceTag};
use crate::normalize::normalize_snapshot;
use crate::report::build_report;
use crate::resolve::resolve;

/// Run one reconciliation pass: normalize both snapshots, block, match,
/// resolve conflicts, build the report. Synchronous and single-pass; all
/// intermediate structures are scoped to this call.
///
/// A failed source read yields a result with zero entries and `failure`
/// set — never a partial report. Config problems abort before any record
/// is touched.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    config.validate()?;

    let meta = ReconMeta {
        config_name: config.name.clone(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let snapshot_a = match &input.source_a {
        Ok(snapshot) => snapshot,
        Err(e) => return Ok(failed(meta, SourceTag::A, e)),
    };
    let snapshot_b = match &input.source_b {
        Ok(snapshot) => snapshot,
        Err(e) => return Ok(failed(meta, SourceTag::B, e)),
    };
    for (tag, snapshot) in [(SourceTag::A, snapshot_a), (SourceTag::B, snapshot_b)] {
        if snapshot.id_field.is_empty() {
            return Err(ReconError::ConfigValidation(format!(
                "source {tag}: id_field must not be empty"
            )));
        }
    }

    let a = normalize_snapshot(config, SourceTag::A, snapshot_a);
    let b = normalize_snapshot(config, SourceTag::B, snapshot_b);

    let a_blocks = BlockIndex::build(&a.records, &config.match_fields, config.block_cap);
    let b_blocks = BlockIndex::build(&b.records, &config.match_fields, config.block_cap);

    let candidates = match_candidates(&a.records, &b.records, &a_blocks, &b_blocks, config);
    let resolution = resolve(&candidates, &a.records, &b.records);
    let (entries, summary) = build_report(config, &a, &b, &resolution);

    Ok(ReconResult { meta, summary, entries, failure: None })
}

fn failed(meta: ReconMeta, source: SourceTag, error: &SourceReadError) -> ReconResult {
    ReconResult {
        meta,
        summary: ReconSummary::zero(),
        entries: Vec::new(),
        failure: Some(SourceFailure { source, message: error.message.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Confidence, EntryKind, OrphanReason, RawRecord, SourceSnapshot,
    };
    use serde_json::{json, Value};

    fn config() -> ReconConfig {
        ReconConfig::from_toml(
            r#"
name = "properties vs villa_terraza"
match_fields = ["street_number", "street"]
secondary_fields = ["city", "unit"]

[fields.street_number]
mode = "numeric_as_text"
"#,
        )
        .unwrap()
    }

    fn raw(pairs: &[(&str, Value)]) -> RawRecord {
        RawRecord {
            fields: pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        }
    }

    fn input(a_rows: Vec<RawRecord>, b_rows: Vec<RawRecord>) -> ReconInput {
        ReconInput {
            source_a: Ok(SourceSnapshot { id_field: "id".into(), rows: a_rows }),
            source_b: Ok(SourceSnapshot { id_field: "key".into(), rows: b_rows }),
        }
    }

    #[test]
    fn case_and_whitespace_noise_still_matches() {
        let input = input(
            vec![raw(&[("id", json!(1)), ("street_number", json!("123")), ("street", json!("Main St"))])],
            vec![raw(&[("key", json!("k1")), ("street_number", json!("123")), ("street", json!("main st"))])],
        );
        let result = run(&config(), &input).unwrap();
        assert_eq!(result.summary.matched, 1);
        assert_eq!(result.summary.orphan_a + result.summary.orphan_b, 0);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].a_id.as_deref(), Some("1"));
        assert_eq!(result.entries[0].b_id.as_deref(), Some("k1"));
    }

    #[test]
    fn unit_suffix_keeps_records_apart() {
        let input = input(
            vec![raw(&[("id", json!(1)), ("street_number", json!("12B")), ("street", json!("Oak"))])],
            vec![raw(&[("key", json!("k1")), ("street_number", json!("12")), ("street", json!("Oak"))])],
        );
        let result = run(&config(), &input).unwrap();
        assert_eq!(result.summary.matched, 0);
        assert_eq!(result.summary.orphan_a, 1);
        assert_eq!(result.summary.orphan_b, 1);
        assert_eq!(result.entries.len(), 2);
    }

    #[test]
    fn contested_match_goes_to_corroborated_claimant() {
        let input = input(
            vec![
                raw(&[
                    ("id", json!(1)),
                    ("street_number", json!("5")),
                    ("street", json!("Elm")),
                    ("city", json!("Tustin")),
                ]),
                raw(&[
                    ("id", json!(2)),
                    ("street_number", json!("5")),
                    ("street", json!("Elm")),
                    ("city", json!("Laguna Woods")),
                ]),
            ],
            vec![raw(&[
                ("key", json!("k1")),
                ("street_number", json!("5")),
                ("street", json!("Elm")),
                ("city", json!("Laguna Woods")),
            ])],
        );
        let result = run(&config(), &input).unwrap();
        assert_eq!(result.summary.matched, 1);
        assert_eq!(result.entries[0].a_id.as_deref(), Some("2"));
        assert_eq!(result.entries[0].confidence, Some(Confidence::Corroborated));

        let orphan = &result.entries[1];
        assert_eq!(orphan.kind, EntryKind::OrphanA);
        assert_eq!(orphan.a_id.as_deref(), Some("1"));
        assert_eq!(orphan.reason, Some(OrphanReason::LostTiebreak));
    }

    #[test]
    fn null_street_orphans_record_and_run_continues() {
        let input = input(
            vec![
                raw(&[("id", json!(1)), ("street_number", json!("9")), ("street", Value::Null)]),
                raw(&[("id", json!(2)), ("street_number", json!("5")), ("street", json!("Elm"))]),
            ],
            vec![raw(&[("key", json!("k1")), ("street_number", json!("5")), ("street", json!("Elm"))])],
        );
        let result = run(&config(), &input).unwrap();
        assert_eq!(result.summary.matched, 1);
        assert_eq!(result.summary.orphan_a, 1);

        let orphan = result
            .entries
            .iter()
            .find(|e| e.kind == EntryKind::OrphanA)
            .unwrap();
        assert_eq!(orphan.a_id.as_deref(), Some("1"));
        assert_eq!(orphan.reason, Some(OrphanReason::NormalizationFailed));
    }

    #[test]
    fn failed_source_read_yields_zero_entries_with_flag() {
        let input = ReconInput {
            source_a: Ok(SourceSnapshot { id_field: "id".into(), rows: vec![] }),
            source_b: Err(SourceReadError { message: "connection refused".into() }),
        };
        let result = run(&config(), &input).unwrap();
        assert!(result.entries.is_empty());
        assert_eq!(result.summary, ReconSummary::zero());
        let failure = result.failure.unwrap();
        assert_eq!(failure.source, SourceTag::B);
        assert_eq!(failure.message, "connection refused");
    }

    #[test]
    fn invalid_config_fails_fast() {
        let mut config = config();
        config.block_cap = 0;
        let err = run(&config, &input(vec![], vec![])).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }
}
