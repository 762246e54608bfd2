use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::SourceTag;
use crate::normalize::NormalizeMode;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    /// Fields that must all agree for a MATCH verdict. Also the blocking key.
    pub match_fields: Vec<String>,
    /// Fields that strengthen confidence only; never required for a match.
    #[serde(default)]
    pub secondary_fields: Vec<String>,
    /// Blocks larger than this are routed to the direct fallback pass.
    #[serde(default = "default_block_cap")]
    pub block_cap: usize,
    /// Per-field canonicalization overrides. Unlisted fields use `alnum_text`.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,
    #[serde(default)]
    pub sources: SourcesConfig,
}

fn default_block_cap() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldRule {
    pub mode: NormalizeMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub a: SourceConfig,
    #[serde(default)]
    pub b: SourceConfig,
}

/// The per-record identifier field name travels with the input snapshot,
/// not the config; this section only maps field names onto columns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// Rename map: canonical field name -> this source's column name.
    /// The two stores disagree on naming (`street` vs `street_name`).
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.match_fields.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one match field is required".into(),
            ));
        }
        if self.block_cap == 0 {
            return Err(ReconError::ConfigValidation("block_cap must be >= 1".into()));
        }

        for (i, f) in self.match_fields.iter().enumerate() {
            if self.match_fields[..i].contains(f) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate match field '{f}'"
                )));
            }
        }
        for f in &self.secondary_fields {
            if self.match_fields.contains(f) {
                return Err(ReconError::ConfigValidation(format!(
                    "field '{f}' cannot be both match and secondary"
                )));
            }
        }

        for (tag, source) in [(SourceTag::A, &self.sources.a), (SourceTag::B, &self.sources.b)] {
            for canonical in source.columns.keys() {
                if !self.is_known_field(canonical) {
                    return Err(ReconError::ConfigValidation(format!(
                        "source {tag}: column mapping for unknown field '{canonical}'"
                    )));
                }
            }
        }

        for field in self.fields.keys() {
            if !self.is_known_field(field) {
                return Err(ReconError::ConfigValidation(format!(
                    "normalization rule for unknown field '{field}'"
                )));
            }
        }

        Ok(())
    }

    fn is_known_field(&self, field: &str) -> bool {
        self.match_fields.iter().any(|f| f == field)
            || self.secondary_fields.iter().any(|f| f == field)
    }

    /// Canonicalization mode for a field; defaults to alnum text.
    pub fn mode_for(&self, field: &str) -> NormalizeMode {
        self.fields
            .get(field)
            .map(|r| r.mode)
            .unwrap_or(NormalizeMode::AlnumText)
    }

    pub fn source(&self, tag: SourceTag) -> &SourceConfig {
        match tag {
            SourceTag::A => &self.sources.a,
            SourceTag::B => &self.sources.b,
        }
    }

    /// The column holding `field` in the given source, after renames.
    pub fn column_for<'a>(&'a self, tag: SourceTag, field: &'a str) -> &'a str {
        self.source(tag)
            .columns
            .get(field)
            .map(String::as_str)
            .unwrap_or(field)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "properties vs villa_terraza"
match_fields = ["street_number", "street"]
secondary_fields = ["city", "unit"]

[fields.street_number]
mode = "numeric_as_text"

[sources.a.columns]
street = "street_name"
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "properties vs villa_terraza");
        assert_eq!(config.match_fields, vec!["street_number", "street"]);
        assert_eq!(config.secondary_fields, vec!["city", "unit"]);
        assert_eq!(config.block_cap, 50);
        assert_eq!(config.mode_for("street_number"), NormalizeMode::NumericAsText);
        assert_eq!(config.mode_for("street"), NormalizeMode::AlnumText);
        assert_eq!(config.column_for(SourceTag::A, "street"), "street_name");
        assert_eq!(config.column_for(SourceTag::B, "street"), "street");
    }

    #[test]
    fn sources_section_is_optional() {
        let config = ReconConfig::from_toml(
            r#"
name = "minimal"
match_fields = ["street"]
"#,
        )
        .unwrap();
        assert!(config.sources.a.columns.is_empty());
        assert_eq!(config.column_for(SourceTag::B, "street"), "street");
    }

    #[test]
    fn reject_empty_match_fields() {
        let input = r#"
name = "bad"
match_fields = []
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("at least one match field"));
    }

    #[test]
    fn reject_zero_block_cap() {
        let input = r#"
name = "bad"
match_fields = ["street"]
block_cap = 0
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("block_cap"));
    }

    #[test]
    fn reject_duplicate_match_field() {
        let input = r#"
name = "bad"
match_fields = ["street", "street"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate match field"));
    }

    #[test]
    fn reject_overlapping_field_sets() {
        let input = r#"
name = "bad"
match_fields = ["street"]
secondary_fields = ["street"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("both match and secondary"));
    }

    #[test]
    fn reject_unknown_column_mapping() {
        let input = r#"
name = "bad"
match_fields = ["street"]
[sources.a.columns]
price = "list_price"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("unknown field 'price'"));
    }

    #[test]
    fn reject_unknown_mode_field() {
        let input = r#"
name = "bad"
match_fields = ["street"]
[fields.price]
mode = "exact_text"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("unknown field 'price'"));
    }

    #[test]
    fn reject_invalid_mode() {
        let input = r#"
name = "bad"
match_fields = ["street"]
[fields.street]
mode = "fuzzy"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
