//! # Typed Rule Payloads
//!
//! Rules arrive from the hosted store with JSON payload columns
//! (`condition_json`, `thresholds_json`, `exemptions_json`,
//! `actions_json`). The engine deserializes them into these typed records
//! at its boundary, so the evaluation logic never touches raw JSON.
//! Missing fields default; wrong-typed fields are a malformed-payload
//! error attributed to the rule.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pfas_core::RuleId;
use pfas_store::Rule;

/// A rule payload column that could not be deserialized.
#[derive(Error, Debug)]
#[error("rule {rule} has malformed {column} payload: {source}")]
pub struct MalformedPayload {
    /// The offending rule.
    pub rule: RuleId,
    /// Which JSON column failed.
    pub column: &'static str,
    /// The deserialization failure.
    #[source]
    pub source: serde_json::Error,
}

/// Scope predicate: which objects the rule applies to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleCondition {
    /// Object kind the rule is scoped to (`article`, `material`, ...).
    /// Absent means the rule applies to every kind.
    pub scope: Option<String>,
    /// Use categories the rule is limited to. Empty means all uses.
    pub use_categories: Vec<String>,
}

/// Threshold values the rule checks against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Per-substance concentration ceiling in ppm.
    pub max_concentration_ppm: Option<f64>,
    /// Ceiling on the summed concentration of all tracked substances.
    pub aggregate_pfas_ppm: Option<f64>,
}

/// Exemptions that suppress a trigger without hiding it from the audit
/// trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleExemptions {
    /// Declared uses that exempt the object from this rule.
    pub exempted_uses: Vec<String>,
}

/// Remediation actions a triggered rule raises.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleActions {
    /// Action types, one remediation action each.
    pub action_types: Vec<String>,
}

/// A rule with all four payload columns deserialized.
#[derive(Debug, Clone)]
pub struct TypedRule {
    /// The rule's identifier.
    pub id: RuleId,
    /// Name used in reasoning output.
    pub name: String,
    /// Rule severity.
    pub severity: pfas_core::Severity,
    /// Scope predicate.
    pub condition: RuleCondition,
    /// Threshold values.
    pub thresholds: RuleThresholds,
    /// Exemption declarations.
    pub exemptions: RuleExemptions,
    /// Declared remediation actions.
    pub actions: RuleActions,
}

impl TypedRule {
    /// Deserialize a stored rule's payload columns.
    pub fn parse(rule: &Rule) -> Result<Self, MalformedPayload> {
        Ok(Self {
            id: rule.id,
            name: rule.name.clone(),
            severity: rule.severity,
            condition: parse_column(rule.id, "condition_json", &rule.condition_json)?,
            thresholds: parse_column(rule.id, "thresholds_json", &rule.thresholds_json)?,
            exemptions: parse_column(rule.id, "exemptions_json", &rule.exemptions_json)?,
            actions: parse_column(rule.id, "actions_json", &rule.actions_json)?,
        })
    }
}

fn parse_column<T: serde::de::DeserializeOwned>(
    rule: RuleId,
    column: &'static str,
    value: &serde_json::Value,
) -> Result<T, MalformedPayload> {
    serde_json::from_value(value.clone()).map_err(|source| MalformedPayload {
        rule,
        column,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfas_core::Severity;
    use serde_json::json;

    fn stored_rule(thresholds: serde_json::Value) -> Rule {
        Rule {
            id: RuleId::new(),
            name: "PFOA concentration limit".to_string(),
            condition_json: json!({"scope": "article"}),
            thresholds_json: thresholds,
            severity: Severity::Critical,
            exemptions_json: json!({"exempted_uses": ["medical_device"]}),
            actions_json: json!({"action_types": ["supplier_outreach"]}),
        }
    }

    #[test]
    fn test_parse_full_payload() {
        let typed = TypedRule::parse(&stored_rule(json!({"max_concentration_ppm": 25.0}))).unwrap();
        assert_eq!(typed.condition.scope.as_deref(), Some("article"));
        assert_eq!(typed.thresholds.max_concentration_ppm, Some(25.0));
        assert_eq!(typed.thresholds.aggregate_pfas_ppm, None);
        assert_eq!(typed.exemptions.exempted_uses, vec!["medical_device"]);
        assert_eq!(typed.actions.action_types, vec!["supplier_outreach"]);
    }

    #[test]
    fn test_missing_fields_default() {
        let typed = TypedRule::parse(&stored_rule(json!({}))).unwrap();
        assert_eq!(typed.thresholds, RuleThresholds::default());
    }

    #[test]
    fn test_wrong_typed_field_is_malformed() {
        let err = TypedRule::parse(&stored_rule(json!({"max_concentration_ppm": "high"})))
            .unwrap_err();
        assert_eq!(err.column, "thresholds_json");
    }
}
