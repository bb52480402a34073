//! # Regulatory Rule Engine
//!
//! Evaluates one jurisdiction's active rulesets against an object's
//! current composition evidence and produces a verdict.
//!
//! The engine is pure: it reads its inputs, returns a
//! [`JurisdictionVerdict`], and persists nothing. The orchestrator owns
//! all writes (assessment update, action fan-out), which keeps every
//! evaluation property testable without a store.
//!
//! ## Evaluation
//!
//! Rules are evaluated independently; only status aggregation couples
//! them, and that aggregation is the order-independent worsening lattice
//! of `ComplianceStatus`, so rule order never changes the verdict.
//!
//! A rule triggers on either check, independently:
//!
//! - **Per-substance**: any composition with a known CAS number whose
//!   concentration exceeds `max_concentration_ppm`.
//! - **Aggregate**: the summed concentration of all tracked compositions
//!   exceeds `aggregate_pfas_ppm`.
//!
//! A matching exemption suppresses the trigger but not the audit trail:
//! the reasoning keeps the rule's explanation annotated
//! `[Exemption applied]`, while `triggered_rules` (and therefore status
//! aggregation and action fan-out) excludes it.

use thiserror::Error;

use pfas_core::{ComplianceStatus, CoreError, JurisdictionId, ObjectRef, RuleId, Severity, Timestamp};
use pfas_state::MaterialComposition;
use pfas_store::{DecisionSnapshotEntry, Ruleset};

use crate::payload::{MalformedPayload, TypedRule};
use crate::snapshot;

/// A jurisdiction evaluation failure. The orchestrator catches this per
/// jurisdiction: other jurisdictions still apply.
#[derive(Error, Debug)]
pub enum RuleEngineError {
    /// A rule payload column could not be deserialized.
    #[error(transparent)]
    MalformedPayload(#[from] MalformedPayload),

    /// The decision snapshot could not be frozen.
    #[error("failed to freeze decision snapshot: {0}")]
    Snapshot(#[from] CoreError),
}

/// Everything one jurisdiction evaluation reads.
#[derive(Debug)]
pub struct EvaluationInput<'a> {
    /// The object under assessment.
    pub object: &'a ObjectRef,
    /// The jurisdiction being evaluated.
    pub jurisdiction_id: &'a JurisdictionId,
    /// The jurisdiction's active rulesets.
    pub rulesets: &'a [Ruleset],
    /// The object's current composition evidence.
    pub compositions: &'a [MaterialComposition],
    /// The object's declared use categories.
    pub use_categories: &'a [String],
}

/// One rule that triggered and counts toward the verdict.
#[derive(Debug, Clone)]
pub struct TriggeredRule {
    /// The rule's identifier.
    pub rule_id: RuleId,
    /// The rule's name.
    pub rule_name: String,
    /// The rule's severity.
    pub severity: Severity,
    /// Action types declared by the rule.
    pub action_types: Vec<String>,
    /// Why the rule triggered.
    pub explanation: String,
}

/// The outcome of evaluating one jurisdiction.
#[derive(Debug)]
pub struct JurisdictionVerdict {
    /// The evaluated jurisdiction.
    pub jurisdiction_id: JurisdictionId,
    /// The aggregated status for this jurisdiction.
    pub status: ComplianceStatus,
    /// Rules that triggered and were not exempted.
    pub triggered_rules: Vec<TriggeredRule>,
    /// Concatenated explanations, exempted rules included (annotated).
    pub reasoning: String,
    /// The frozen rules-and-evidence snapshot for audit replay.
    pub snapshot: DecisionSnapshotEntry,
}

/// The rule evaluation engine.
#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one jurisdiction.
    ///
    /// No active rulesets yields `InsufficientData` — absence of rules is
    /// not proof of safety and must never read as `compliant`.
    pub fn evaluate(
        &self,
        input: &EvaluationInput<'_>,
    ) -> Result<JurisdictionVerdict, RuleEngineError> {
        let taken_at = Timestamp::now();
        let snapshot = snapshot::freeze(
            input.jurisdiction_id,
            input.rulesets,
            input.compositions,
            taken_at,
        )?;

        if input.rulesets.iter().all(|rs| rs.rules.is_empty()) {
            tracing::debug!(
                jurisdiction = %input.jurisdiction_id,
                object = %input.object,
                "no active rules; evaluation is inconclusive"
            );
            return Ok(JurisdictionVerdict {
                jurisdiction_id: input.jurisdiction_id.clone(),
                status: ComplianceStatus::InsufficientData,
                triggered_rules: Vec::new(),
                reasoning: format!(
                    "No active rulesets for jurisdiction {}; compliance cannot be determined.",
                    input.jurisdiction_id
                ),
                snapshot,
            });
        }

        let mut status = ComplianceStatus::Compliant;
        let mut triggered_rules = Vec::new();
        let mut reasoning_lines = Vec::new();

        for ruleset in input.rulesets {
            for stored in &ruleset.rules {
                let rule = TypedRule::parse(stored)?;
                if !rule_applies(&rule, input) {
                    continue;
                }
                let Some(explanation) = check_rule(&rule, input.compositions) else {
                    continue;
                };

                if let Some(exempted_use) = matching_exemption(&rule, input.use_categories) {
                    reasoning_lines.push(format!(
                        "{}: {} [Exemption applied: {}]",
                        rule.name, explanation, exempted_use
                    ));
                    continue;
                }

                status = status.worst_of(rule.severity.triggered_status());
                reasoning_lines.push(format!("{}: {}", rule.name, explanation));
                triggered_rules.push(TriggeredRule {
                    rule_id: rule.id,
                    rule_name: rule.name,
                    severity: rule.severity,
                    action_types: rule.actions.action_types,
                    explanation,
                });
            }
        }

        tracing::debug!(
            jurisdiction = %input.jurisdiction_id,
            object = %input.object,
            %status,
            triggered = triggered_rules.len(),
            "jurisdiction evaluated"
        );
        Ok(JurisdictionVerdict {
            jurisdiction_id: input.jurisdiction_id.clone(),
            status,
            triggered_rules,
            reasoning: reasoning_lines.join("\n"),
            snapshot,
        })
    }
}

/// Whether the rule's scope predicate matches the object.
fn rule_applies(rule: &TypedRule, input: &EvaluationInput<'_>) -> bool {
    if let Some(scope) = &rule.condition.scope {
        if scope != input.object.kind.as_str() {
            return false;
        }
    }
    if !rule.condition.use_categories.is_empty() {
        return rule
            .condition
            .use_categories
            .iter()
            .any(|u| input.use_categories.contains(u));
    }
    true
}

/// Run both threshold checks. Returns the combined explanation when the
/// rule triggered, `None` otherwise.
fn check_rule(rule: &TypedRule, compositions: &[MaterialComposition]) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(max_ppm) = rule.thresholds.max_concentration_ppm {
        let exceeded: Vec<String> = compositions
            .iter()
            .filter(|c| c.substance_cas.is_some() && c.typical_concentration > max_ppm)
            .map(|c| {
                format!(
                    "{} at {} ppm (limit {} ppm)",
                    c.substance_cas.as_ref().map(|cas| cas.as_str()).unwrap_or("?"),
                    c.typical_concentration,
                    max_ppm
                )
            })
            .collect();
        if !exceeded.is_empty() {
            parts.push(format!("substance limit exceeded: {}", exceeded.join(", ")));
        }
    }

    if let Some(aggregate_ppm) = rule.thresholds.aggregate_pfas_ppm {
        let total: f64 = compositions.iter().map(|c| c.typical_concentration).sum();
        if total > aggregate_ppm {
            parts.push(format!(
                "aggregate concentration {total} ppm exceeds limit {aggregate_ppm} ppm"
            ));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// The first declared use category covered by the rule's exemptions.
fn matching_exemption<'a>(rule: &TypedRule, use_categories: &'a [String]) -> Option<&'a str> {
    use_categories
        .iter()
        .find(|u| rule.exemptions.exempted_uses.contains(u))
        .map(|u| u.as_str())
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pfas_core::{CasNumber, ObjectKind, PackageId, RulesetId, SourceType, TenantId};
    use pfas_store::{Rule, RulesetStatus};
    use serde_json::json;

    fn object() -> ObjectRef {
        ObjectRef::new(ObjectKind::Article, "art-001").unwrap()
    }

    fn composition(cas: Option<&str>, ppm: f64) -> MaterialComposition {
        MaterialComposition::new(
            TenantId::new(),
            "art-001",
            cas.map(|c| CasNumber::new(c).unwrap()),
            ppm,
            SourceType::SupplierDeclaration,
            0.9,
            PackageId::new(),
            None,
        )
        .unwrap()
    }

    fn rule(severity: Severity, thresholds: serde_json::Value) -> Rule {
        Rule {
            id: RuleId::new(),
            name: "PFAS concentration limit".to_string(),
            condition_json: json!({}),
            thresholds_json: thresholds,
            severity,
            exemptions_json: json!({}),
            actions_json: json!({"action_types": ["supplier_outreach"]}),
        }
    }

    fn active_ruleset(rules: Vec<Rule>) -> Ruleset {
        Ruleset {
            id: RulesetId::new(),
            tenant_id: TenantId::new(),
            jurisdiction_id: JurisdictionId::new("eu-reach").unwrap(),
            name: "EU REACH PFAS restriction".to_string(),
            version: 1,
            status: RulesetStatus::Active,
            rules,
            created_at: Timestamp::now(),
        }
    }

    fn evaluate(
        rulesets: &[Ruleset],
        compositions: &[MaterialComposition],
        use_categories: &[String],
    ) -> JurisdictionVerdict {
        let jurisdiction = JurisdictionId::new("eu-reach").unwrap();
        let object = object();
        RuleEngine::new()
            .evaluate(&EvaluationInput {
                object: &object,
                jurisdiction_id: &jurisdiction,
                rulesets,
                compositions,
                use_categories,
            })
            .unwrap()
    }

    #[test]
    fn test_no_rulesets_is_insufficient_data() {
        let verdict = evaluate(&[], &[composition(Some("335-67-1"), 100.0)], &[]);
        assert_eq!(verdict.status, ComplianceStatus::InsufficientData);
        assert!(verdict.triggered_rules.is_empty());
        assert!(verdict.reasoning.contains("cannot be determined"));
    }

    #[test]
    fn test_critical_substance_trigger_is_non_compliant() {
        let rulesets = vec![active_ruleset(vec![rule(
            Severity::Critical,
            json!({"max_concentration_ppm": 25.0}),
        )])];
        let verdict = evaluate(&rulesets, &[composition(Some("335-67-1"), 50.0)], &[]);
        assert_eq!(verdict.status, ComplianceStatus::NonCompliant);
        assert_eq!(verdict.triggered_rules.len(), 1);
        assert_eq!(
            verdict.triggered_rules[0].action_types,
            vec!["supplier_outreach"]
        );
        assert!(verdict.reasoning.contains("335-67-1 at 50 ppm"));
    }

    #[test]
    fn test_warning_trigger_is_requires_action() {
        let rulesets = vec![active_ruleset(vec![rule(
            Severity::Warning,
            json!({"max_concentration_ppm": 25.0}),
        )])];
        let verdict = evaluate(&rulesets, &[composition(Some("335-67-1"), 50.0)], &[]);
        assert_eq!(verdict.status, ComplianceStatus::RequiresAction);
    }

    #[test]
    fn test_under_threshold_is_compliant() {
        let rulesets = vec![active_ruleset(vec![rule(
            Severity::Critical,
            json!({"max_concentration_ppm": 25.0}),
        )])];
        let verdict = evaluate(&rulesets, &[composition(Some("335-67-1"), 10.0)], &[]);
        assert_eq!(verdict.status, ComplianceStatus::Compliant);
        assert!(verdict.triggered_rules.is_empty());
    }

    #[test]
    fn test_non_compliant_is_sticky_across_rules() {
        let rulesets = vec![active_ruleset(vec![
            rule(Severity::Critical, json!({"max_concentration_ppm": 25.0})),
            rule(Severity::Warning, json!({"max_concentration_ppm": 5.0})),
        ])];
        let verdict = evaluate(&rulesets, &[composition(Some("335-67-1"), 50.0)], &[]);
        assert_eq!(verdict.status, ComplianceStatus::NonCompliant);
        assert_eq!(verdict.triggered_rules.len(), 2);
    }

    #[test]
    fn test_aggregate_check_is_independent() {
        // Each row is under the per-substance limit; together they exceed
        // the aggregate limit.
        let rulesets = vec![active_ruleset(vec![rule(
            Severity::Critical,
            json!({"max_concentration_ppm": 25.0, "aggregate_pfas_ppm": 30.0}),
        )])];
        let compositions = vec![
            composition(Some("335-67-1"), 20.0),
            composition(Some("1763-23-1"), 15.0),
        ];
        let verdict = evaluate(&rulesets, &compositions, &[]);
        assert_eq!(verdict.status, ComplianceStatus::NonCompliant);
        assert!(verdict.reasoning.contains("aggregate concentration 35 ppm"));
    }

    #[test]
    fn test_unknown_cas_skips_substance_check_but_counts_in_aggregate() {
        let rulesets = vec![active_ruleset(vec![rule(
            Severity::Critical,
            json!({"max_concentration_ppm": 25.0, "aggregate_pfas_ppm": 100.0}),
        )])];
        let verdict = evaluate(&rulesets, &[composition(None, 150.0)], &[]);
        // The unresolved row cannot trigger the per-substance check, only
        // the aggregate one.
        assert!(!verdict.reasoning.contains("substance limit exceeded"));
        assert!(verdict.reasoning.contains("aggregate concentration"));
        assert_eq!(verdict.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn test_exemption_suppresses_trigger_but_not_reasoning() {
        let mut stored = rule(Severity::Critical, json!({"max_concentration_ppm": 25.0}));
        stored.exemptions_json = json!({"exempted_uses": ["medical_device"]});
        let rulesets = vec![active_ruleset(vec![stored])];
        let verdict = evaluate(
            &rulesets,
            &[composition(Some("335-67-1"), 50.0)],
            &["medical_device".to_string()],
        );
        assert_eq!(verdict.status, ComplianceStatus::Compliant);
        assert!(verdict.triggered_rules.is_empty());
        assert!(verdict.reasoning.contains("[Exemption applied: medical_device]"));
    }

    #[test]
    fn test_scope_mismatch_skips_rule() {
        let mut stored = rule(Severity::Critical, json!({"max_concentration_ppm": 25.0}));
        stored.condition_json = json!({"scope": "supplier"});
        let rulesets = vec![active_ruleset(vec![stored])];
        let verdict = evaluate(&rulesets, &[composition(Some("335-67-1"), 50.0)], &[]);
        assert_eq!(verdict.status, ComplianceStatus::Compliant);
        assert!(verdict.reasoning.is_empty());
    }

    #[test]
    fn test_malformed_payload_fails_evaluation() {
        let mut stored = rule(Severity::Critical, json!({"max_concentration_ppm": "high"}));
        stored.name = "broken rule".to_string();
        let rulesets = vec![active_ruleset(vec![stored])];
        let jurisdiction = JurisdictionId::new("eu-reach").unwrap();
        let object = object();
        let result = RuleEngine::new().evaluate(&EvaluationInput {
            object: &object,
            jurisdiction_id: &jurisdiction,
            rulesets: &rulesets,
            compositions: &[],
            use_categories: &[],
        });
        assert!(matches!(result, Err(RuleEngineError::MalformedPayload(_))));
    }

    #[test]
    fn test_snapshot_freezes_rules_and_evidence() {
        let rulesets = vec![active_ruleset(vec![rule(
            Severity::Critical,
            json!({"max_concentration_ppm": 25.0}),
        )])];
        let verdict = evaluate(&rulesets, &[composition(Some("335-67-1"), 50.0)], &[]);
        assert_eq!(verdict.snapshot.snapshot["rulesets"][0]["rules"].as_array().unwrap().len(), 1);
        assert_eq!(
            verdict.snapshot.snapshot["compositions"][0]["substance_cas"],
            "335-67-1"
        );
    }
}
