//! # Fixture Environment
//!
//! The CLI runs the full pipeline against an in-memory store with
//! fixture collaborators: a small built-in table of well-known PFAS
//! substances stands in for the chemical-data providers, and a canned
//! extractor stands in for the AI endpoint. This makes every subcommand
//! runnable end-to-end without network access or a hosted backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use pfas_core::{CasNumber, ClaimStatus, JurisdictionId, RuleId, RulesetId, Severity, Timestamp};
use pfas_evidence::{
    CompositionEntry, DocumentExtractor, ExtractedDeclaration, UploadedFile,
};
use pfas_store::{EntityStore, Jurisdiction, MemoryStore, Rule, Ruleset, RulesetStatus};
use pfas_verify::{
    IdentityLookup, IdentityProvider, ProviderError, RegulatoryLookup, RegulatoryProvider,
};

struct KnownSubstance {
    cas: &'static str,
    name: &'static str,
    synonyms: &'static [&'static str],
    formula: &'static str,
    weight: f64,
    svhc: bool,
    threshold_ppm: f64,
}

// Well-known long-chain PFAS with published identities.
const KNOWN: &[KnownSubstance] = &[
    KnownSubstance {
        cas: "335-67-1",
        name: "Perfluorooctanoic acid",
        synonyms: &["PFOA", "Pentadecafluorooctanoic acid"],
        formula: "C8HF15O2",
        weight: 414.07,
        svhc: true,
        threshold_ppm: 0.025,
    },
    KnownSubstance {
        cas: "1763-23-1",
        name: "Perfluorooctanesulfonic acid",
        synonyms: &["PFOS", "Heptadecafluorooctanesulfonic acid"],
        formula: "C8HF17O3S",
        weight: 500.13,
        svhc: true,
        threshold_ppm: 0.025,
    },
    KnownSubstance {
        cas: "375-95-1",
        name: "Perfluorononanoic acid",
        synonyms: &["PFNA", "Perfluoro-n-nonanoic acid"],
        formula: "C9HF17O2",
        weight: 464.08,
        svhc: true,
        threshold_ppm: 0.025,
    },
];

fn known(cas: &CasNumber) -> Option<&'static KnownSubstance> {
    KNOWN.iter().find(|k| k.cas == cas.as_str())
}

/// A fixture chemical-identity provider backed by the built-in table.
pub struct FixtureIdentityProvider {
    source: &'static str,
    id_prefix: &'static str,
}

impl FixtureIdentityProvider {
    pub fn pubchem() -> Arc<Self> {
        Arc::new(Self {
            source: "pubchem",
            id_prefix: "CID",
        })
    }

    pub fn comptox() -> Arc<Self> {
        Arc::new(Self {
            source: "comptox",
            id_prefix: "DTXSID",
        })
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    fn source_name(&self) -> &str {
        self.source
    }

    async fn lookup(&self, cas: &CasNumber) -> Result<Option<IdentityLookup>, ProviderError> {
        Ok(known(cas).map(|k| IdentityLookup {
            name: k.name.to_string(),
            synonyms: k.synonyms.iter().map(|s| s.to_string()).collect(),
            molecular_formula: Some(k.formula.to_string()),
            molecular_weight: Some(k.weight),
            external_id: Some(format!("{}{}", self.id_prefix, cas.as_str().replace('-', ""))),
        }))
    }
}

/// A fixture regulatory-status provider.
pub struct FixtureRegulatoryProvider;

#[async_trait]
impl RegulatoryProvider for FixtureRegulatoryProvider {
    fn source_name(&self) -> &str {
        "echa"
    }

    async fn lookup(&self, cas: &CasNumber) -> Result<Option<RegulatoryLookup>, ProviderError> {
        Ok(known(cas).map(|k| RegulatoryLookup {
            pfas_restricted: true,
            is_svhc: k.svhc,
            is_restricted: true,
            restriction_effective_date: None,
            restriction_threshold_ppm: Some(k.threshold_ppm),
            echa_substance_id: Some(format!("ECHA-{}", cas.as_str())),
        }))
    }
}

/// A canned extractor that reads a declaration out of any uploaded file.
pub struct FixtureExtractor;

#[async_trait]
impl DocumentExtractor for FixtureExtractor {
    async fn extract(&self, _file: &UploadedFile) -> anyhow::Result<ExtractedDeclaration> {
        let mut pages = BTreeMap::new();
        pages.insert("claim_status".to_string(), 1);
        pages.insert("compositions".to_string(), 2);
        Ok(ExtractedDeclaration {
            claim_status: ClaimStatus::Present,
            compositions: vec![CompositionEntry {
                substance_cas: Some(CasNumber::new("335-67-1").expect("known-valid CAS")),
                concentration_ppm: 40.0,
            }],
            confidence_score: 0.9,
            extracted_fields: vec!["claim_status".to_string(), "compositions".to_string()],
            page_citations: pages,
            prompt_version: "pfas-decl-v3".to_string(),
            model_version: "extract-2026-01".to_string(),
        })
    }
}

/// Seed the EU REACH jurisdiction with one active ruleset: a critical
/// 25 ppm per-substance limit plus a 100 ppm aggregate limit.
pub async fn seed_regulatory_data(
    store: &MemoryStore,
    tenant_id: pfas_core::TenantId,
) -> anyhow::Result<()> {
    let jurisdiction = JurisdictionId::new("eu-reach")?;
    store
        .insert_jurisdiction(Jurisdiction {
            id: jurisdiction.clone(),
            tenant_id,
            name: "EU REACH".to_string(),
            active: true,
            created_at: Timestamp::now(),
        })
        .await?;
    store
        .insert_ruleset(Ruleset {
            id: RulesetId::new(),
            tenant_id,
            jurisdiction_id: jurisdiction,
            name: "EU REACH PFAS restriction".to_string(),
            version: 1,
            status: RulesetStatus::Active,
            rules: vec![
                Rule {
                    id: RuleId::new(),
                    name: "PFAS per-substance limit".to_string(),
                    condition_json: serde_json::json!({}),
                    thresholds_json: serde_json::json!({"max_concentration_ppm": 25.0}),
                    severity: Severity::Critical,
                    exemptions_json: serde_json::json!({"exempted_uses": ["medical_device"]}),
                    actions_json: serde_json::json!({"action_types": ["supplier_outreach"]}),
                },
                Rule {
                    id: RuleId::new(),
                    name: "PFAS aggregate limit".to_string(),
                    condition_json: serde_json::json!({}),
                    thresholds_json: serde_json::json!({"aggregate_pfas_ppm": 100.0}),
                    severity: Severity::Warning,
                    exemptions_json: serde_json::json!({}),
                    actions_json: serde_json::json!({"action_types": ["composition_review"]}),
                },
            ],
            created_at: Timestamp::now(),
        })
        .await?;
    Ok(())
}
