//! # Substance Verification Service
//!
//! Resolves a CAS number into one verified `Substance` record by
//! cross-checking two independent chemical-identity providers and one
//! regulatory-status provider.
//!
//! ## Consistency Gate
//!
//! Agreement between the identity providers is scored 0-100:
//!
//! - +40 if both identity providers answered (one alone: +20; neither:
//!   the substance is not found and verification aborts).
//! - +30 if both agree on molecular formula (exact string match).
//! - +30 if both agree on molecular weight within 0.1% relative.
//!
//! A score below 50 fails verification and writes nothing. The agreement
//! bonuses only apply when both providers answered, so a single provider
//! can never pass the gate on its own.
//!
//! ## Consensus
//!
//! When providers disagree on name, formula, or weight, the first
//! non-null answer in priority order (primary, then secondary) wins.
//! This deliberately prefers determinism over numerical smoothing; it
//! also means provider ordering, not corroboration strength, breaks
//! ties — a documented limitation, kept as-is.
//!
//! ## Caching
//!
//! A verified record younger than [`Substance::TRUST_WINDOW_DAYS`] is
//! served without any provider calls.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use pfas_core::{CasNumber, ListingStatus, RequestContext, SubstanceId, Timestamp};
use pfas_store::{EntityStore, StoreError, Substance, VerificationMetadata};

use crate::providers::{
    IdentityLookup, IdentityProvider, RegulatoryLookup, RegulatoryProvider,
};

/// Minimum consistency score a verification must reach.
pub const SCORE_GATE: u8 = 50;

/// Per-provider time bound. A hanging provider becomes an absent answer,
/// it never blocks the other two.
pub const PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Cap on merged synonyms per substance.
pub const MAX_SYNONYMS: usize = 50;

/// Relative tolerance for molecular-weight agreement (0.1%).
const WEIGHT_TOLERANCE: f64 = 1e-3;

/// Errors surfaced by substance verification.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// No identity provider knows this CAS number.
    #[error("substance {cas} not found by any identity provider")]
    NotFound {
        /// The CAS number that was looked up.
        cas: CasNumber,
    },

    /// The providers' answers disagree too much to trust.
    #[error("cross-source consistency score {score} below acceptance gate {gate}")]
    InsufficientConsistency {
        /// The score that was reached.
        score: u8,
        /// The gate it failed.
        gate: u8,
    },

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The verification service. Generic over the store so tests and the CLI
/// can run it against [`pfas_store::MemoryStore`].
pub struct VerificationService<S> {
    store: Arc<S>,
    primary: Arc<dyn IdentityProvider>,
    secondary: Arc<dyn IdentityProvider>,
    regulatory: Arc<dyn RegulatoryProvider>,
    provider_timeout: Duration,
}

impl<S: EntityStore> VerificationService<S> {
    /// Wire the service with its three providers, in priority order.
    pub fn new(
        store: Arc<S>,
        primary: Arc<dyn IdentityProvider>,
        secondary: Arc<dyn IdentityProvider>,
        regulatory: Arc<dyn RegulatoryProvider>,
    ) -> Self {
        Self {
            store,
            primary,
            secondary,
            regulatory,
            provider_timeout: Duration::from_secs(PROVIDER_TIMEOUT_SECS),
        }
    }

    /// Override the per-provider time bound.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Resolve a CAS number into a verified substance record.
    ///
    /// Serves from the 30-day cache when possible; otherwise queries all
    /// three providers concurrently, scores their agreement, and upserts
    /// the reconciled record keyed by CAS number.
    ///
    /// # Errors
    ///
    /// [`VerificationError::NotFound`] when no identity provider answered;
    /// [`VerificationError::InsufficientConsistency`] when the score fails
    /// the ≥50 gate. In both cases nothing is written.
    pub async fn verify(
        &self,
        ctx: &RequestContext,
        cas: &CasNumber,
    ) -> Result<Substance, VerificationError> {
        let now = Timestamp::now();
        let cached = self.store.find_substance_by_cas(ctx.tenant_id, cas).await?;
        if let Some(existing) = &cached {
            if existing.is_trusted(now) {
                tracing::debug!(cas = %cas, "substance served from trust window");
                return Ok(existing.clone());
            }
        }

        let (primary, secondary, regulatory) = tokio::join!(
            self.identity_lookup(self.primary.as_ref(), cas),
            self.identity_lookup(self.secondary.as_ref(), cas),
            self.regulatory_lookup(cas),
        );

        if primary.is_none() && secondary.is_none() {
            return Err(VerificationError::NotFound { cas: cas.clone() });
        }

        let mut checks = Vec::new();
        let score = consistency_score(primary.as_ref(), secondary.as_ref(), &mut checks);
        if score < SCORE_GATE {
            tracing::warn!(cas = %cas, score, "verification failed consistency gate");
            return Err(VerificationError::InsufficientConsistency {
                score,
                gate: SCORE_GATE,
            });
        }

        let record = self.reconcile(
            ctx,
            cas,
            cached,
            primary,
            secondary,
            regulatory,
            score,
            checks,
            now,
        );
        let written = self.store.upsert_substance(record).await?;
        tracing::info!(cas = %cas, score, "substance verified");
        Ok(written)
    }

    /// Run one identity lookup under the time bound, turning every failure
    /// mode into an absent answer.
    async fn identity_lookup(
        &self,
        provider: &dyn IdentityProvider,
        cas: &CasNumber,
    ) -> Option<IdentityLookup> {
        match tokio::time::timeout(self.provider_timeout, provider.lookup(cas)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                tracing::warn!(source = provider.source_name(), %err, "identity provider failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    source = provider.source_name(),
                    timeout_secs = self.provider_timeout.as_secs(),
                    "identity provider timed out"
                );
                None
            }
        }
    }

    /// Run the regulatory lookup under the time bound; absence is valid.
    async fn regulatory_lookup(&self, cas: &CasNumber) -> Option<RegulatoryLookup> {
        match tokio::time::timeout(self.provider_timeout, self.regulatory.lookup(cas)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                tracing::warn!(source = self.regulatory.source_name(), %err, "regulatory provider failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    source = self.regulatory.source_name(),
                    timeout_secs = self.provider_timeout.as_secs(),
                    "regulatory provider timed out"
                );
                None
            }
        }
    }

    /// Build the reconciled record from the providers' answers.
    #[allow(clippy::too_many_arguments)]
    fn reconcile(
        &self,
        ctx: &RequestContext,
        cas: &CasNumber,
        cached: Option<Substance>,
        primary: Option<IdentityLookup>,
        secondary: Option<IdentityLookup>,
        regulatory: Option<RegulatoryLookup>,
        score: u8,
        checks: Vec<String>,
        now: Timestamp,
    ) -> Substance {
        let mut sources_checked = Vec::new();
        let mut external_ids = BTreeMap::new();
        for (provider, answer) in [
            (self.primary.as_ref(), primary.as_ref()),
            (self.secondary.as_ref(), secondary.as_ref()),
        ] {
            if let Some(lookup) = answer {
                sources_checked.push(provider.source_name().to_string());
                if let Some(id) = &lookup.external_id {
                    external_ids.insert(provider.source_name().to_string(), id.clone());
                }
            }
        }
        if let Some(reg) = &regulatory {
            sources_checked.push(self.regulatory.source_name().to_string());
            if let Some(id) = &reg.echa_substance_id {
                external_ids.insert(self.regulatory.source_name().to_string(), id.clone());
            }
        }

        // First non-null answer in priority order wins.
        let ordered = [primary.as_ref(), secondary.as_ref()];
        let name = ordered
            .iter()
            .flatten()
            .map(|l| l.name.clone())
            .next()
            .unwrap_or_else(|| cas.as_str().to_string());
        let molecular_formula = ordered
            .iter()
            .flatten()
            .find_map(|l| l.molecular_formula.clone());
        let molecular_weight = ordered.iter().flatten().find_map(|l| l.molecular_weight);
        let synonyms = merge_synonyms(ordered.iter().flatten().map(|l| l.synonyms.as_slice()));

        // Absent regulatory data defaults to false/unknown, never NotListed.
        let (pfas_flag, svhc_status, restricted_status, restriction_threshold_ppm) =
            match &regulatory {
                Some(reg) => (
                    reg.pfas_restricted,
                    listing_from(reg.is_svhc),
                    listing_from(reg.is_restricted),
                    reg.restriction_threshold_ppm,
                ),
                None => (false, ListingStatus::Unknown, ListingStatus::Unknown, None),
            };

        Substance {
            // A stale record keeps its identity across re-verification.
            id: cached.map(|s| s.id).unwrap_or_else(SubstanceId::new),
            tenant_id: ctx.tenant_id,
            cas_number: cas.clone(),
            name,
            synonyms,
            pfas_flag,
            svhc_status,
            restricted_status,
            restriction_threshold_ppm,
            molecular_formula,
            molecular_weight,
            external_ids,
            verification_metadata: VerificationMetadata {
                sources_checked,
                verification_score: score,
                consistency_checks: checks,
            },
            last_updated: now,
        }
    }
}

fn listing_from(listed: bool) -> ListingStatus {
    if listed {
        ListingStatus::Listed
    } else {
        ListingStatus::NotListed
    }
}

/// Score agreement between the two identity answers, recording each check
/// performed. At least one answer must be present.
fn consistency_score(
    primary: Option<&IdentityLookup>,
    secondary: Option<&IdentityLookup>,
    checks: &mut Vec<String>,
) -> u8 {
    let (a, b) = match (primary, secondary) {
        (Some(a), Some(b)) => {
            checks.push("both identity providers answered (+40)".to_string());
            (a, b)
        }
        _ => {
            checks.push("one identity provider answered (+20)".to_string());
            return 20;
        }
    };

    let mut score = 40u8;
    match (&a.molecular_formula, &b.molecular_formula) {
        (Some(fa), Some(fb)) if fa == fb => {
            score += 30;
            checks.push(format!("molecular formula match {fa} (+30)"));
        }
        _ => checks.push("molecular formula mismatch or missing (+0)".to_string()),
    }
    match (a.molecular_weight, b.molecular_weight) {
        (Some(wa), Some(wb)) if weights_agree(wa, wb) => {
            score += 30;
            checks.push(format!("molecular weight agreement {wa} ~ {wb} (+30)"));
        }
        _ => checks.push("molecular weight mismatch or missing (+0)".to_string()),
    }
    score
}

/// Whether two weights agree within 0.1% relative difference.
fn weights_agree(a: f64, b: f64) -> bool {
    let denom = a.abs().max(b.abs());
    if denom == 0.0 {
        return true;
    }
    (a - b).abs() / denom <= WEIGHT_TOLERANCE
}

/// Merge synonym lists: lower-cased, de-duplicated in first-seen order,
/// capped at [`MAX_SYNONYMS`].
fn merge_synonyms<'a>(lists: impl Iterator<Item = &'a [String]>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for list in lists {
        for synonym in list {
            let lowered = synonym.trim().to_lowercase();
            if lowered.is_empty() || merged.contains(&lowered) {
                continue;
            }
            merged.push(lowered);
            if merged.len() == MAX_SYNONYMS {
                return merged;
            }
        }
    }
    merged
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pfas_core::TenantId;
    use pfas_store::MemoryStore;

    use crate::providers::ProviderError;

    struct FixtureIdentity {
        source: &'static str,
        answer: Option<IdentityLookup>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FixtureIdentity {
        fn answering(source: &'static str, answer: IdentityLookup) -> Arc<Self> {
            Arc::new(Self {
                source,
                answer: Some(answer),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn empty(source: &'static str) -> Arc<Self> {
            Arc::new(Self {
                source,
                answer: None,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(source: &'static str) -> Arc<Self> {
            Arc::new(Self {
                source,
                answer: None,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProvider for FixtureIdentity {
        fn source_name(&self) -> &str {
            self.source
        }

        async fn lookup(
            &self,
            _cas: &CasNumber,
        ) -> Result<Option<IdentityLookup>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Unavailable {
                    provider: self.source.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(self.answer.clone())
        }
    }

    struct FixtureRegulatory {
        answer: Option<RegulatoryLookup>,
    }

    #[async_trait]
    impl RegulatoryProvider for FixtureRegulatory {
        fn source_name(&self) -> &str {
            "echa"
        }

        async fn lookup(
            &self,
            _cas: &CasNumber,
        ) -> Result<Option<RegulatoryLookup>, ProviderError> {
            Ok(self.answer.clone())
        }
    }

    fn pfoa_cas() -> CasNumber {
        CasNumber::new("335-67-1").unwrap()
    }

    fn pfoa_lookup(name: &str, external_id: &str) -> IdentityLookup {
        IdentityLookup {
            name: name.to_string(),
            synonyms: vec!["PFOA".to_string(), "Pentadecafluorooctanoic acid".to_string()],
            molecular_formula: Some("C8HF15O2".to_string()),
            molecular_weight: Some(414.07),
            external_id: Some(external_id.to_string()),
        }
    }

    fn restricted_lookup() -> RegulatoryLookup {
        RegulatoryLookup {
            pfas_restricted: true,
            is_svhc: true,
            is_restricted: true,
            restriction_effective_date: None,
            restriction_threshold_ppm: Some(0.025),
            echa_substance_id: Some("100.005.817".to_string()),
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(TenantId::new(), "user:analyst").unwrap()
    }

    fn service(
        store: Arc<MemoryStore>,
        primary: Arc<FixtureIdentity>,
        secondary: Arc<FixtureIdentity>,
        regulatory: Option<RegulatoryLookup>,
    ) -> VerificationService<MemoryStore> {
        VerificationService::new(
            store,
            primary,
            secondary,
            Arc::new(FixtureRegulatory { answer: regulatory }),
        )
    }

    // ── Scoring ──────────────────────────────────────────────────────

    #[test]
    fn test_full_agreement_scores_100() {
        let a = pfoa_lookup("Perfluorooctanoic acid", "335-67-1");
        let b = pfoa_lookup("PFOA", "DTXSID8031865");
        let mut checks = Vec::new();
        assert_eq!(consistency_score(Some(&a), Some(&b), &mut checks), 100);
        assert_eq!(checks.len(), 3);
    }

    #[test]
    fn test_single_provider_scores_20() {
        let a = pfoa_lookup("Perfluorooctanoic acid", "335-67-1");
        let mut checks = Vec::new();
        assert_eq!(consistency_score(Some(&a), None, &mut checks), 20);
        assert_eq!(consistency_score(None, Some(&a), &mut checks), 20);
    }

    #[test]
    fn test_disagreement_scores_40() {
        let a = pfoa_lookup("Perfluorooctanoic acid", "335-67-1");
        let mut b = pfoa_lookup("PFOA", "DTXSID8031865");
        b.molecular_formula = Some("C8H2F14O2".to_string());
        b.molecular_weight = Some(500.0);
        let mut checks = Vec::new();
        assert_eq!(consistency_score(Some(&a), Some(&b), &mut checks), 40);
    }

    #[test]
    fn test_weight_tolerance_boundary() {
        assert!(weights_agree(414.07, 414.07));
        assert!(weights_agree(1000.0, 1000.9));
        assert!(!weights_agree(1000.0, 1002.0));
        assert!(weights_agree(0.0, 0.0));
    }

    // ── Verification flow ────────────────────────────────────────────

    #[tokio::test]
    async fn test_verify_writes_reconciled_record() {
        let store = Arc::new(MemoryStore::new());
        let primary = FixtureIdentity::answering(
            "pubchem",
            pfoa_lookup("Perfluorooctanoic acid", "CID9554"),
        );
        let secondary =
            FixtureIdentity::answering("comptox", pfoa_lookup("PFOA", "DTXSID8031865"));
        let svc = service(
            store.clone(),
            primary,
            secondary,
            Some(restricted_lookup()),
        );

        let ctx = ctx();
        let substance = svc.verify(&ctx, &pfoa_cas()).await.unwrap();
        assert_eq!(substance.name, "Perfluorooctanoic acid");
        assert_eq!(substance.verification_metadata.verification_score, 100);
        assert!(substance.pfas_flag);
        assert_eq!(substance.svhc_status, ListingStatus::Listed);
        assert_eq!(substance.restriction_threshold_ppm, Some(0.025));
        assert_eq!(substance.external_ids["pubchem"], "CID9554");
        assert_eq!(substance.external_ids["echa"], "100.005.817");
        // Synonyms are lower-cased and de-duplicated across providers.
        assert_eq!(
            substance.synonyms,
            vec!["pfoa", "pentadecafluorooctanoic acid"]
        );

        let stored = store
            .find_substance_by_cas(ctx.tenant_id, &pfoa_cas())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, substance.id);
    }

    #[tokio::test]
    async fn test_not_found_when_no_identity_answers() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(
            store.clone(),
            FixtureIdentity::empty("pubchem"),
            FixtureIdentity::failing("comptox"),
            None,
        );
        let ctx = ctx();
        let err = svc.verify(&ctx, &pfoa_cas()).await.unwrap_err();
        assert!(matches!(err, VerificationError::NotFound { .. }));
        assert!(store
            .find_substance_by_cas(ctx.tenant_id, &pfoa_cas())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_single_provider_fails_gate_and_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(
            store.clone(),
            FixtureIdentity::answering(
                "pubchem",
                pfoa_lookup("Perfluorooctanoic acid", "CID9554"),
            ),
            FixtureIdentity::failing("comptox"),
            Some(restricted_lookup()),
        );
        let ctx = ctx();
        let err = svc.verify(&ctx, &pfoa_cas()).await.unwrap_err();
        match err {
            VerificationError::InsufficientConsistency { score, gate } => {
                assert_eq!(score, 20);
                assert_eq!(gate, SCORE_GATE);
            }
            other => panic!("expected InsufficientConsistency, got {other:?}"),
        }
        assert!(store
            .find_substance_by_cas(ctx.tenant_id, &pfoa_cas())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_missing_regulatory_defaults_unknown() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(
            store,
            FixtureIdentity::answering(
                "pubchem",
                pfoa_lookup("Perfluorooctanoic acid", "CID9554"),
            ),
            FixtureIdentity::answering("comptox", pfoa_lookup("PFOA", "DTXSID8031865")),
            None,
        );
        let substance = svc.verify(&ctx(), &pfoa_cas()).await.unwrap();
        assert!(!substance.pfas_flag);
        assert_eq!(substance.svhc_status, ListingStatus::Unknown);
        assert_eq!(substance.restricted_status, ListingStatus::Unknown);
        assert_eq!(substance.restriction_threshold_ppm, None);
    }

    // ── Trust window ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_fresh_record_served_without_provider_calls() {
        let store = Arc::new(MemoryStore::new());
        let primary = FixtureIdentity::answering(
            "pubchem",
            pfoa_lookup("Perfluorooctanoic acid", "CID9554"),
        );
        let secondary =
            FixtureIdentity::answering("comptox", pfoa_lookup("PFOA", "DTXSID8031865"));
        let svc = service(store, primary.clone(), secondary.clone(), None);

        let ctx = ctx();
        let first = svc.verify(&ctx, &pfoa_cas()).await.unwrap();
        let second = svc.verify(&ctx, &pfoa_cas()).await.unwrap();
        assert_eq!(first.id, second.id);
        // One call each from the first verification, none from the second.
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_record_reverified_keeping_identity() {
        let store = Arc::new(MemoryStore::new());
        let primary = FixtureIdentity::answering(
            "pubchem",
            pfoa_lookup("Perfluorooctanoic acid", "CID9554"),
        );
        let secondary =
            FixtureIdentity::answering("comptox", pfoa_lookup("PFOA", "DTXSID8031865"));
        let svc = service(store.clone(), primary.clone(), secondary, None);

        let ctx = ctx();
        let mut stale = svc.verify(&ctx, &pfoa_cas()).await.unwrap();
        stale.last_updated = Timestamp::now().minus_days(31);
        store.upsert_substance(stale.clone()).await.unwrap();

        let reverified = svc.verify(&ctx, &pfoa_cas()).await.unwrap();
        assert_eq!(primary.call_count(), 2);
        assert_eq!(reverified.id, stale.id);
        assert!(reverified.is_trusted(Timestamp::now()));
    }

    // ── Consensus ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_primary_answer_wins_consensus() {
        let store = Arc::new(MemoryStore::new());
        let mut secondary_answer = pfoa_lookup("PFOA (CompTox name)", "DTXSID8031865");
        secondary_answer.molecular_weight = Some(414.08);
        let svc = service(
            store,
            FixtureIdentity::answering(
                "pubchem",
                pfoa_lookup("Perfluorooctanoic acid", "CID9554"),
            ),
            FixtureIdentity::answering("comptox", secondary_answer),
            None,
        );
        let substance = svc.verify(&ctx(), &pfoa_cas()).await.unwrap();
        assert_eq!(substance.name, "Perfluorooctanoic acid");
        assert_eq!(substance.molecular_weight, Some(414.07));
    }

    #[test]
    fn test_synonym_merge_caps_at_50() {
        let many: Vec<String> = (0..60).map(|i| format!("Synonym-{i}")).collect();
        let merged = merge_synonyms([many.as_slice()].into_iter());
        assert_eq!(merged.len(), MAX_SYNONYMS);
        assert_eq!(merged[0], "synonym-0");
    }

    #[test]
    fn test_synonym_merge_deduplicates_case_insensitively() {
        let a = vec!["PFOA".to_string(), " pfoa ".to_string()];
        let b = vec!["Pfoa".to_string(), "C8".to_string()];
        let merged = merge_synonyms([a.as_slice(), b.as_slice()].into_iter());
        assert_eq!(merged, vec!["pfoa", "c8"]);
    }
}
