//! # Decision Snapshots
//!
//! Every evaluation freezes the exact rules and evidence it used into an
//! append-only snapshot with a canonical-JSON digest, so a past verdict
//! can be replayed and proven unmodified even after rules are edited or
//! superseded.

use serde::Serialize;

use pfas_core::{canonical_digest, CoreError, JurisdictionId, Timestamp};
use pfas_state::MaterialComposition;
use pfas_store::{DecisionSnapshotEntry, Ruleset};

/// The frozen payload shape. Serialized once into the snapshot entry.
#[derive(Debug, Serialize)]
struct FrozenEvaluation<'a> {
    jurisdiction_id: &'a JurisdictionId,
    rulesets: &'a [Ruleset],
    compositions: &'a [MaterialComposition],
}

/// Freeze one jurisdiction evaluation into a snapshot entry.
pub fn freeze(
    jurisdiction_id: &JurisdictionId,
    rulesets: &[Ruleset],
    compositions: &[MaterialComposition],
    taken_at: Timestamp,
) -> Result<DecisionSnapshotEntry, CoreError> {
    let frozen = FrozenEvaluation {
        jurisdiction_id,
        rulesets,
        compositions,
    };
    let digest = canonical_digest(&frozen)?;
    let snapshot =
        serde_json::to_value(&frozen).map_err(|e| CoreError::Canonicalization(e.to_string()))?;
    Ok(DecisionSnapshotEntry {
        jurisdiction_id: jurisdiction_id.clone(),
        taken_at,
        digest,
        snapshot,
    })
}
