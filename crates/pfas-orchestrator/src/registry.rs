//! # Linked-Entity Status Targets
//!
//! After a verdict, the orchestrator propagates a denormalized PFAS
//! status onto the linked business entity (article, material, supplier,
//! product) so list views elsewhere in the application can render it
//! without recomputing. Each entity family implements
//! [`PfasStatusTarget`]; the orchestrator dispatches through a registry
//! keyed by [`ObjectKind`] instead of branching on type-tag strings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use pfas_core::{ComplianceStatus, ObjectKind, ObjectRef, RequestContext};

/// A business entity family that carries a denormalized PFAS status.
#[async_trait]
pub trait PfasStatusTarget: Send + Sync {
    /// Write the status onto the referenced entity.
    async fn apply_pfas_status(
        &self,
        ctx: &RequestContext,
        object: &ObjectRef,
        status: ComplianceStatus,
    ) -> anyhow::Result<()>;
}

/// Registry of status targets, one per object kind.
///
/// Kinds without a registered target (e.g. free-text custom items, which
/// have no backing entity) are skipped silently.
#[derive(Default)]
pub struct StatusTargetRegistry {
    targets: HashMap<ObjectKind, Arc<dyn PfasStatusTarget>>,
}

impl StatusTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the target for one object kind, replacing any previous.
    pub fn register(&mut self, kind: ObjectKind, target: Arc<dyn PfasStatusTarget>) {
        self.targets.insert(kind, target);
    }

    /// The target for a kind, if one is registered.
    pub fn get(&self, kind: ObjectKind) -> Option<&Arc<dyn PfasStatusTarget>> {
        self.targets.get(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use pfas_core::TenantId;

    #[derive(Default)]
    struct RecordingTarget {
        applied: Mutex<Vec<(String, ComplianceStatus)>>,
    }

    #[async_trait]
    impl PfasStatusTarget for RecordingTarget {
        async fn apply_pfas_status(
            &self,
            _ctx: &RequestContext,
            object: &ObjectRef,
            status: ComplianceStatus,
        ) -> anyhow::Result<()> {
            self.applied
                .lock()
                .unwrap()
                .push((object.object_id.clone(), status));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_registry_dispatches_by_kind() {
        let target = Arc::new(RecordingTarget::default());
        let mut registry = StatusTargetRegistry::new();
        registry.register(ObjectKind::Article, target.clone());

        let ctx = RequestContext::new(TenantId::new(), "system:test").unwrap();
        let object = ObjectRef::new(ObjectKind::Article, "art-001").unwrap();
        registry
            .get(ObjectKind::Article)
            .unwrap()
            .apply_pfas_status(&ctx, &object, ComplianceStatus::NonCompliant)
            .await
            .unwrap();

        assert_eq!(
            *target.applied.lock().unwrap(),
            vec![("art-001".to_string(), ComplianceStatus::NonCompliant)]
        );
        assert!(registry.get(ObjectKind::Supplier).is_none());
    }
}
