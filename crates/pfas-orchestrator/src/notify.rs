//! # Notification Delivery Seam
//!
//! Delivery is an external collaborator and strictly best-effort: step 8
//! failures are collected into the execution report, never propagated.
//! The tracing-backed implementation is what the CLI wires in; tests use
//! their own recording fixture.

use async_trait::async_trait;

use pfas_core::{ObjectRef, RequestContext};

/// Fire-and-forget user alert and email delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Surface a user-facing alert for the object.
    async fn send_alert(
        &self,
        ctx: &RequestContext,
        object: &ObjectRef,
        message: &str,
    ) -> anyhow::Result<()>;

    /// Email the responsible party.
    async fn send_email(
        &self,
        ctx: &RequestContext,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> anyhow::Result<()>;
}

/// A notifier that only logs. Used where no delivery backend is wired.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_alert(
        &self,
        _ctx: &RequestContext,
        object: &ObjectRef,
        message: &str,
    ) -> anyhow::Result<()> {
        tracing::info!(object = %object, message, "user alert");
        Ok(())
    }

    async fn send_email(
        &self,
        _ctx: &RequestContext,
        recipient: &str,
        subject: &str,
        _body: &str,
    ) -> anyhow::Result<()> {
        tracing::info!(recipient, subject, "email notification");
        Ok(())
    }
}
