use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use warden_core::{AppResult, TenantId};
use warden_domain::AuditAction;

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// Principal that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Best-effort audit writer.
///
/// Sink failures are logged and dropped; they never change the outcome of the
/// operation being audited.
#[derive(Clone)]
pub struct AuditTrail {
    repository: Arc<dyn AuditRepository>,
}

impl AuditTrail {
    /// Creates an audit trail over a sink implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self { repository }
    }

    /// Appends one event, swallowing sink errors.
    pub async fn record(&self, event: AuditEvent) {
        let action = event.action;
        let resource_id = event.resource_id.clone();

        if let Err(error) = self.repository.append_event(event).await {
            warn!(
                action = action.as_str(),
                resource_id = %resource_id,
                %error,
                "audit sink rejected event"
            );
        }
    }
}
