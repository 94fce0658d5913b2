use std::future::Future;
use std::sync::Arc;

use warden_core::{AppError, AppResult};
use warden_domain::{AuditAction, PermissionSet};

use crate::{AuditEvent, AuditRepository, AuditTrail, AuthContext};

/// How a list of required keys is matched against a permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// At least one key must be granted.
    One,
    /// Every key must be granted.
    All,
}

/// Returns whether the set grants the key, directly or through the wildcard.
#[must_use]
pub fn has(permissions: &PermissionSet, key: &str) -> bool {
    permissions.grants(key)
}

/// Returns whether at least one key is granted. An empty key list is never satisfied.
#[must_use]
pub fn has_any<S: AsRef<str>>(permissions: &PermissionSet, keys: &[S]) -> bool {
    keys.iter().any(|key| has(permissions, key.as_ref()))
}

/// Returns whether every key is granted. An empty key list is always satisfied.
#[must_use]
pub fn has_all<S: AsRef<str>>(permissions: &PermissionSet, keys: &[S]) -> bool {
    keys.iter().all(|key| has(permissions, key.as_ref()))
}

/// Permission gate in front of protected operations.
///
/// Predicates never touch the permission cache; denials are audited best-effort.
#[derive(Clone)]
pub struct AuthorizationGate {
    audit_trail: AuditTrail,
}

impl AuthorizationGate {
    /// Creates a gate writing denials to the audit sink.
    #[must_use]
    pub fn new(audit_repository: Arc<dyn AuditRepository>) -> Self {
        Self {
            audit_trail: AuditTrail::new(audit_repository),
        }
    }

    /// Checks the context's resolved set against `keys` in the given mode.
    #[must_use]
    pub fn authorize<S: AsRef<str>>(&self, context: &AuthContext, keys: &[S], mode: MatchMode) -> bool {
        match mode {
            MatchMode::One => has_any(context.permissions(), keys),
            MatchMode::All => has_all(context.permissions(), keys),
        }
    }

    /// Requires one permission key.
    pub async fn require(&self, context: &AuthContext, key: &str) -> AppResult<()> {
        self.require_keys(context, &[key], MatchMode::All).await
    }

    /// Requires at least one of the keys.
    pub async fn require_any(&self, context: &AuthContext, keys: &[&str]) -> AppResult<()> {
        self.require_keys(context, keys, MatchMode::One).await
    }

    /// Requires every key.
    pub async fn require_all(&self, context: &AuthContext, keys: &[&str]) -> AppResult<()> {
        self.require_keys(context, keys, MatchMode::All).await
    }

    /// Requires `keys` in the given mode, producing `Forbidden` with the missing keys.
    pub async fn require_keys(
        &self,
        context: &AuthContext,
        keys: &[&str],
        mode: MatchMode,
    ) -> AppResult<()> {
        if self.authorize(context, keys, mode) {
            return Ok(());
        }

        let required: Vec<String> = match mode {
            MatchMode::One => keys.iter().map(|key| (*key).to_owned()).collect(),
            MatchMode::All => keys
                .iter()
                .filter(|key| !has(context.permissions(), key))
                .map(|key| (*key).to_owned())
                .collect(),
        };

        self.audit_trail
            .record(AuditEvent {
                tenant_id: context.tenant_id(),
                subject: context.principal_id().to_string(),
                action: AuditAction::SecurityAccessDenied,
                resource_type: "permission".to_owned(),
                resource_id: required.join(","),
                detail: Some(format!(
                    "principal '{}' was denied; required {} of [{}]",
                    context.principal_id(),
                    match mode {
                        MatchMode::One => "one",
                        MatchMode::All => "all",
                    },
                    keys.join(", ")
                )),
            })
            .await;

        Err(AppError::Forbidden { required })
    }

    /// Runs `handler` only when the context holds `key`.
    ///
    /// The handler is not invoked on denial.
    pub async fn guard<T, F, Fut>(&self, context: &AuthContext, key: &str, handler: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.require(context, key).await?;
        handler().await
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{AppError, TenantId};
    use warden_domain::{AuditAction, LegacyRole, PermissionSet, catalog};

    use crate::AuthContext;
    use crate::test_fakes::{Harness, context, keys, principal};

    use super::{MatchMode, has, has_all, has_any};

    #[test]
    fn wildcard_satisfies_every_predicate() {
        let permissions = PermissionSet::wildcard();

        assert!(has(&permissions, "anything.at.all"));
        assert!(has_any(&permissions, &["a", "b"]));
        assert!(has_all(&permissions, &["a", "b"]));
    }

    #[test]
    fn empty_key_lists_follow_quantifier_semantics() {
        let permissions = PermissionSet::from_keys(keys(&["crm.leads.view"]));
        let none: [&str; 0] = [];

        assert!(!has_any(&permissions, &none));
        assert!(has_all(&permissions, &none));
    }

    #[test]
    fn any_and_all_differ_on_partial_sets() {
        let permissions = PermissionSet::from_keys(keys(&["crm.leads.view"]));
        let required = ["crm.leads.view", "crm.leads.manage"];

        assert!(has_any(&permissions, &required));
        assert!(!has_all(&permissions, &required));
    }

    #[test]
    fn authorize_follows_match_mode() {
        let harness = Harness::new();
        let gate = harness.gate();
        let ctx = context(
            principal(TenantId::new(), LegacyRole::Employee),
            &["hrms.leaves.apply"],
        );

        assert!(gate.authorize(&ctx, &["hrms.leaves.apply", "x.y"], MatchMode::One));
        assert!(!gate.authorize(&ctx, &["hrms.leaves.apply", "x.y"], MatchMode::All));
    }

    #[tokio::test]
    async fn require_reports_missing_keys_and_audits() {
        let harness = Harness::new();
        let gate = harness.gate();
        let ctx = context(
            principal(TenantId::new(), LegacyRole::Employee),
            &[catalog::ERP_INVOICES_VIEW],
        );

        let result = gate
            .require_all(&ctx, &[catalog::ERP_INVOICES_VIEW, catalog::ERP_INVOICES_APPROVE])
            .await;

        match result {
            Err(AppError::Forbidden { required }) => {
                assert_eq!(required, vec![catalog::ERP_INVOICES_APPROVE.to_owned()]);
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
        assert_eq!(
            harness.audit_actions().await,
            vec![AuditAction::SecurityAccessDenied]
        );
    }

    #[tokio::test]
    async fn guard_skips_handler_on_denial() {
        let harness = Harness::new();
        let gate = harness.gate();
        let ctx = context(principal(TenantId::new(), LegacyRole::Employee), &[]);
        let mut invoked = false;

        let result = gate
            .guard(&ctx, catalog::SECURITY_ROLES_MANAGE, || {
                invoked = true;
                async { Ok(()) }
            })
            .await;

        assert!(result.is_err_and(|error| error.is_forbidden()));
        assert!(!invoked);
    }

    #[tokio::test]
    async fn guard_runs_handler_for_wildcard_context() {
        let harness = Harness::new();
        let gate = harness.gate();
        let ctx = AuthContext::new(
            principal(TenantId::new(), LegacyRole::Admin),
            PermissionSet::wildcard(),
        );

        let value = gate
            .guard(&ctx, catalog::SECURITY_ROLES_MANAGE, || async { Ok(7) })
            .await;

        assert!(matches!(value, Ok(7)));
        assert!(harness.audit_actions().await.is_empty());
    }
}
