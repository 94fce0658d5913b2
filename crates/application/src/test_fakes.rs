use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use warden_core::{AppError, AppResult, PrincipalId, TenantId};
use warden_domain::{
    AssignmentId, LegacyRole, PermissionKey, PermissionSet, Principal, Role, RoleAssignment,
    RoleId, RoleModule,
};

use crate::{
    AssignmentFilter, AssignmentKey, AssignmentPatch, AssignmentState, AssignmentUpdate,
    AuditEvent, AuditRepository, AuthContext, CacheGeneration, CredentialIssuer,
    CredentialRequest, CredentialVerifier, IssuedCredential, PermissionCache,
    PrincipalRepository, RoleAssignmentRepository, RoleFilter, RoleRepository,
    VerifiedCredential,
};

pub(crate) fn keys(values: &[&str]) -> Vec<PermissionKey> {
    PermissionKey::parse_all(values).unwrap_or_else(|error| panic!("invalid keys: {error}"))
}

pub(crate) fn principal(tenant_id: TenantId, legacy_role: LegacyRole) -> Principal {
    Principal::new(PrincipalId::new(), tenant_id, "Test Principal", legacy_role)
        .unwrap_or_else(|error| panic!("invalid principal: {error}"))
}

pub(crate) fn system_role(name: &str, permissions: &[&str]) -> Role {
    Role::system(RoleId::new(), name, RoleModule::Platform, keys(permissions))
        .unwrap_or_else(|error| panic!("invalid role: {error}"))
}

pub(crate) fn custom_role(tenant_id: TenantId, name: &str, permissions: &[&str]) -> Role {
    Role::custom(
        RoleId::new(),
        tenant_id,
        name,
        RoleModule::Crm,
        keys(permissions),
    )
    .unwrap_or_else(|error| panic!("invalid role: {error}"))
}

pub(crate) fn context(principal: Principal, permissions: &[&str]) -> AuthContext {
    AuthContext::new(principal, PermissionSet::from_keys(keys(permissions)))
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) struct FailingAuditRepository;

#[async_trait]
impl AuditRepository for FailingAuditRepository {
    async fn append_event(&self, _event: AuditEvent) -> AppResult<()> {
        Err(AppError::Internal("audit sink offline".to_owned()))
    }
}

/// Single in-memory store backing every directory port.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    pub(crate) principals: Mutex<HashMap<PrincipalId, Principal>>,
    pub(crate) roles: Mutex<HashMap<RoleId, Role>>,
    pub(crate) assignments: Mutex<Vec<RoleAssignment>>,
}

impl FakeDirectory {
    pub(crate) async fn add_principal(&self, principal: Principal) {
        self.principals.lock().await.insert(principal.id(), principal);
    }

    pub(crate) async fn add_role(&self, role: Role) {
        self.roles.lock().await.insert(role.id(), role);
    }

    pub(crate) async fn add_assignment(
        &self,
        principal_id: PrincipalId,
        role_id: RoleId,
        tenant_id: TenantId,
    ) -> AssignmentId {
        let assignment = RoleAssignment {
            id: AssignmentId::new(),
            principal_id,
            role_id,
            tenant_id,
            is_active: true,
            expires_at: None,
            additional_grants: Vec::new(),
            revocations: Vec::new(),
            granted_by: principal_id,
            scope: None,
        };
        let id = assignment.id;
        self.assignments.lock().await.push(assignment);
        id
    }

    pub(crate) async fn edit_assignment(
        &self,
        assignment_id: AssignmentId,
        edit: impl FnOnce(&mut RoleAssignment),
    ) {
        let mut assignments = self.assignments.lock().await;
        if let Some(assignment) = assignments
            .iter_mut()
            .find(|assignment| assignment.id == assignment_id)
        {
            edit(assignment);
        }
    }

    pub(crate) async fn expire_assignment(&self, assignment_id: AssignmentId) {
        self.edit_assignment(assignment_id, |assignment| {
            assignment.expires_at = Some(Utc::now() - Duration::minutes(1));
        })
        .await;
    }
}

#[async_trait]
impl PrincipalRepository for FakeDirectory {
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self.principals.lock().await.get(&principal_id).cloned())
    }
}

#[async_trait]
impl RoleRepository for FakeDirectory {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.lock().await.get(&role_id).cloned())
    }

    async fn list_roles(&self, filter: RoleFilter) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self
            .roles
            .lock()
            .await
            .values()
            .filter(|role| filter.include_inactive || role.is_active())
            .filter(|role| {
                filter
                    .role_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&role.id()))
            })
            .filter(|role| {
                filter
                    .available_to
                    .is_none_or(|tenant_id| role.is_available_to(tenant_id))
            })
            .filter(|role| filter.slug.as_deref().is_none_or(|slug| role.slug() == slug))
            .cloned()
            .collect();
        roles.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(roles)
    }

    async fn insert_role(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        if roles
            .values()
            .any(|existing| existing.slug() == role.slug() && existing.tenant_id() == role.tenant_id())
        {
            return Err(AppError::Conflict(format!(
                "role slug '{}' already exists",
                role.slug()
            )));
        }

        roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn save_role(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        let Some(existing) = roles.get_mut(&role.id()) else {
            return Err(AppError::NotFound(format!("role '{}' was not found", role.id())));
        };

        *existing = role.clone();
        Ok(role)
    }
}

#[async_trait]
impl RoleAssignmentRepository for FakeDirectory {
    async fn find_assignments(&self, filter: AssignmentFilter) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| {
                filter
                    .principal_id
                    .is_none_or(|id| assignment.principal_id == id)
            })
            .filter(|assignment| filter.role_id.is_none_or(|id| assignment.role_id == id))
            .filter(|assignment| filter.tenant_id.is_none_or(|id| assignment.tenant_id == id))
            .filter(|assignment| match filter.state {
                AssignmentState::Any => true,
                AssignmentState::Active => assignment.is_active,
                AssignmentState::EffectiveAt(now) => assignment.is_effective_at(now),
            })
            .cloned()
            .collect())
    }

    async fn upsert_assignment(
        &self,
        key: AssignmentKey,
        patch: AssignmentPatch,
    ) -> AppResult<RoleAssignment> {
        let mut assignments = self.assignments.lock().await;
        if let Some(existing) = assignments.iter_mut().find(|assignment| {
            assignment.principal_id == key.principal_id
                && assignment.role_id == key.role_id
                && assignment.tenant_id == key.tenant_id
        }) {
            existing.is_active = true;
            existing.expires_at = patch.expires_at;
            existing.additional_grants = patch.additional_grants;
            existing.revocations = patch.revocations;
            existing.granted_by = patch.granted_by;
            existing.scope = patch.scope;
            return Ok(existing.clone());
        }

        let assignment = RoleAssignment {
            id: AssignmentId::new(),
            principal_id: key.principal_id,
            role_id: key.role_id,
            tenant_id: key.tenant_id,
            is_active: true,
            expires_at: patch.expires_at,
            additional_grants: patch.additional_grants,
            revocations: patch.revocations,
            granted_by: patch.granted_by,
            scope: patch.scope,
        };
        assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.lock().await;
        let Some(assignment) = assignments
            .iter_mut()
            .find(|assignment| assignment.id == assignment_id)
        else {
            return Err(AppError::NotFound(format!(
                "assignment '{assignment_id}' was not found"
            )));
        };

        if let Some(is_active) = update.is_active {
            assignment.is_active = is_active;
        }
        Ok(())
    }
}

/// Cache fake without expiry that records invalidations.
#[derive(Default)]
pub(crate) struct FakePermissionCache {
    pub(crate) entries: Mutex<HashMap<PrincipalId, PermissionSet>>,
    pub(crate) invalidated: Mutex<Vec<PrincipalId>>,
    pub(crate) global_invalidations: Mutex<usize>,
}

#[async_trait]
impl PermissionCache for FakePermissionCache {
    async fn get(&self, principal_id: PrincipalId) -> Option<PermissionSet> {
        self.entries.lock().await.get(&principal_id).cloned()
    }

    async fn put(&self, principal_id: PrincipalId, permissions: PermissionSet) {
        self.entries.lock().await.insert(principal_id, permissions);
    }

    async fn generation(&self, principal_id: PrincipalId) -> CacheGeneration {
        let principal = self
            .invalidated
            .lock()
            .await
            .iter()
            .filter(|invalidated| **invalidated == principal_id)
            .count();
        let global = *self.global_invalidations.lock().await;
        CacheGeneration::new(principal as u64, global as u64)
    }

    async fn put_if_current(
        &self,
        principal_id: PrincipalId,
        generation: CacheGeneration,
        permissions: PermissionSet,
    ) -> bool {
        if self.generation(principal_id).await != generation {
            return false;
        }
        self.put(principal_id, permissions).await;
        true
    }

    async fn invalidate(&self, principal_id: PrincipalId) {
        self.entries.lock().await.remove(&principal_id);
        self.invalidated.lock().await.push(principal_id);
    }

    async fn invalidate_all(&self) {
        self.entries.lock().await.clear();
        *self.global_invalidations.lock().await += 1;
    }
}

/// Verifier accepting tokens of the form `valid:<principal>:<tenant>`.
pub(crate) struct FakeCredentialVerifier;

impl CredentialVerifier for FakeCredentialVerifier {
    fn verify(&self, raw_credential: &str) -> AppResult<VerifiedCredential> {
        let mut parts = raw_credential.split(':');
        let (Some("valid"), Some(subject), Some(tenant), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::Unauthenticated);
        };

        let subject = subject.parse().map_err(|_| AppError::Unauthenticated)?;
        let tenant = tenant
            .parse::<uuid::Uuid>()
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(VerifiedCredential {
            subject,
            tenant_id: TenantId::from_uuid(tenant),
            permissions_hint: Vec::new(),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }
}

pub(crate) fn valid_token(principal_id: PrincipalId, tenant_id: TenantId) -> String {
    format!("valid:{principal_id}:{tenant_id}")
}

/// Issuer echoing the request into a readable token.
#[derive(Default)]
pub(crate) struct FakeCredentialIssuer {
    pub(crate) requests: std::sync::Mutex<Vec<CredentialRequest>>,
}

impl CredentialIssuer for FakeCredentialIssuer {
    fn issue(&self, request: CredentialRequest) -> AppResult<IssuedCredential> {
        let token = valid_token(request.subject, request.tenant_id);
        let permissions_hint = request.permissions_hint.clone();
        self.requests
            .lock()
            .map_err(|_| AppError::Internal("issuer fake poisoned".to_owned()))?
            .push(request);

        Ok(IssuedCredential {
            token,
            expires_at: Utc::now() + Duration::hours(1),
            permissions_hint,
        })
    }
}

/// Shared fixtures for service tests.
pub(crate) struct Harness {
    pub(crate) directory: Arc<FakeDirectory>,
    pub(crate) cache: Arc<FakePermissionCache>,
    pub(crate) audit: Arc<FakeAuditRepository>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            directory: Arc::new(FakeDirectory::default()),
            cache: Arc::new(FakePermissionCache::default()),
            audit: Arc::new(FakeAuditRepository::default()),
        }
    }

    pub(crate) fn resolver(&self) -> crate::PermissionResolver {
        crate::PermissionResolver::new(
            self.directory.clone(),
            self.directory.clone(),
            self.directory.clone(),
            self.cache.clone(),
        )
    }

    pub(crate) fn gate(&self) -> crate::AuthorizationGate {
        crate::AuthorizationGate::new(self.audit.clone())
    }

    pub(crate) async fn audit_actions(&self) -> Vec<warden_domain::AuditAction> {
        self.audit
            .events
            .lock()
            .await
            .iter()
            .map(|event| event.action)
            .collect()
    }
}
