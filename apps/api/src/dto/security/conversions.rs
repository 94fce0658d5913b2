use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use warden_application::{
    AssignRoleInput, CloneRoleInput, CreateRoleInput, RevokeRoleInput, UpdateRoleInput,
};
use warden_core::{AppError, AppResult, TenantId};
use warden_domain::{PermissionKey, Role, RoleAssignment};

use super::types::{
    AssignRoleRequest, CloneRoleRequest, CreateRoleRequest, RevokeRoleRequest,
    RoleAssignmentResponse, RoleResponse, UpdateRoleRequest,
};

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.id().to_string(),
            name: value.name().to_owned(),
            slug: value.slug().to_owned(),
            module: value.module().as_str().to_owned(),
            permissions: key_strings(value.permissions()),
            is_system: value.is_system(),
            tenant_id: value.tenant_id().map(|tenant_id| tenant_id.to_string()),
            is_active: value.is_active(),
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        Self {
            assignment_id: value.id.to_string(),
            principal_id: value.principal_id.to_string(),
            role_id: value.role_id.to_string(),
            tenant_id: value.tenant_id.to_string(),
            is_active: value.is_active,
            expires_at: value
                .expires_at
                .map(|expires_at| expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            additional_grants: key_strings(&value.additional_grants),
            revocations: key_strings(&value.revocations),
            granted_by: value.granted_by.to_string(),
            scope: value.scope,
        }
    }
}

impl TryFrom<CreateRoleRequest> for CreateRoleInput {
    type Error = AppError;

    fn try_from(value: CreateRoleRequest) -> AppResult<Self> {
        Ok(Self {
            name: value.name,
            module: value.module.parse()?,
            permissions: PermissionKey::parse_all(value.permissions)?,
        })
    }
}

impl TryFrom<UpdateRoleRequest> for UpdateRoleInput {
    type Error = AppError;

    fn try_from(value: UpdateRoleRequest) -> AppResult<Self> {
        Ok(Self {
            name: value.name,
            module: value.module.map(|module| module.parse()).transpose()?,
            permissions: value.permissions.map(PermissionKey::parse_all).transpose()?,
        })
    }
}

impl From<CloneRoleRequest> for CloneRoleInput {
    fn from(value: CloneRoleRequest) -> Self {
        Self { name: value.name }
    }
}

impl AssignRoleRequest {
    /// Converts the payload, scoping it to `caller_tenant` when no tenant is given.
    pub fn into_input(self, caller_tenant: TenantId) -> AppResult<AssignRoleInput> {
        Ok(AssignRoleInput {
            principal_id: self.principal_id.parse()?,
            role_id: self.role_id.parse()?,
            tenant_id: tenant_or(self.tenant_id.as_deref(), caller_tenant)?,
            expires_at: self
                .expires_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            additional_grants: PermissionKey::parse_all(self.additional_grants)?,
            revocations: PermissionKey::parse_all(self.revocations)?,
            scope: self.scope.filter(|scope| !scope.trim().is_empty()),
        })
    }
}

impl RevokeRoleRequest {
    /// Converts the payload, scoping it to `caller_tenant` when no tenant is given.
    pub fn into_input(self, caller_tenant: TenantId) -> AppResult<RevokeRoleInput> {
        Ok(RevokeRoleInput {
            principal_id: self.principal_id.parse()?,
            role_id: self.role_id.parse()?,
            tenant_id: tenant_or(self.tenant_id.as_deref(), caller_tenant)?,
        })
    }
}

fn tenant_or(value: Option<&str>, caller_tenant: TenantId) -> AppResult<TenantId> {
    match value {
        Some(value) => Uuid::parse_str(value)
            .map(TenantId::from_uuid)
            .map_err(|error| AppError::Validation(format!("invalid tenant id '{value}': {error}"))),
        None => Ok(caller_tenant),
    }
}

fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid timestamp '{value}': {error}")))
}

fn key_strings(keys: &[PermissionKey]) -> Vec<String> {
    keys.iter().map(|key| key.as_str().to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use warden_application::{CreateRoleInput, UpdateRoleInput};
    use warden_core::{AppError, PrincipalId, TenantId};
    use warden_domain::{RoleId, RoleModule};

    use super::super::types::{AssignRoleRequest, CreateRoleRequest, UpdateRoleRequest};

    fn assign_request() -> AssignRoleRequest {
        AssignRoleRequest {
            principal_id: PrincipalId::new().to_string(),
            role_id: RoleId::new().to_string(),
            tenant_id: None,
            expires_at: Some("2030-01-02T03:04:05Z".to_owned()),
            additional_grants: vec!["crm.reports.view".to_owned()],
            revocations: Vec::new(),
            scope: Some("  ".to_owned()),
        }
    }

    #[test]
    fn assign_request_defaults_to_caller_tenant() {
        let caller_tenant = TenantId::new();

        let input = assign_request()
            .into_input(caller_tenant)
            .unwrap_or_else(|error| panic!("conversion failed: {error}"));

        assert_eq!(input.tenant_id, caller_tenant);
        assert_eq!(
            input.expires_at,
            Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).single()
        );
        assert_eq!(input.additional_grants.len(), 1);
        assert!(input.scope.is_none());
    }

    #[test]
    fn malformed_assign_fields_are_validation_errors() {
        let mut bad_timestamp = assign_request();
        bad_timestamp.expires_at = Some("tomorrow".to_owned());
        let mut bad_key = assign_request();
        bad_key.additional_grants = vec!["has space".to_owned()];
        let mut bad_tenant = assign_request();
        bad_tenant.tenant_id = Some("tenant-1".to_owned());

        for request in [bad_timestamp, bad_key, bad_tenant] {
            assert!(matches!(
                request.into_input(TenantId::new()),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn role_requests_parse_module_and_keys() {
        let create = CreateRoleInput::try_from(CreateRoleRequest {
            name: "Field Sales".to_owned(),
            module: "crm".to_owned(),
            permissions: vec!["crm.leads.view".to_owned()],
        })
        .unwrap_or_else(|error| panic!("conversion failed: {error}"));
        let update = UpdateRoleInput::try_from(UpdateRoleRequest {
            module: Some("hrms".to_owned()),
            ..UpdateRoleRequest::default()
        })
        .unwrap_or_else(|error| panic!("conversion failed: {error}"));

        assert_eq!(create.module, RoleModule::Crm);
        assert_eq!(update.module, Some(RoleModule::Hrms));
        assert!(update.permissions.is_none());
        assert!(matches!(
            CreateRoleInput::try_from(CreateRoleRequest {
                name: "Other".to_owned(),
                module: "finance".to_owned(),
                permissions: Vec::new(),
            }),
            Err(AppError::Validation(_))
        ));
    }
}
