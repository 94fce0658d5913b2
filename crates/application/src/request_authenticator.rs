use std::sync::Arc;

use tracing::debug;
use warden_core::{AppError, AppResult, PrincipalId};

use crate::{
    AuthContext, CredentialIssuer, CredentialRequest, CredentialVerifier, IssuedCredential,
    PermissionResolver, PrincipalRepository,
};

/// Turns bearer credentials into authenticated request contexts.
///
/// Every rejection is `AppError::Unauthenticated`; the cause only reaches the debug log.
#[derive(Clone)]
pub struct RequestAuthenticator {
    verifier: Arc<dyn CredentialVerifier>,
    issuer: Arc<dyn CredentialIssuer>,
    principal_repository: Arc<dyn PrincipalRepository>,
    resolver: PermissionResolver,
}

impl RequestAuthenticator {
    /// Creates an authenticator.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        issuer: Arc<dyn CredentialIssuer>,
        principal_repository: Arc<dyn PrincipalRepository>,
        resolver: PermissionResolver,
    ) -> Self {
        Self {
            verifier,
            issuer,
            principal_repository,
            resolver,
        }
    }

    /// Verifies the credential, loads its principal and resolves permissions.
    ///
    /// The permission hint embedded in the credential is ignored.
    pub async fn authenticate(&self, raw_credential: &str) -> AppResult<AuthContext> {
        let raw_credential = raw_credential.trim();
        if raw_credential.is_empty() {
            debug!("rejecting empty credential");
            return Err(AppError::Unauthenticated);
        }

        let credential = self.verifier.verify(raw_credential).map_err(|error| {
            debug!(%error, "credential verification failed");
            AppError::Unauthenticated
        })?;

        let principal = match self
            .principal_repository
            .find_principal(credential.subject)
            .await?
        {
            Some(principal) => principal,
            None => {
                debug!(subject = %credential.subject, "credential subject does not exist");
                return Err(AppError::Unauthenticated);
            }
        };

        if !principal.is_active() {
            debug!(subject = %credential.subject, "credential subject is inactive");
            return Err(AppError::Unauthenticated);
        }

        if principal.tenant_id() != credential.tenant_id {
            debug!(
                subject = %credential.subject,
                claimed_tenant = %credential.tenant_id,
                "credential tenant does not match principal"
            );
            return Err(AppError::Unauthenticated);
        }

        let permissions = self.resolver.resolve_principal(&principal).await?;
        Ok(AuthContext::new(principal, permissions))
    }

    /// Issues a login credential with a freshly computed permission hint.
    pub async fn issue_credential(&self, principal_id: PrincipalId) -> AppResult<IssuedCredential> {
        let principal = self
            .principal_repository
            .find_principal(principal_id)
            .await?
            .filter(|principal| principal.is_active())
            .ok_or(AppError::Unauthenticated)?;

        let permissions = self.resolver.resolve_fresh(&principal).await?;

        self.issuer.issue(CredentialRequest {
            subject: principal.id(),
            tenant_id: principal.tenant_id(),
            permissions_hint: permissions.to_claim_list(),
        })
    }
}
