use chrono::{DateTime, Utc};
use warden_core::{AppResult, PrincipalId, TenantId};

/// Claims extracted from a credential whose signature and expiry were verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    /// Subject principal.
    pub subject: PrincipalId,
    /// Tenant the credential was issued for.
    pub tenant_id: TenantId,
    /// Permission keys embedded at issuance. A client-side hint only.
    pub permissions_hint: Vec<String>,
    /// Credential expiry.
    pub expires_at: DateTime<Utc>,
}

/// Claims to embed into a new credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Subject principal.
    pub subject: PrincipalId,
    /// Tenant of the subject.
    pub tenant_id: TenantId,
    /// Permission keys resolved at login.
    pub permissions_hint: Vec<String>,
}

/// Credential handed back to the client after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    /// Encoded bearer token.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Permission keys embedded into the token.
    pub permissions_hint: Vec<String>,
}

/// Port verifying bearer credentials.
pub trait CredentialVerifier: Send + Sync {
    /// Verifies signature and expiry. Any failure is `AppError::Unauthenticated`.
    fn verify(&self, raw_credential: &str) -> AppResult<VerifiedCredential>;
}

/// Port signing new bearer credentials.
pub trait CredentialIssuer: Send + Sync {
    /// Signs a credential carrying the requested claims.
    fn issue(&self, request: CredentialRequest) -> AppResult<IssuedCredential>;
}
