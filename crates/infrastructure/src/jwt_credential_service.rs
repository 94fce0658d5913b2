use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_application::{
    CredentialIssuer, CredentialRequest, CredentialVerifier, IssuedCredential, VerifiedCredential,
};
use warden_core::{AppError, AppResult, PrincipalId, TenantId};

/// Claims carried by bearer credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialClaims {
    sub: String,
    tid: String,
    iat: i64,
    exp: i64,
    iss: String,
    #[serde(default)]
    perms: Vec<String>,
}

/// HS256 bearer credential signer and verifier.
#[derive(Clone)]
pub struct JwtCredentialService {
    issuer: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtCredentialService {
    /// Creates a service from a shared secret.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            issuer: issuer.into(),
            ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;
        validation
    }
}

impl CredentialIssuer for JwtCredentialService {
    fn issue(&self, request: CredentialRequest) -> AppResult<IssuedCredential> {
        let issued_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|error| AppError::Internal(format!("invalid credential lifetime: {error}")))?;
        let expires_at = issued_at + ttl;

        let claims = CredentialClaims {
            sub: request.subject.to_string(),
            tid: request.tenant_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            perms: request.permissions_hint.clone(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign credential: {error}")))?;

        Ok(IssuedCredential {
            token,
            expires_at: timestamp_to_datetime(claims.exp)?,
            permissions_hint: request.permissions_hint,
        })
    }
}

impl CredentialVerifier for JwtCredentialService {
    fn verify(&self, raw_credential: &str) -> AppResult<VerifiedCredential> {
        let token = jsonwebtoken::decode::<CredentialClaims>(
            raw_credential,
            &self.decoding_key,
            &self.validation(),
        )
        .map_err(|_| AppError::Unauthenticated)?;
        let claims = token.claims;

        let subject = claims
            .sub
            .parse::<PrincipalId>()
            .map_err(|_| AppError::Unauthenticated)?;
        let tenant_id = Uuid::parse_str(claims.tid.as_str())
            .map(TenantId::from_uuid)
            .map_err(|_| AppError::Unauthenticated)?;
        let expires_at = timestamp_to_datetime(claims.exp).map_err(|_| AppError::Unauthenticated)?;

        Ok(VerifiedCredential {
            subject,
            tenant_id,
            permissions_hint: claims.perms,
            expires_at,
        })
    }
}

fn timestamp_to_datetime(value: i64) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_opt(value, 0)
        .single()
        .ok_or_else(|| AppError::Internal(format!("credential timestamp '{value}' is out of range")))
}
