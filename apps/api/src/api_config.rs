use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use warden_core::{AppError, PrincipalId};

/// What the binary does after loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCommand {
    Serve,
    Migrate,
    IssueCredential(PrincipalId),
}

impl ApiCommand {
    fn parse<I>(mut args: I) -> Result<Self, AppError>
    where
        I: Iterator<Item = String>,
    {
        match args.next().as_deref() {
            None => Ok(Self::Serve),
            Some("migrate") => Ok(Self::Migrate),
            Some("issue-credential") => {
                let principal_id = args.next().ok_or_else(|| {
                    AppError::Validation("issue-credential requires a principal id".to_owned())
                })?;
                Ok(Self::IssueCredential(principal_id.parse()?))
            }
            Some(other) => Err(AppError::Validation(format!("unknown command '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub command: ApiCommand,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub credential_secret: String,
    pub credential_issuer: String,
    pub credential_ttl: Duration,
    pub permission_cache_ttl: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let command = ApiCommand::parse(env::args().skip(1))?;

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let credential_secret = required_env("CREDENTIAL_SECRET")?;
        if credential_secret.len() < 32 {
            return Err(AppError::Validation(
                "CREDENTIAL_SECRET must be at least 32 characters".to_owned(),
            ));
        }
        let credential_issuer =
            env::var("CREDENTIAL_ISSUER").unwrap_or_else(|_| "warden".to_owned());
        let credential_ttl_minutes = optional_u64_env("CREDENTIAL_TTL_MINUTES", 60)?;
        let permission_cache_ttl =
            permission_cache_ttl(optional_u64_env("PERMISSION_CACHE_TTL_SECONDS", 300)?)?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        Ok(Self {
            command,
            database_url,
            frontend_url,
            api_host,
            api_port,
            credential_secret,
            credential_issuer,
            credential_ttl: Duration::from_secs(credential_ttl_minutes * 60),
            permission_cache_ttl,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn permission_cache_ttl(seconds: u64) -> Result<Duration, AppError> {
    if seconds == 0 {
        return Err(AppError::Validation(
            "PERMISSION_CACHE_TTL_SECONDS must be greater than zero".to_owned(),
        ));
    }

    Ok(Duration::from_secs(seconds))
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn optional_u64_env(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use warden_core::{AppError, PrincipalId};

    use super::{ApiCommand, permission_cache_ttl};

    fn parse(args: &[&str]) -> Result<ApiCommand, AppError> {
        ApiCommand::parse(args.iter().map(|value| (*value).to_owned()))
    }

    #[test]
    fn no_argument_serves() {
        assert!(matches!(parse(&[]), Ok(ApiCommand::Serve)));
        assert!(matches!(parse(&["migrate"]), Ok(ApiCommand::Migrate)));
    }

    #[test]
    fn issue_credential_requires_valid_principal_id() {
        let principal_id = PrincipalId::new();
        let command = parse(&["issue-credential", principal_id.to_string().as_str()]);

        assert_eq!(
            command.unwrap_or_else(|error| panic!("parse failed: {error}")),
            ApiCommand::IssueCredential(principal_id)
        );
        assert!(matches!(
            parse(&["issue-credential"]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse(&["issue-credential", "nope"]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(matches!(parse(&["serve-all"]), Err(AppError::Validation(_))));
    }

    #[test]
    fn zero_cache_ttl_is_rejected() {
        assert!(matches!(
            permission_cache_ttl(0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            permission_cache_ttl(300),
            Ok(value) if value == Duration::from_secs(300)
        ));
    }
}
