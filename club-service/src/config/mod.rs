use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ClubConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub authz: AuthzConfig,
    pub invitations: InvitationConfig,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    /// Capability cache entry lifetime, in seconds.
    pub cache_ttl_seconds: u64,
    /// Interval between cache eviction sweeps, in seconds.
    pub cache_sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationConfig {
    pub default_expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl ClubConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::Config(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = ClubConfig {
            common,
            environment,
            service_name: get_env("SERVICE_NAME", Some("club-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            authz: AuthzConfig {
                cache_ttl_seconds: parse_env("AUTHZ_CACHE_TTL_SECONDS", Some("300"), is_prod)?,
                cache_sweep_interval_seconds: parse_env(
                    "AUTHZ_CACHE_SWEEP_INTERVAL_SECONDS",
                    Some("60"),
                    is_prod,
                )?,
            },
            invitations: InvitationConfig {
                default_expiry_hours: parse_env("INVITATION_EXPIRY_HOURS", Some("168"), is_prod)?,
            },
            pagination: PaginationConfig {
                default_page_size: parse_env("PAGINATION_DEFAULT_PAGE_SIZE", Some("20"), is_prod)?,
                max_page_size: parse_env("PAGINATION_MAX_PAGE_SIZE", Some("100"), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("*"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        Ok(config)
    }

    /// Fixed configuration for integration tests: short sweeps, quiet logs.
    pub fn for_tests() -> Self {
        ClubConfig {
            common: core_config::Config { port: 0 },
            environment: Environment::Dev,
            service_name: "club-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "error".to_string(),
            authz: AuthzConfig {
                cache_ttl_seconds: 300,
                cache_sweep_interval_seconds: 1,
            },
            invitations: InvitationConfig {
                default_expiry_hours: 168,
            },
            pagination: PaginationConfig {
                default_page_size: 20,
                max_page_size: 100,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }
}

/// Read an env var, falling back to `default` outside prod. In prod a missing
/// var without a default is a hard configuration error.
fn get_env(name: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => match default {
            Some(d) if !is_prod || !d.is_empty() => Ok(d.to_string()),
            _ => Err(AppError::Config(anyhow::anyhow!(
                "missing required environment variable {}",
                name
            ))),
        },
    }
}

fn parse_env<T>(name: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(name, default, is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::Config(anyhow::anyhow!("invalid value for {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_config_has_sane_defaults() {
        let config = ClubConfig::for_tests();
        assert_eq!(config.authz.cache_ttl_seconds, 300);
        assert_eq!(config.pagination.default_page_size, 20);
        assert!(config.pagination.max_page_size >= config.pagination.default_page_size);
    }
}
