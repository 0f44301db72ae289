//! Configuration loading and representation.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 1440;
/// One year. Longer lifetimes overflow token expiry arithmetic.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Process configuration, read once at startup and injected everywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    /// When set, Postgres-backed stores are used; otherwise in-memory.
    pub database_url: Option<String>,
    pub bootstrap_admin_username: String,
    pub bootstrap_admin_password: String,
    /// Public base URL appended to customer messages as a tracking link.
    pub tracking_base_url: Option<String>,
    /// Browser origins allowed to call the API; `["*"]` allows any.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl_minutes = match var("TOKEN_TTL_MINUTES") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(v) if (1..=MAX_TOKEN_TTL_MINUTES).contains(&v) => v,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_TTL_MINUTES",
                        message: format!("must be between 1 and {MAX_TOKEN_TTL_MINUTES}"),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_TTL_MINUTES",
                        message: e.to_string(),
                    });
                }
            },
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let cors_origins = parse_origins(var("CORS_ORIGINS").as_deref().unwrap_or("*"))?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl_minutes,
            database_url: var("DATABASE_URL"),
            bootstrap_admin_username: var("BOOTSTRAP_ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
            bootstrap_admin_password: var("BOOTSTRAP_ADMIN_PASSWORD").unwrap_or_else(|| "admin123".to_string()),
            tracking_base_url: var("TRACKING_BASE_URL"),
            cors_origins,
        })
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Comma-separated origin list. Each entry is `*` or an http(s) origin.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if let Some(bad) = origins
        .iter()
        .find(|o| *o != "*" && !o.starts_with("http://") && !o.starts_with("https://"))
    {
        return Err(ConfigError::Invalid {
            name: "CORS_ORIGINS",
            message: format!("'{bad}' is not an http(s) origin"),
        });
    }

    if origins.is_empty() {
        return Ok(vec!["*".to_string()]);
    }
    Ok(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.token_ttl_minutes, 1440);
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.bootstrap_admin_username, "admin");
        assert_eq!(cfg.bootstrap_admin_password, "admin123");
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.allows_any_origin());
    }

    #[test]
    fn cors_origins_are_split_and_checked() {
        let cfg = config(&[("CORS_ORIGINS", "https://envios.example.uy/, http://localhost:3000")]).unwrap();
        assert_eq!(cfg.cors_origins, vec!["https://envios.example.uy", "http://localhost:3000"]);
        assert!(!cfg.allows_any_origin());

        let err = config(&[("CORS_ORIGINS", "envios.example.uy")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CORS_ORIGINS", .. }));

        assert_eq!(config(&[("CORS_ORIGINS", " , ")]).unwrap().cors_origins, vec!["*"]);
    }

    #[test]
    fn values_are_read_and_blank_means_unset() {
        let cfg = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("TOKEN_TTL_MINUTES", "30"),
            ("DATABASE_URL", "  "),
            ("TRACKING_BASE_URL", "https://envios.example.uy"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.token_ttl(), chrono::Duration::minutes(30));
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.tracking_base_url.as_deref(), Some("https://envios.example.uy"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = config(&[("TOKEN_TTL_MINUTES", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TOKEN_TTL_MINUTES", .. }));

        let err = config(&[("TOKEN_TTL_MINUTES", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TOKEN_TTL_MINUTES", .. }));

        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
    }

    #[test]
    fn token_ttl_is_capped_to_a_year() {
        let err = config(&[("TOKEN_TTL_MINUTES", "1000000000000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "TOKEN_TTL_MINUTES", .. }));

        let max = MAX_TOKEN_TTL_MINUTES.to_string();
        let cfg = config(&[("TOKEN_TTL_MINUTES", max.as_str())]).unwrap();
        let issued_at = chrono::Utc::now();
        assert!(issued_at.checked_add_signed(cfg.token_ttl()).is_some());
        assert_eq!(cfg.token_ttl(), chrono::Duration::days(365));
    }
}
