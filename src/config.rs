use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub twitter: TwitterConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub workers: WorkerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public URL of this service, used to build the OAuth callback URL.
    pub base_url: String,
    /// Front-end origin. Used for CORS and for post-login redirects.
    pub frontend_url: String,
    /// Whether to set the `Secure` flag on cookies.
    /// If `None`, it is inferred from `frontend_url` (`https` -> true).
    /// Read from env var `COOKIE_SECURE` (accepted values: "true"/"false", "1"/"0", "yes"/"no").
    pub cookie_secure: Option<bool>,
    /// Preferred SameSite value for cookies. Read from env var `COOKIE_SAMESITE`
    /// (accepted values: "Lax", "Strict", "None").
    pub cookie_same_site: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    /// Without a client id both sign-in and automatic token refresh are unavailable.
    pub client_id: Option<String>,
    /// When set, token requests carry an HTTP Basic credential header.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub authorize_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign the OAuth `state` parameter.
    pub secret: String,
    pub session_expiration_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Allowed requests per second (per IP) for auth endpoints (e.g. /api/auth/sign-in/twitter)
    pub auth_per_second: u32,
    /// Burst size for auth endpoints
    pub auth_burst: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// How often (seconds) expired sessions and verifications are purged.
    pub session_cleanup_interval_seconds: u64,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("CORS_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                cookie_secure: env::var("COOKIE_SECURE").ok().and_then(|v| parse_bool(&v)),
                cookie_same_site: env::var("COOKIE_SAMESITE").ok(),
                base_url: base_url.clone(),
            },
            database: DatabaseConfig {
                url: non_empty("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingEnv("DATABASE_URL".to_string()))?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            twitter: TwitterConfig {
                client_id: non_empty("X_CLIENT_ID"),
                client_secret: non_empty("X_CLIENT_SECRET"),
                redirect_uri: env::var("X_REDIRECT_URI").unwrap_or_else(|_| {
                    format!(
                        "{}/api/auth/callback/twitter",
                        base_url.trim_end_matches('/')
                    )
                }),
                api_base_url: env::var("X_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.twitter.com".to_string()),
                authorize_url: env::var("X_AUTHORIZE_URL")
                    .unwrap_or_else(|_| "https://twitter.com/i/oauth2/authorize".to_string()),
            },
            auth: AuthConfig {
                secret: non_empty("AUTH_SECRET")
                    .ok_or_else(|| ConfigError::MissingEnv("AUTH_SECRET".to_string()))?,
                session_expiration_days: env::var("SESSION_EXPIRATION_DAYS")
                    .unwrap_or_else(|_| "7".to_string())
                    .parse()
                    .unwrap_or(7),
            },
            rate_limit: RateLimitConfig {
                auth_per_second: env::var("RATE_LIMIT_AUTH_PER_SECOND")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
                auth_burst: env::var("RATE_LIMIT_AUTH_BURST")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            workers: WorkerConfig {
                session_cleanup_interval_seconds: env::var("SESSION_CLEANUP_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()
                    .unwrap_or(3600u64),
            },
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn cookie_secure(&self) -> bool {
        self.server
            .cookie_secure
            .unwrap_or_else(|| self.server.frontend_url.starts_with("https://"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
                frontend_url: "http://localhost:3000".to_string(),
                cookie_secure: None,
                cookie_same_site: None,
            },
            database: DatabaseConfig {
                url: "sqlite://data/app.db".to_string(),
                max_connections: 5,
            },
            twitter: TwitterConfig {
                client_id: None,
                client_secret: None,
                redirect_uri: "http://localhost:8080/api/auth/callback/twitter".to_string(),
                api_base_url: "https://api.twitter.com".to_string(),
                authorize_url: "https://twitter.com/i/oauth2/authorize".to_string(),
            },
            auth: AuthConfig {
                secret: String::new(),
                session_expiration_days: 7,
            },
            rate_limit: RateLimitConfig {
                auth_per_second: 3,
                auth_burst: 10,
            },
            workers: WorkerConfig {
                session_cleanup_interval_seconds: 3600,
            },
        }
    }
}
