use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig::from_env()?;
        if database.is_none() && environment == AppEnvironment::Production {
            return Err(ConfigError::MissingDatabase);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            auth: AuthConfig::from_env()?,
            cors: CorsConfig::from_env(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Hosted database endpoint and the service-role key used for every request.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

impl DatabaseConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = non_empty_var("SUPABASE_URL");
        let key = non_empty_var("SUPABASE_SERVICE_ROLE_KEY");

        match (url, key) {
            (Some(url), Some(service_role_key)) => Ok(Some(Self {
                url: url.trim_end_matches('/').to_string(),
                service_role_key,
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::PartialDatabase),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

/// Token signing settings plus the optional seed account for in-memory identity.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub demo_account: Option<DemoAccount>,
}

impl AuthConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = non_empty_var("SUPABASE_JWT_SECRET")
            .or_else(|| non_empty_var("JWT_SECRET"))
            .ok_or(ConfigError::MissingJwtSecret)?;

        let access_token_minutes = parse_integer("ACCESS_TOKEN_EXPIRE_MIN", 60)?;
        let refresh_token_days = parse_integer("REFRESH_TOKEN_EXPIRE_DAYS", 7)?;

        let demo_account = match (
            non_empty_var("APP_DEMO_EMAIL"),
            non_empty_var("APP_DEMO_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(DemoAccount { email, password }),
            _ => None,
        };

        Ok(Self {
            jwt_secret,
            access_token_minutes,
            refresh_token_days,
            demo_account,
        })
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_days", &self.refresh_token_days)
            .field(
                "demo_account",
                &self.demo_account.as_ref().map(|account| &account.email),
            )
            .finish()
    }
}

#[derive(Clone)]
pub struct DemoAccount {
    pub email: String,
    pub password: String,
}

/// Allowed browser origins; `None` means any origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Option<Vec<String>>,
}

impl CorsConfig {
    fn from_env() -> Self {
        let raw = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string());
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return Self {
                allowed_origins: None,
            };
        }

        let origins = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            allowed_origins: Some(origins),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_integer(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or(ConfigError::InvalidInteger { name, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidInteger { name: &'static str, value: String },
    MissingJwtSecret,
    PartialDatabase,
    MissingDatabase,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidInteger { name, value } => {
                write!(f, "{name} must be a positive integer, got '{value}'")
            }
            ConfigError::MissingJwtSecret => {
                write!(f, "missing JWT secret (SUPABASE_JWT_SECRET or JWT_SECRET)")
            }
            ConfigError::PartialDatabase => write!(
                f,
                "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set together"
            ),
            ConfigError::MissingDatabase => write!(
                f,
                "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY are required in production"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
