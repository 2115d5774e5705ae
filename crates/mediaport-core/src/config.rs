//! Process configuration.
//!
//! Everything is read once at startup from the environment (a `.env` file is
//! honoured through `dotenvy`) into a typed [`Config`]. Request handling never
//! consults the environment.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BROKER_URL: &str = "tcp://localhost:61613";
const DEFAULT_BROKER_QUEUE: &str = "/queue/mediaport-media";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 512;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Connection settings for the message broker used by derivative actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub enabled: bool,
    /// `tcp://host:port`
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub queue: String,
}

impl BrokerConfig {
    /// Host and port parsed from [`BrokerConfig::url`].
    pub fn address(&self) -> Result<(String, u16), anyhow::Error> {
        let rest = self
            .url
            .strip_prefix("tcp://")
            .ok_or_else(|| anyhow::anyhow!("BROKER_URL must start with tcp:// (got {})", self.url))?;
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("BROKER_URL must include a port (got {})", self.url))?;
        if host.is_empty() {
            return Err(anyhow::anyhow!("BROKER_URL has an empty host"));
        }
        let port = port
            .trim_end_matches('/')
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("BROKER_URL has an invalid port: {}", e))?;
        Ok((host.to_string(), port))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    /// Roles allowed to update media they do not own.
    pub privileged_roles: Vec<String>,
    pub public_base_url: String,
    /// Storage scheme name -> root directory.
    pub storage_schemes: BTreeMap<String, PathBuf>,
    pub storage_public_url: String,
    pub derivative_styles_dir: Option<PathBuf>,
    pub bundles_config_path: PathBuf,
    pub max_upload_size_mb: usize,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub broker: BrokerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = match var("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("PORT is not a valid port: {}", e))?,
            None => DEFAULT_PORT,
        };

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

        let db_max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let db_timeout_seconds = var("DB_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DB_TIMEOUT_SECONDS);

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let privileged_roles = var("PRIVILEGED_ROLES")
            .unwrap_or_else(|| "administrator".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let storage_schemes = parse_storage_schemes(
            &var("STORAGE_SCHEMES")
                .unwrap_or_else(|| "public=./data/public,private=./data/private".to_string()),
        )?;

        let storage_public_url = var("STORAGE_PUBLIC_URL")
            .unwrap_or_else(|| format!("{}/files", public_base_url))
            .trim_end_matches('/')
            .to_string();

        let derivative_styles_dir = var("DERIVATIVE_STYLES_DIR").map(PathBuf::from);

        let bundles_config_path = var("BUNDLES_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config/bundles.json"));

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let http_concurrency_limit = var("HTTP_CONCURRENCY_LIMIT")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
            .max(1);

        let broker = BrokerConfig {
            enabled: var("BROKER_ENABLED")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
            url: var("BROKER_URL").unwrap_or_else(|| DEFAULT_BROKER_URL.to_string()),
            user: var("BROKER_USER"),
            password: var("BROKER_PASSWORD"),
            queue: var("BROKER_QUEUE").unwrap_or_else(|| DEFAULT_BROKER_QUEUE.to_string()),
        };

        Ok(Config {
            server_port,
            environment,
            database_url,
            db_max_connections,
            db_timeout_seconds,
            jwt_secret,
            privileged_roles,
            public_base_url,
            storage_schemes,
            storage_public_url,
            derivative_styles_dir,
            bundles_config_path,
            max_upload_size_mb,
            cors_origins,
            http_concurrency_limit,
            broker,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }
        if self.db_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("DB_TIMEOUT_SECONDS must be greater than 0"));
        }
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }
        if self.storage_schemes.is_empty() {
            return Err(anyhow::anyhow!(
                "STORAGE_SCHEMES must declare at least one scheme"
            ));
        }
        if self.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }
        if self.broker.enabled {
            self.broker.address()?;
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Styles root for cached derivatives; defaults to `<public root>/styles`.
    pub fn derivative_styles_root(&self) -> Option<PathBuf> {
        self.derivative_styles_dir.clone().or_else(|| {
            self.storage_schemes
                .get("public")
                .map(|root| root.join("styles"))
        })
    }
}

/// Parse `name=dir,name=dir` into a scheme map.
fn parse_storage_schemes(raw: &str) -> Result<BTreeMap<String, PathBuf>, anyhow::Error> {
    let mut schemes = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, dir) = entry.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("STORAGE_SCHEMES entry '{}' must look like name=/path", entry)
        })?;
        let name = name.trim().to_lowercase();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(anyhow::anyhow!("Invalid storage scheme name '{}'", name));
        }
        schemes.insert(name, PathBuf::from(dir.trim()));
    }
    Ok(schemes)
}
