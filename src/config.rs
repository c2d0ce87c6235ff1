use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Which `Storage` backend the server wires up.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadBackend {
    Local,
    Cloudinary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    pub pool_size: u32,
    pub timeout_seconds: u64,
}

/// Placeholder shipped in `appsettings.example.toml`; refused at startup.
pub const SAMPLE_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub backend: UploadBackend,
    /// Directory the local backend writes into.
    pub dir: String,
    /// URL prefix the local files are served under.
    pub public_path: String,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    pub admin_username: String,
    /// Only the `seed` binary needs this; it refuses to run while empty.
    #[serde(default)]
    pub admin_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Reads `appsettings.*` (optional) and `STOREFRONT__*` environment
    /// variables on top of the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(
                Environment::with_prefix("STOREFRONT")
                    .prefix_separator("__")
                    .separator("__"),
            );

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        Self::build(builder)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("storage", "postgres")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("database.pool_size", 10)?
            .set_default("database.timeout_seconds", 30)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("uploads.backend", "local")?
            .set_default("uploads.dir", "public/uploads")?
            .set_default("uploads.public_path", "/uploads")?
            .set_default("uploads.max_bytes", 5 * 1024 * 1024)?
            .set_default("seed.admin_username", "admin")
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: AppConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.auth.jwt_secret.trim();
        if secret.is_empty() || secret == SAMPLE_JWT_SECRET {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set to a private value".to_string(),
            ));
        }
        if self.storage == StorageBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "database.url (or DATABASE_URL) must be set".to_string(),
            ));
        }
        if self.uploads.backend == UploadBackend::Cloudinary {
            let c = &self.cloudinary;
            if c.cloud_name.is_empty() || c.api_key.is_empty() || c.api_secret.is_empty() {
                return Err(ConfigError::Message(
                    "cloudinary.cloud_name, api_key and api_secret are required".to_string(),
                ));
            }
        }
        Ok(())
    }
}
