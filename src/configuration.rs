use serde::Deserialize;

use crate::auth::SigningSecret;
use crate::error::ConfigError;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub platform: Platform,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where the service runs. Destructive admin operations are only allowed on `Dev`.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    Production,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level connection, used to create per-test databases.
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Authentication settings
#[derive(Deserialize, Clone)]
pub struct AuthSettings {
    /// Signing secret for access tokens. Validated by `signing_secret()`.
    #[serde(default)]
    pub secret: String,
    /// Revoke and reissue the refresh token on every refresh call.
    #[serde(default)]
    pub rotate_refresh_tokens: bool,
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

impl AuthSettings {
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        SigningSecret::new(self.secret.as_bytes())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_password_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Read `configuration.{yaml,toml,json}` from the working directory, then apply
/// `APP_`-prefixed environment overrides (`APP_AUTH__SECRET=...`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(settings.try_deserialize::<Settings>()?)
}
