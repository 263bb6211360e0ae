use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub tokens: TokenSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
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

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Token signing settings.
///
/// Each token kind is signed with its own secret so that a leaked
/// access-token secret cannot be used to forge refresh tokens, and vice
/// versa. Expiries are in seconds.
#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64, // seconds (e.g., 604800 for 7 days)
}

impl TokenSettings {
    /// Startup validation: bad secret configuration must fail when the
    /// process boots, not at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "tokens.access_secret must not be empty".to_string(),
            ));
        }
        if self.refresh_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "tokens.refresh_secret must not be empty".to_string(),
            ));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::Message(
                "tokens.access_secret and tokens.refresh_secret must differ".to_string(),
            ));
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "tokens.access_token_expiry must be positive".to_string(),
            ));
        }
        if self.refresh_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "tokens.refresh_token_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from `configuration.*` with environment overrides
/// (`APP_TOKENS__ACCESS_SECRET`, etc.), so secrets can stay out of the
/// config file.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
