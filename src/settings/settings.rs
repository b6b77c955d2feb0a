use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub gate: Gate,
    pub http: Http,
    pub log: Log,
    pub member: Member,
    pub store: Store,
    pub withdrawal: Withdrawal,
}

#[derive(Deserialize)]
pub struct Auth {
    pub issuer: String,
    pub audience: String,
    pub signing_key: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub password_pattern: String,
    pub password_required_classes: Vec<String>,
    pub temp_password_length: usize,
}

// keeps the signing key out of the logs
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("password_pattern", &self.password_pattern)
            .field("password_required_classes", &self.password_required_classes)
            .field("temp_password_length", &self.temp_password_length)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Gate {
    pub check_denylist: bool,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub tls: bool,
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    pub backend: String, // "memory" or "mysql"
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "redis"
    pub url: Option<String>,
    pub prefix: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Withdrawal {
    pub kafka_brokers: Option<String>,
    pub topic: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Loads the settings file, then lets `TOKENKEEPER__SECTION__KEY` variables
/// override single values (e.g. `TOKENKEEPER__AUTH__SIGNING_KEY`).
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("TOKENKEEPER").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
