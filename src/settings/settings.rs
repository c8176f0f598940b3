use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub chat: Chat,
    pub http: Http,
    pub log: Log,
    pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "jwt"
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: String,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub cert_path: String,
    #[serde(default)]
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory" or "mysql"
    #[serde(default)]
    pub dsn: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    pub seed_path: Option<String>,
}

fn default_max_connections() -> u32 {
    10
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_settings_parse() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        assert_eq!(settings.storage.backend, "memory");
        assert_eq!(settings.auth.backend, "fake");
        assert!(!settings.http.tls);
        assert_eq!(settings.storage.seed_path.as_deref(), Some("settings/seed.json"));
    }

    #[test]
    fn release_settings_parse() {
        let settings = parse_settings(Some("settings/release.toml")).unwrap();
        assert_eq!(settings.storage.backend, "mysql");
        assert_eq!(settings.auth.backend, "jwt");
        assert_eq!(settings.storage.max_connections, 20);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
