use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::rchain::provider::Provider;

/// Credential variables read at start-up, one per provider.
pub const CREDENTIAL_ENVS: [&str; 4] = [
    "OPENAI_API_KEY",
    "GOOGLE_API_KEY",
    "ANTHROPIC_API_KEY",
    "DEEPSEEK_API_KEY",
];

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Provider credentials keyed by environment variable name.
///
/// Blank values are treated as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: BTreeMap<&'static str, String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_pairs(
            CREDENTIAL_ENVS
                .iter()
                .filter_map(|name| env::var(name).ok().map(|value| (*name, value))),
        )
    }

    pub fn from_pairs<'a, I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<String>,
    {
        let mut keys = BTreeMap::new();
        for (name, value) in pairs {
            let Some(slot) = CREDENTIAL_ENVS.iter().find(|known| **known == name) else {
                continue;
            };
            let value: String = value.into();
            let value = value.trim();
            if !value.is_empty() {
                keys.insert(*slot, value.to_string());
            }
        }
        Self { keys }
    }

    pub fn get(&self, key_env: &str) -> Option<&str> {
        self.keys.get(key_env).map(String::as_str)
    }

    pub fn is_present(&self, key_env: &str) -> bool {
        self.keys.contains_key(key_env)
    }

    /// Presence flags for every known variable, never the values.
    pub fn presence(&self) -> Vec<(&'static str, bool)> {
        CREDENTIAL_ENVS
            .iter()
            .map(|name| (*name, self.is_present(name)))
            .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.keys.keys().map(|name| (name, "<redacted>")))
            .finish()
    }
}

/// Provider base URLs. Overridable so tests can point at a local mock.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub openai: String,
    pub deepseek: String,
    pub anthropic: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openai: OPENAI_BASE_URL.to_string(),
            deepseek: DEEPSEEK_BASE_URL.to_string(),
            anthropic: ANTHROPIC_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai: env_or("OPENAI_BASE_URL", defaults.openai),
            deepseek: env_or("DEEPSEEK_BASE_URL", defaults.deepseek),
            anthropic: env_or("ANTHROPIC_BASE_URL", defaults.anthropic),
        }
    }

    pub fn chat_base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::Openai => &self.openai,
            Provider::Deepseek => &self.deepseek,
            Provider::Anthropic => &self.anthropic,
        }
    }
}

fn env_or(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
}

/// Process-wide configuration, built once at entry and passed down.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
}

impl Settings {
    /// Loads `.env` (if any) into the environment, then snapshots it.
    pub fn load() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self {
            credentials: Credentials::from_env(),
            endpoints: Endpoints::from_env(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Config file '{}' does not contain a [profiles] section.", .0.display())]
    NoProfiles(PathBuf),
    #[error("Profile '{name}' not found in config file '{}'.", .path.display())]
    ProfileNotFound { name: String, path: PathBuf },
    #[error(
        "Invalid profile provider '{value}' in profile '{profile}'. Supported values: {}.",
        Provider::SUPPORTED
    )]
    InvalidProvider { profile: String, value: String },
    #[error("Cannot resolve config path: set APIKIT_CONFIG or HOME/XDG_CONFIG_HOME.")]
    NoConfigPath,
}

/// Optional per-profile overrides of the fixed call parameters.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Option<u64>,
}

impl ProfileConfig {
    pub fn provider(&self, profile: &str) -> Result<Option<Provider>, ConfigError> {
        match self.provider.as_deref() {
            None => Ok(None),
            Some(value) => Provider::parse(value)
                .map(Some)
                .ok_or_else(|| ConfigError::InvalidProvider {
                    profile: profile.to_string(),
                    value: value.to_string(),
                }),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    profiles: Option<HashMap<String, ProfileConfig>>,
}

fn read_config_file() -> Result<(PathBuf, ConfigFile), ConfigError> {
    let path = config_path()?;
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    Ok((path, config))
}

pub fn load_profile(name: &str) -> Result<ProfileConfig, ConfigError> {
    let (path, config) = read_config_file()?;
    let profiles = config
        .profiles
        .ok_or_else(|| ConfigError::NoProfiles(path.clone()))?;

    let profile = profiles
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.to_string(),
            path,
        })?;
    profile.provider(name)?;
    Ok(profile)
}

/// Parses the config file and validates either one profile or all of them.
pub fn validate_config(profile: Option<&str>) -> Result<PathBuf, ConfigError> {
    let (path, config) = read_config_file()?;
    let profiles = config.profiles.unwrap_or_default();

    match profile {
        Some(name) => {
            let selected = profiles
                .get(name)
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                    path: path.clone(),
                })?;
            selected.provider(name)?;
        }
        None => {
            for (name, selected) in &profiles {
                selected.provider(name)?;
            }
        }
    }

    Ok(path)
}

fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = env::var("APIKIT_CONFIG") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed).join("apikit").join("config.toml"));
        }
    }

    let home = env::var("HOME").map_err(|_| ConfigError::NoConfigPath)?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("apikit")
        .join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_unknown_credentials_are_dropped() {
        let credentials = Credentials::from_pairs([
            ("OPENAI_API_KEY", "  sk-test  "),
            ("DEEPSEEK_API_KEY", "   "),
            ("SOMETHING_ELSE", "x"),
        ]);

        assert_eq!(credentials.get("OPENAI_API_KEY"), Some("sk-test"));
        assert!(!credentials.is_present("DEEPSEEK_API_KEY"));
        assert!(credentials.get("SOMETHING_ELSE").is_none());
    }

    #[test]
    fn presence_lists_every_provider_without_values() {
        let credentials = Credentials::from_pairs([("ANTHROPIC_API_KEY", "secret")]);
        let presence = credentials.presence();

        assert_eq!(presence.len(), CREDENTIAL_ENVS.len());
        assert!(presence.contains(&("ANTHROPIC_API_KEY", true)));
        assert!(presence.contains(&("OPENAI_API_KEY", false)));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let credentials = Credentials::from_pairs([("OPENAI_API_KEY", "sk-very-secret")]);
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("OPENAI_API_KEY"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn profile_provider_is_validated() {
        let profile = ProfileConfig {
            provider: Some("unknown".to_string()),
            ..ProfileConfig::default()
        };
        let err = profile.provider("bad").expect_err("unknown provider");
        assert!(err.to_string().contains("Invalid profile provider 'unknown'"));
    }

    #[test]
    fn endpoints_route_each_provider() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.chat_base_url(Provider::Openai), OPENAI_BASE_URL);
        assert_eq!(endpoints.chat_base_url(Provider::Deepseek), DEEPSEEK_BASE_URL);
        assert_eq!(endpoints.chat_base_url(Provider::Anthropic), ANTHROPIC_BASE_URL);
    }
}
