use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable prefix, e.g. `HASHCHECK_WORKERS=8`
pub const ENV_PREFIX: &str = "HASHCHECK_";

/// Settings file names looked up in the working directory
const SETTINGS_FILES: [&str; 3] = ["hashcheck.toml", "hashcheck.json", "hashcheck.yaml"];

/// Raw, layered settings before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Command template run on each file (empty = no command)
    pub command: String,
    /// Hashes file (JSON Lines)
    pub hashes_file: Option<PathBuf>,
    /// Only run the command on files whose recorded hash changed
    pub audit: bool,
    /// Record hashes of files whose command exited 0
    pub update: bool,
    pub success_exit_codes: Vec<i32>,
    pub error_exit_codes: Vec<i32>,
    /// Worker threads (0 = one per CPU)
    pub workers: usize,
    pub progress: bool,
    pub quiet: bool,
}

/// Settings given explicitly on the command line
///
/// Only fields that are `Some` override the lower layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_exit_codes: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_exit_codes: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
}

impl Settings {
    /// Load settings with the standard layering:
    /// defaults, settings file, `HASHCHECK_*` environment, command line
    pub fn load(
        custom_config: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<Self, ConfigError> {
        let figment = Self::figment(custom_config).merge(Serialized::defaults(overrides));
        Ok(figment.extract()?)
    }

    /// Build the provider stack without command-line overrides
    pub fn figment(custom_config: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

        // A custom settings file replaces the working-directory lookup
        if let Some(custom_path) = custom_config {
            figment = match custom_path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            figment = figment
                .merge(Toml::file(SETTINGS_FILES[0]))
                .merge(Json::file(SETTINGS_FILES[1]))
                .merge(Yaml::file(SETTINGS_FILES[2]));
        }

        // Environment variables beat files
        figment.merge(Env::prefixed(ENV_PREFIX))
    }
}
