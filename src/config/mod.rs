//! Run configuration for hashcheck
//!
//! Raw [`Settings`] are layered from defaults, an optional settings file, the
//! environment and the command line (see [`core`]). They are then validated
//! into a [`Config`], which stays read-only for the whole run.

pub mod core;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::ConfigError;

pub use self::core::{Settings, SettingsOverrides};

/// Immutable per-run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Command template; empty means no command is run
    pub command: String,
    pub hashes_file: Option<PathBuf>,
    /// Audit mode: run the command only on files whose recorded hash differs
    pub audit: bool,
    /// Update mode: stage hashes of files whose command exited 0
    pub update: bool,
    pub success_codes: BTreeSet<i32>,
    pub error_codes: BTreeSet<i32>,
    /// Drop results whose exit code is in neither code set
    pub filter_on_codes: bool,
    pub workers: usize,
    pub show_progress: bool,
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: String::new(),
            hashes_file: None,
            audit: false,
            update: false,
            success_codes: BTreeSet::new(),
            error_codes: BTreeSet::new(),
            filter_on_codes: false,
            workers: num_cpus::get(),
            show_progress: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Config that runs `command` on every file
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Set both exit code sets and derive the filter flag from them
    pub fn with_exit_codes(
        mut self,
        success: impl IntoIterator<Item = i32>,
        error: impl IntoIterator<Item = i32>,
    ) -> Self {
        self.success_codes = success.into_iter().collect();
        self.error_codes = error.into_iter().collect();
        self.filter_on_codes = !self.success_codes.is_empty() || !self.error_codes.is_empty();
        self
    }

    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        let hashes_file = settings
            .hashes_file
            .filter(|path| !path.as_os_str().is_empty());

        if settings.command.is_empty() && !settings.audit {
            return Err(ConfigError::MissingCommand);
        }
        if settings.audit && hashes_file.is_none() {
            return Err(ConfigError::AuditRequiresHashesFile);
        }
        if settings.update && hashes_file.is_none() {
            return Err(ConfigError::UpdateRequiresHashesFile);
        }

        let workers = match settings.workers {
            0 => num_cpus::get(),
            workers => workers,
        };

        Ok(Config {
            command: settings.command,
            hashes_file,
            audit: settings.audit,
            update: settings.update,
            workers,
            show_progress: settings.progress,
            quiet: settings.quiet,
            ..Config::default()
        }
        .with_exit_codes(settings.success_exit_codes, settings.error_exit_codes))
    }
}

/// Parse a comma-separated exit code list
///
/// Returns the parsed codes and the entries that were not integers. Blank
/// entries are ignored.
pub fn parse_exit_codes(list: &str) -> (Vec<i32>, Vec<String>) {
    let mut codes = Vec::new();
    let mut invalid = Vec::new();

    for part in list.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.parse::<i32>() {
            Ok(code) => codes.push(code),
            Err(_) => invalid.push(part.to_string()),
        }
    }

    (codes, invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(command: &str) -> Settings {
        Settings {
            command: command.to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn test_parse_exit_codes() {
        assert_eq!(parse_exit_codes(""), (vec![], vec![]));
        assert_eq!(parse_exit_codes("0"), (vec![0], vec![]));
        assert_eq!(parse_exit_codes("0,1,2"), (vec![0, 1, 2], vec![]));
        assert_eq!(parse_exit_codes(" 0 , 2 ,, "), (vec![0, 2], vec![]));
        assert_eq!(parse_exit_codes("-1,1"), (vec![-1, 1], vec![]));
        assert_eq!(
            parse_exit_codes("0,abc,2"),
            (vec![0, 2], vec!["abc".to_string()])
        );
    }

    #[test]
    fn test_command_or_audit_required() {
        let err = Config::try_from(Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCommand));
    }

    #[test]
    fn test_audit_requires_hashes_file() {
        let settings = Settings {
            audit: true,
            ..Settings::default()
        };
        assert!(matches!(
            Config::try_from(settings).unwrap_err(),
            ConfigError::AuditRequiresHashesFile
        ));
    }

    #[test]
    fn test_update_requires_hashes_file() {
        let settings = Settings {
            update: true,
            // An empty path counts as no hashes file
            hashes_file: Some(PathBuf::new()),
            ..settings("true")
        };
        assert!(matches!(
            Config::try_from(settings).unwrap_err(),
            ConfigError::UpdateRequiresHashesFile
        ));
    }

    #[test]
    fn test_audit_without_command_is_valid() {
        let settings = Settings {
            audit: true,
            hashes_file: Some(PathBuf::from("hashes.jsonl")),
            ..Settings::default()
        };
        let config = Config::try_from(settings).unwrap();
        assert!(config.audit);
        assert!(!config.has_command());
    }

    #[test]
    fn test_zero_workers_means_cpu_count() {
        let config = Config::try_from(settings("true")).unwrap();
        assert_eq!(config.workers, num_cpus::get());

        let config = Config::try_from(Settings {
            workers: 3,
            ..settings("true")
        })
        .unwrap();
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_filter_enabled_by_either_code_set() {
        let config = Config::try_from(settings("true")).unwrap();
        assert!(!config.filter_on_codes);

        let config = Config::try_from(Settings {
            error_exit_codes: vec![2],
            ..settings("true")
        })
        .unwrap();
        assert!(config.filter_on_codes);
        assert!(config.success_codes.is_empty());
        assert!(config.error_codes.contains(&2));

        let config = Config::try_from(Settings {
            success_exit_codes: vec![0, 0],
            ..settings("true")
        })
        .unwrap();
        assert!(config.filter_on_codes);
        assert_eq!(config.success_codes.len(), 1);
    }
}
