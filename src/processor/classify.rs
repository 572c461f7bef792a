use std::collections::BTreeSet;

use crate::command::EXEC_FAILED;
use crate::config::Config;

/// Decision for a command's exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Discard,
}

/// Exit-code filter built from the success and error code sets
///
/// With filtering disabled every code is kept. With filtering enabled a code
/// is kept only when it appears in either set. [`EXEC_FAILED`] gets no special
/// treatment: it is discarded unless one of the sets lists it.
#[derive(Debug, Clone, Copy)]
pub struct ExitCodePolicy<'a> {
    pub success: &'a BTreeSet<i32>,
    pub error: &'a BTreeSet<i32>,
    pub enabled: bool,
}

impl<'a> ExitCodePolicy<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        Self {
            success: &config.success_codes,
            error: &config.error_codes,
            enabled: config.filter_on_codes,
        }
    }

    pub fn classify(&self, exit_code: i32) -> Verdict {
        if !self.enabled || self.success.contains(&exit_code) || self.error.contains(&exit_code) {
            Verdict::Keep
        } else {
            Verdict::Discard
        }
    }

    /// Whether discarding `exit_code` deserves a hint to allow-list it
    pub fn needs_exec_failure_hint(&self, exit_code: i32) -> bool {
        exit_code == EXEC_FAILED && self.classify(exit_code) == Verdict::Discard
    }
}
