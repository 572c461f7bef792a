//! External command execution
//!
//! The configured command template is run once per file through `sh -c`.
//! Every occurrence of [`FILE_PLACEHOLDER`] is replaced by the shell-quoted
//! path; without a placeholder the quoted path is appended as the last
//! argument, unless the command is one of the [`STANDALONE_COMMANDS`].
//!
//! The child's stdout and stderr both go to our stderr so the JSON result
//! stream on stdout stays clean.

use std::io;
use std::process::{Command, Stdio};
use tracing::trace;

use crate::cli::output::Output;

/// Token replaced by the quoted file path
pub const FILE_PLACEHOLDER: &str = "$FILE";

/// Exit code reported when the command could not be spawned or was killed by a signal
pub const EXEC_FAILED: i32 = -1;

/// Verbs that take no file argument
pub const STANDALONE_COMMANDS: &[&str] = &["exit", "true", "false"];

#[derive(Debug, Clone)]
pub struct CommandRunner {
    template: String,
}

impl CommandRunner {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Build the shell command line for one file
    pub fn command_line(&self, path: &str) -> String {
        if self.template.contains(FILE_PLACEHOLDER) {
            return self.template.replace(FILE_PLACEHOLDER, &shell_quote(path));
        }

        if is_standalone(&self.template) {
            self.template.clone()
        } else {
            format!("{} {}", self.template, shell_quote(path))
        }
    }

    /// Run the command for `path` and return its exit code
    ///
    /// Returns [`EXEC_FAILED`] when the shell cannot be spawned or the process
    /// is terminated by a signal.
    pub fn run(&self, path: &str, output: &Output) -> i32 {
        let command_line = self.command_line(path);
        trace!("Running `{}`", command_line);

        let status = Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::from(io::stderr()))
            .stderr(Stdio::inherit())
            .status();

        match status {
            Ok(status) => match status.code() {
                Some(code) => code,
                None => {
                    output.file_error(&format!(
                        "Error running command for {path}: terminated by {}",
                        describe_signal(&status)
                    ));
                    EXEC_FAILED
                }
            },
            Err(err) => {
                output.file_error(&format!("Error running command for {path}: {err}"));
                EXEC_FAILED
            }
        }
    }
}

fn is_standalone(command: &str) -> bool {
    STANDALONE_COMMANDS.iter().any(|verb| {
        command == *verb
            || command
                .strip_prefix(verb)
                .is_some_and(|rest| rest.starts_with(' '))
    })
}

/// Quote a path for POSIX `sh` using single quotes
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(unix)]
fn describe_signal(status: &std::process::ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(signal) => format!("signal {signal}"),
        None => "an unknown cause".to_string(),
    }
}

#[cfg(not(unix))]
fn describe_signal(_status: &std::process::ExitStatus) -> String {
    "an unknown cause".to_string()
}
