//! `CommandRunner` backed by `std::process::Command`.

use std::process::{Command, Stdio};

use tracing::{debug, instrument};

use stratum_core::{
    application::{
        ApplicationError,
        ports::{CommandInvocation, CommandOutput, CommandRunner},
    },
    error::StratumResult,
};

/// Runs the program directly with its argument vector. No shell is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    #[instrument(skip_all, fields(command = %invocation.display()))]
    fn run(&self, invocation: &CommandInvocation) -> StratumResult<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = command
            .output()
            .map_err(|e| ApplicationError::CommandSpawn {
                command: invocation.display(),
                reason: e.to_string(),
            })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(exit_code = ?result.exit_code, "process finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::error::StratumError;

    #[test]
    fn unknown_program_fails_to_spawn() {
        let err = SystemCommandRunner::new()
            .run(&CommandInvocation::new("stratum-definitely-not-a-program"))
            .unwrap_err();
        assert!(matches!(
            err,
            StratumError::Application(ApplicationError::CommandSpawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_output() {
        let output = SystemCommandRunner::new()
            .run(&CommandInvocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]))
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[test]
    fn arguments_are_not_shell_split() {
        let output = SystemCommandRunner::new()
            .run(&CommandInvocation::new("echo").args(["a  b", "$HOME"]))
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "a  b $HOME\n");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_the_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = SystemCommandRunner::new()
            .run(&CommandInvocation::new("pwd").current_dir(dir.path()))
            .unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
