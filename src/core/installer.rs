//! Reinstall the `sbx` binaries from this source tree.
//!
//! The helper always runs the package manager from the project directory,
//! whatever the caller's working directory, and hands back its exit code untouched.

use crate::utils::error::{Result, SbxError};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Exit code reported when the child was killed by a signal and has none of its own.
const SIGNAL_EXIT_BASE: i32 = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InstallCommand {
    pub fn new<I, A>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for InstallCommand {
    /// `cargo install --path . --force`: build from the local tree and replace
    /// any installed copy, even at the same version.
    fn default() -> Self {
        Self::new("cargo", ["install", "--path", ".", "--force"])
    }
}

/// Directory holding this crate's manifest.
pub fn project_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Run `command` with `dir` as its working directory and return its exit code.
pub fn run_in(dir: &Path, command: &InstallCommand) -> Result<i32> {
    tracing::info!(
        "Running `{} {}` in {}",
        command.program,
        command.args.join(" "),
        dir.display()
    );

    let status = Command::new(&command.program)
        .args(&command.args)
        .current_dir(dir)
        .status()
        .map_err(|source| SbxError::InstallerSpawnError {
            program: command.program.clone(),
            source,
        })?;

    let code = exit_code(status);
    tracing::debug!("`{}` exited with {}", command.program, code);
    Ok(code)
}

pub fn install() -> Result<i32> {
    run_in(&project_dir(), &InstallCommand::default())
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }

    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> InstallCommand {
        InstallCommand::new("sh", ["-c", script])
    }

    #[test]
    fn test_default_command_reinstalls_from_local_tree() {
        let command = InstallCommand::default();
        assert_eq!(command.program, "cargo");
        assert_eq!(command.args, vec!["install", "--path", ".", "--force"]);
    }

    #[test]
    fn test_project_dir_holds_manifest() {
        assert!(project_dir().join("Cargo.toml").is_file());
    }

    #[test]
    fn test_exit_code_is_forwarded() {
        let dir = TempDir::new().unwrap();
        assert_eq!(run_in(dir.path(), &sh("exit 7")).unwrap(), 7);
        assert_eq!(run_in(dir.path(), &sh("exit 0")).unwrap(), 0);
    }

    #[test]
    fn test_runs_inside_target_directory() {
        let dir = TempDir::new().unwrap();
        let code = run_in(dir.path(), &sh("pwd -P > where.txt")).unwrap();
        assert_eq!(code, 0);

        let recorded = std::fs::read_to_string(dir.path().join("where.txt")).unwrap();
        assert_eq!(
            PathBuf::from(recorded.trim()),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_signal_maps_to_shell_convention() {
        let dir = TempDir::new().unwrap();
        assert_eq!(run_in(dir.path(), &sh("kill -9 $$")).unwrap(), 137);
    }

    #[test]
    fn test_missing_program_is_a_spawn_error() {
        let dir = TempDir::new().unwrap();
        let command = InstallCommand::new("sbx-no-such-package-manager", Vec::<String>::new());
        let err = run_in(dir.path(), &command).unwrap_err();
        assert_eq!(err.exit_code(), 127);
    }
}
