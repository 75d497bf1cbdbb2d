//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with a temporary configuration file
//! - Command builder helpers for common patterns

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with an isolated configuration file.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the configuration file (not created yet)
    pub file: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment with no configuration file yet.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("config.yml");
        Self { temp_dir, file }
    }

    /// Create a test environment whose file holds `contents`.
    pub fn with_file(contents: &str) -> Self {
        let env = Self::new();
        std::fs::write(&env.file, contents).expect("Failed to write config file");
        env
    }

    /// Get a bare command builder without pre-configured flags.
    ///
    /// Environment variables that would change the CLI's behavior are
    /// cleared so the host environment cannot leak in.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("arbor").expect("Failed to find arbor binary");
        cmd.env_remove("ARBOR_FILE")
            .env_remove("ARBOR_SEPARATOR")
            .env_remove("ARBOR_LOG_MODE");
        cmd
    }

    /// Get a command builder with `--file` pointing at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--file").arg(&self.file);
        cmd
    }

    /// The temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The current contents of the configuration file.
    pub fn contents(&self) -> String {
        std::fs::read_to_string(&self.file).expect("Failed to read config file")
    }

    /// Run `get` for `path` and return its trimmed stdout.
    pub fn get(&self, path: &str) -> String {
        let output = self
            .command()
            .arg("get")
            .arg(path)
            .output()
            .expect("Failed to run get command");

        assert!(
            output.status.success(),
            "Get failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim_end()
            .to_string()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
