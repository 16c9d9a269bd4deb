use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Isolated `KEEPER_HOME` for one test.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("keeper.toml")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.config_path();
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn keeper(&self) -> Command {
        let mut cmd = Command::cargo_bin("keeper").expect("binary");
        cmd.env("KEEPER_HOME", self.dir.path()).env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json`, assert success and return the envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .keeper()
            .args(args)
            .arg("--json")
            .output()
            .expect("run keeper");
        assert!(
            output.status.success(),
            "keeper {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("json output")
    }
}
