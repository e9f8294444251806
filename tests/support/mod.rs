#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated data directory for one test, wired into every command.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write a `tally.toml` into the data directory.
    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("tally.toml");
        fs::write(&path, contents).expect("failed to write config");
        path
    }

    /// A tally command pointed at this environment's data directory, with
    /// ambient identity variables stripped for determinism. Context goes
    /// through the env-bound globals so argv stays `tally <command> ...`.
    pub fn cmd(&self) -> Command {
        let mut cmd = tally_cmd();
        cmd.env_remove("TALLY_USER");
        cmd.env("TALLY_DATA_DIR", self.dir.path());
        cmd
    }

    /// Same as `cmd`, but acting for a named user.
    pub fn cmd_as(&self, user: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.env("TALLY_USER", user);
        cmd
    }
}

pub fn tally_cmd() -> Command {
    Command::cargo_bin("tally").expect("tally binary")
}
