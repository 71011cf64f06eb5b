//! Shared helpers for CLI tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

/// A scratch project directory.
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        tarn_test_utils::write_file(self.path(), relative, content)
    }

    /// Write an executable script standing in for cargo and point the
    /// config at it.
    #[cfg(unix)]
    pub fn with_fake_cargo(self, script: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write("fake-cargo", &format!("#!/bin/sh\n{script}\n"));
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
        self.write(
            ".tarn/config.yaml",
            &format!("extensions:\n  cargo: {}\n", path.display()),
        );
        self
    }

    /// Put an executable script where the compiled project commands would
    /// be cached, so `tarn` runs them without a toolchain.
    #[cfg(unix)]
    pub fn plant_harness(&self, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Arc;

        use tarn_exec::RecordingRunner;
        use tarn_extension::ExtensionLoader;

        let root = self.path().canonicalize().expect("Failed to resolve project dir");
        let loader = ExtensionLoader::new(root, Arc::new(RecordingRunner::new()));
        let prepared = loader
            .prepare()
            .expect("Failed to prepare project commands")
            .expect("No project commands found");
        let binary = prepared.binary;
        std::fs::create_dir_all(binary.parent().expect("Binary has no parent"))
            .expect("Failed to create cache dir");
        std::fs::write(&binary, format!("#!/bin/sh\n{script}\n")).expect("Failed to write harness");
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make harness executable");
        binary
    }

    /// `tarn` running in this project with a clean environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tarn").expect("Binary not found");
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env_remove("TARN_ARGS")
            .env_remove("TARN_CONFIG")
            .env_remove("TARN_TIMEOUT")
            .env_remove("TARN_VERBOSE")
            .env_remove("TARN_DEBUG")
            .env_remove("TARN_LOG_LEVEL")
            .env_remove("TARN_LOG_FORMAT")
            .env_remove("TARN_LOG_FILE")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).unwrap_or_default()
    }
}
