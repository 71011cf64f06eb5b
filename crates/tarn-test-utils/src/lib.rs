//! Test utilities for tarn crates.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

/// Error type accepted by command bodies.
pub type BodyError = Box<dyn Error + Send + Sync>;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Creates a temporary file with given content.
pub fn temp_file(content: &str) -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("test_file");
    std::fs::write(&path, content).expect("Failed to write temp file");
    (dir, path)
}

/// Writes `content` to `relative` under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

#[derive(Debug, Clone)]
struct Call {
    label: String,
    args: Vec<String>,
}

/// Records the order in which command bodies run.
///
/// Every body produced by a recorder appends its label when invoked, so a
/// test can assert on the exact call trace.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, label: &str, args: &[String]) {
        self.calls.lock().expect("recorder poisoned").push(Call {
            label: label.to_string(),
            args: args.to_vec(),
        });
    }

    /// Argumentless body that records `label` and succeeds.
    pub fn action(
        &self,
        label: &str,
    ) -> impl Fn() -> Result<(), BodyError> + Send + Sync + 'static {
        let recorder = self.clone();
        let label = label.to_string();
        move || {
            recorder.record(&label, &[]);
            Ok(())
        }
    }

    /// Argumentless body that records `label` and fails with `message`.
    pub fn failing(
        &self,
        label: &str,
        message: &str,
    ) -> impl Fn() -> Result<(), BodyError> + Send + Sync + 'static {
        let recorder = self.clone();
        let label = label.to_string();
        let message = message.to_string();
        move || {
            recorder.record(&label, &[]);
            Err(message.clone().into())
        }
    }

    /// Variadic body that records `label` with the arguments it received.
    pub fn args_action(
        &self,
        label: &str,
    ) -> impl Fn(&[String]) -> Result<(), BodyError> + Send + Sync + 'static {
        let recorder = self.clone();
        let label = label.to_string();
        move |args: &[String]| {
            recorder.record(&label, args);
            Ok(())
        }
    }

    /// Labels in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("recorder poisoned")
            .iter()
            .map(|c| c.label.clone())
            .collect()
    }

    /// Arguments received by the most recent invocation of `label`.
    pub fn last_args(&self, label: &str) -> Option<Vec<String>> {
        self.calls
            .lock()
            .expect("recorder poisoned")
            .iter()
            .rev()
            .find(|c| c.label == label)
            .map(|c| c.args.clone())
    }

    /// How many times `label` was invoked.
    pub fn count(&self, label: &str) -> usize {
        self.calls
            .lock()
            .expect("recorder poisoned")
            .iter()
            .filter(|c| c.label == label)
            .count()
    }
}

/// Converts string literals into an owned argument vector.
pub fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
        assert!(dir.path().is_dir());
    }

    #[test]
    fn test_write_file_creates_parents() {
        let dir = temp_dir();
        let path = write_file(dir.path(), "a/b/c.rs", "pub fn x() {}");
        assert!(path.exists());
    }

    #[test]
    fn test_recorder_tracks_order_and_args() {
        let recorder = CallRecorder::new();
        let build = recorder.action("build");
        let bench = recorder.args_action("bench");
        let broken = recorder.failing("broken", "boom");

        build().unwrap();
        bench(&args(&["time=7s"])).unwrap();
        assert_eq!(broken().unwrap_err().to_string(), "boom");

        assert_eq!(recorder.calls(), ["build", "bench", "broken"]);
        assert_eq!(recorder.last_args("bench"), Some(args(&["time=7s"])));
        assert_eq!(recorder.count("build"), 1);
    }

    proptest! {
        #[test]
        fn test_temp_file_content_roundtrip(content in "\\PC*") {
            let (_dir, path) = temp_file(&content);
            let read_content = std::fs::read_to_string(&path).unwrap();
            prop_assert_eq!(content, read_content);
        }
    }
}
