//! Cache keys for compiled command harnesses.

use std::path::{Path, PathBuf};

/// Inputs that decide whether a compiled harness can be reused.
#[derive(Debug, Clone)]
pub struct FingerprintInput<'a> {
    /// Project root; source paths are hashed relative to it.
    pub root: &'a Path,
    /// `(path, contents)` for every source file.
    pub sources: &'a [(PathBuf, String)],
    /// Generated harness text (template and command table).
    pub harness: &'a str,
}

/// Hex blake3 digest over the tool version, target platform, harness and
/// every source path and content, truncated to 16 characters.
pub fn fingerprint(input: &FingerprintInput<'_>) -> String {
    let mut hasher = blake3::Hasher::new();
    field(&mut hasher, b"tarn", env!("CARGO_PKG_VERSION").as_bytes());
    field(&mut hasher, b"os", std::env::consts::OS.as_bytes());
    field(&mut hasher, b"arch", std::env::consts::ARCH.as_bytes());
    field(&mut hasher, b"harness", input.harness.as_bytes());

    for (path, content) in input.sources {
        let relative = path.strip_prefix(input.root).unwrap_or(path);
        field(&mut hasher, b"path", relative.to_string_lossy().as_bytes());
        field(&mut hasher, b"content", content.as_bytes());
    }

    let hash = hasher.finalize();
    hash.to_hex().as_str()[..16].to_string()
}

/// Length-prefixed so adjacent fields cannot run together.
fn field(hasher: &mut blake3::Hasher, tag: &[u8], value: &[u8]) {
    hasher.update(tag);
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(content: &str) -> Vec<(PathBuf, String)> {
        vec![(PathBuf::from("/project/tarnfile.rs"), content.to_string())]
    }

    fn digest(root: &str, sources: &[(PathBuf, String)], harness: &str) -> String {
        fingerprint(&FingerprintInput {
            root: Path::new(root),
            sources,
            harness,
        })
    }

    #[test]
    fn test_stable_for_same_input() {
        let s = sources("pub fn build() {}");
        assert_eq!(digest("/project", &s, "h"), digest("/project", &s, "h"));
        assert_eq!(digest("/project", &s, "h").len(), 16);
    }

    #[test]
    fn test_content_change_invalidates() {
        assert_ne!(
            digest("/project", &sources("pub fn build() {}"), "h"),
            digest("/project", &sources("pub fn build() { }"), "h")
        );
    }

    #[test]
    fn test_harness_change_invalidates() {
        let s = sources("pub fn build() {}");
        assert_ne!(digest("/project", &s, "v1"), digest("/project", &s, "v2"));
    }

    #[test]
    fn test_rename_invalidates() {
        let a = vec![(PathBuf::from("/project/tarnfiles/a.rs"), String::new())];
        let b = vec![(PathBuf::from("/project/tarnfiles/b.rs"), String::new())];
        assert_ne!(digest("/project", &a, "h"), digest("/project", &b, "h"));
    }

    #[test]
    fn test_moving_project_keeps_fingerprint() {
        let a = vec![(PathBuf::from("/one/tarnfile.rs"), "x".to_string())];
        let b = vec![(PathBuf::from("/two/tarnfile.rs"), "x".to_string())];
        assert_eq!(digest("/one", &a, "h"), digest("/two", &b, "h"));
    }
}
