//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No blocking sleep outside the device layer
//! - The synchronous device trait is only driven by the actuator worker
//! - Device commands are only built through the safety clamp
//!
//! The helpers here scan workspace sources line by line. They are heuristics,
//! not a parser: comments are stripped and everything after `#[cfg(test)]`
//! counts as test code.

use std::fs;
use std::path::{Path, PathBuf};

/// A source line that broke a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File the line is in
    pub path: PathBuf,
    /// 1-based line number
    pub line_number: usize,
    /// The offending line, trimmed
    pub line: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}",
            self.path.display(),
            self.line_number,
            self.line
        )
    }
}

/// Workspace root (two levels above this package)
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir`, relative to the workspace root
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect()
}

/// Index of the first line of the file's test section, if any
#[must_use]
pub fn test_section_start(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.trim_start().starts_with("#[cfg(test)]"))
}

/// Code part of a line, without trailing `//` comments
#[must_use]
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Lines of `source` that contain `needle` in production code
#[must_use]
pub fn production_matches(source: &str, needle: &str) -> Vec<(usize, String)> {
    let lines: Vec<&str> = source.lines().collect();
    let end = test_section_start(&lines).unwrap_or(lines.len());

    lines[..end]
        .iter()
        .enumerate()
        .filter(|(_, line)| code_part(line).contains(needle))
        .map(|(idx, line)| (idx + 1, line.trim().to_string()))
        .collect()
}

/// Scan every file under `dir` for `needle` in production code, skipping
/// files for which `allowed` returns true
#[must_use]
pub fn find_violations(dir: &str, needle: &str, allowed: impl Fn(&Path) -> bool) -> Vec<Violation> {
    let mut violations = Vec::new();

    for path in rust_files(dir) {
        if allowed(&path) {
            continue;
        }
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (line_number, line) in production_matches(&content, needle) {
            violations.push(Violation {
                path: path.clone(),
                line_number,
                line,
            });
        }
    }

    violations
}

/// Whether `path` lies inside a directory named `component`
#[must_use]
pub fn is_under(path: &Path, component: &str) -> bool {
    path.components().any(|c| c.as_os_str() == component)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_matches_skip_tests_and_comments() {
        let source = "\
fn run() {
    // std::thread::sleep(x) in a comment
    std::thread::sleep(x);
}

#[cfg(test)]
mod tests {
    fn helper() { std::thread::sleep(y); }
}
";
        let matches = production_matches(source, "thread::sleep(");
        assert_eq!(matches, vec![(3, "std::thread::sleep(x);".to_string())]);
    }

    #[test]
    fn test_is_under() {
        assert!(is_under(Path::new("motion/core/src/device/simulated.rs"), "device"));
        assert!(!is_under(Path::new("motion/core/src/controller.rs"), "device"));
    }

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }
}
