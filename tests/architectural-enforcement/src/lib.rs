//! Architectural Enforcement
//!
//! Source scanners backing the integration tests in `tests/`:
//! - `zap-core` never sleeps and never reads the wall clock; time only moves
//!   through `advance`
//! - `zap-player` may pace frames with `tokio::time::interval` but must not
//!   sleep
//!
//! Test code (`#[test]` functions and anything below `#[cfg(test)]`) is
//! exempt when the policy allows it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// What a scanned directory may do
#[derive(Clone, Copy, Debug)]
pub struct Policy {
    /// Sleeps inside a `tokio::time::interval` loop are tolerated
    pub allow_interval: bool,
    /// Test code is skipped
    pub allow_tests: bool,
    /// `Instant::now()` / `SystemTime::now()` are violations
    pub forbid_wall_clock: bool,
}

impl Policy {
    /// Headless core: no sleeping, no clocks
    pub const CORE: Self = Self {
        allow_interval: false,
        allow_tests: true,
        forbid_wall_clock: true,
    };

    /// Real-time host: clocks and interval pacing allowed
    pub const HOST: Self = Self {
        allow_interval: true,
        allow_tests: true,
        forbid_wall_clock: false,
    };
}

/// Kind of rule broken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    Sleep,
    WallClock,
}

/// One offending line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub text: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ViolationKind::Sleep => "sleep",
            ViolationKind::WallClock => "wall clock",
        };
        write!(
            f,
            "{}:{} [{}] - {}",
            self.path.display(),
            self.line,
            kind,
            self.text
        )
    }
}

/// Scan every `.rs` file below `dir`
pub fn scan_directory(dir: &Path, policy: &Policy) -> Vec<Violation> {
    let mut violations = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(entry.path()) else {
            continue;
        };
        violations.extend(scan_source(entry.path(), &content, policy));
    }
    violations
}

/// Scan one file's contents
pub fn scan_source(path: &Path, content: &str, policy: &Policy) -> Vec<Violation> {
    let lines: Vec<&str> = content.lines().collect();
    let test_start = test_module_start(&lines);
    let mut violations = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        // Skip comments
        let code_part = line.split("//").next().unwrap_or(line);

        let kind = if code_part.contains("::sleep(") || code_part.contains(".sleep(") {
            ViolationKind::Sleep
        } else if policy.forbid_wall_clock
            && (code_part.contains("Instant::now(") || code_part.contains("SystemTime::now("))
        {
            ViolationKind::WallClock
        } else {
            continue;
        };

        if policy.allow_tests
            && (test_start.is_some_and(|start| idx > start) || is_in_test_function(&lines, idx))
        {
            continue;
        }

        if kind == ViolationKind::Sleep && policy.allow_interval && is_interval_pattern(&lines, idx)
        {
            continue;
        }

        violations.push(Violation {
            path: path.to_path_buf(),
            line: idx + 1,
            text: line.trim().to_string(),
            kind,
        });
    }
    violations
}

/// Index of the first `#[cfg(test)]` attribute
fn test_module_start(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| line.trim_start().starts_with("#[cfg(test)]"))
}

/// Check if line is inside a test function
fn is_in_test_function(lines: &[&str], current_idx: usize) -> bool {
    for line in lines[..current_idx].iter().rev() {
        let line = line.trim();

        if line.starts_with("#[test]") || line.starts_with("#[tokio::test") {
            return true;
        }

        if (line.starts_with("fn ") || line.starts_with("pub fn ")) && !line.contains("test") {
            return false;
        }

        // Stop at module boundaries
        if line.starts_with("mod ") || line.starts_with("impl ") {
            return false;
        }
    }
    false
}

/// Check if the sleep sits in a loop paced by `tokio::time::interval`
fn is_interval_pattern(lines: &[&str], current_idx: usize) -> bool {
    let start = current_idx.saturating_sub(20);
    let end = (current_idx + 5).min(lines.len());
    lines[start..end]
        .iter()
        .any(|line| line.contains(".tick()") || line.contains("tokio::time::interval"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(code: &str, policy: &Policy) -> Vec<Violation> {
        scan_source(Path::new("sample.rs"), code, policy)
    }

    #[test]
    fn test_sleep_is_flagged() {
        let code = "fn advance() {\n    std::thread::sleep(Duration::from_millis(10));\n}\n";
        let violations = scan(code, &Policy::CORE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].line, 2);
        assert_eq!(violations[0].kind, ViolationKind::Sleep);
    }

    #[test]
    fn test_wall_clock_only_flagged_for_core() {
        let code = "fn now() -> u64 {\n    let t = Instant::now();\n    0\n}\n";
        assert_eq!(scan(code, &Policy::CORE)[0].kind, ViolationKind::WallClock);
        assert!(scan(code, &Policy::HOST).is_empty());
    }

    #[test]
    fn test_comments_are_ignored() {
        let code = "// never call tokio::time::sleep(d) here\n/// Instant::now() is banned\n";
        assert!(scan(code, &Policy::CORE).is_empty());
    }

    #[test]
    fn test_test_module_is_exempt() {
        let code = "fn real() {}\n\n#[cfg(test)]\nmod tests {\n    fn helper() {\n        std::thread::sleep(d);\n    }\n}\n";
        assert!(scan(code, &Policy::CORE).is_empty());
    }

    #[test]
    fn test_test_function_detection() {
        let lines = [
            "#[tokio::test]",
            "async fn waits() {",
            "    tokio::time::sleep(d).await;",
            "}",
        ];
        assert!(is_in_test_function(&lines, 2));

        let lines = ["fn bad_function() {", "    tokio::time::sleep(d).await;", "}"];
        assert!(!is_in_test_function(&lines, 1));
    }

    #[test]
    fn test_interval_pacing_allowed_for_host() {
        let code = "async fn run() {\n    let mut frames = tokio::time::interval(frame);\n    loop {\n        frames.tick().await;\n        tokio::time::sleep(d).await;\n    }\n}\n";
        assert!(scan(code, &Policy::HOST).is_empty());
        assert_eq!(scan(code, &Policy::CORE).len(), 1);
    }
}
