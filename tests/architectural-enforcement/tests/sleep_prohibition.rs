//! Integration Test: No Sleep, No Wall Clock in the Core
//!
//! **Policy**: `zap-core` MUST NOT sleep or read the wall clock. Every timer
//! lives on its virtual timeline and fires from `advance`.
//! **Exceptions**: test code; interval-paced frame loops in `zap-player`.

use std::path::PathBuf;

use architectural_enforcement::{scan_directory, Policy, Violation};

fn workspace_dir(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

fn report(scope: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ CRITICAL: {scope} breaks the timing rules!\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    eprintln!("\n✅ ACCEPTABLE:");
    eprintln!("  - Scheduling on the animator timeline");
    eprintln!("  - tokio::time::interval frame pacing in zap-player");
    eprintln!("  - Test code (#[test] functions, #[cfg(test)] modules)");
    eprintln!("\n❌ FORBIDDEN:");
    eprintln!("  - thread::sleep / tokio::time::sleep in zap-core");
    eprintln!("  - Instant::now / SystemTime::now in zap-core");

    panic!(
        "\nFound {} violation(s) in {scope}.\nFix these before merging!",
        violations.len()
    );
}

#[test]
fn test_core_never_sleeps_or_reads_clock() {
    let dir = workspace_dir("zap/core/src");
    assert!(dir.exists(), "missing {}", dir.display());
    report("zap-core", &scan_directory(&dir, &Policy::CORE));
}

#[test]
fn test_player_does_not_sleep() {
    let dir = workspace_dir("zap/player/src");
    assert!(dir.exists(), "missing {}", dir.display());
    report("zap-player", &scan_directory(&dir, &Policy::HOST));
}
