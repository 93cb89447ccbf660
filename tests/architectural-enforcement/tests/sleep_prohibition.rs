//! Integration Test: Blocking Sleep Prohibition
//!
//! **Policy**: Code running on the async runtime MUST NOT block the thread.
//! `std::thread::sleep` is only allowed inside the device layer, whose calls
//! run on the dedicated actuator thread.
//! **Exceptions**: test code

use architectural_enforcement::{find_violations, is_under};

const MOTION_DIRS: &[&str] = &["motion/core/src", "motion/daemon/src"];

#[test]
fn test_no_blocking_sleep_outside_device_layer() {
    let mut violations = Vec::new();
    for dir in MOTION_DIRS {
        violations.extend(find_violations(dir, "thread::sleep(", |path| {
            is_under(path, "device")
        }));
    }

    if !violations.is_empty() {
        eprintln!("\n❌ Blocking sleep found outside the device layer!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ Use tokio::time::sleep for waits on the runtime,");
        eprintln!("   or move the blocking call behind RobotDevice.");

        panic!(
            "\nFound {} blocking sleep violation(s).\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_daemon_has_no_sleep_at_all() {
    let violations = find_violations("motion/daemon/src", "sleep(", |_| false);
    assert!(
        violations.is_empty(),
        "daemon should wait on input and signals only: {violations:?}"
    );
}
