//! Integration Test: Device Boundary
//!
//! **Policy**:
//! - `RobotDevice::goto_target` is only called by the actuator worker in
//!   `device/adapter.rs`. Everything else goes through the async `Actuator`.
//! - `MoveCommand` values are only built in `device/traits.rs`, where the only
//!   constructor runs the safety clamp.
//!
//! **Exceptions**: test code

use std::path::Path;

use architectural_enforcement::{find_violations, Violation};

const CORE_SRC: &str = "motion/core/src";

fn report(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s) of: {rule}", violations.len());
}

#[test]
fn test_device_only_driven_by_adapter() {
    let violations = find_violations(CORE_SRC, ".goto_target(", |path: &Path| {
        path.ends_with("device/adapter.rs")
    });
    report(
        "RobotDevice::goto_target called outside the actuator worker",
        &violations,
    );

    let daemon = find_violations("motion/daemon/src", ".goto_target(", |_| false);
    report("RobotDevice::goto_target called from the daemon", &daemon);
}

#[test]
fn test_move_commands_only_built_by_clamp() {
    let violations = find_violations(CORE_SRC, "MoveCommand {", |path: &Path| {
        path.ends_with("device/traits.rs")
    });
    report("MoveCommand built without MoveCommand::from_step", &violations);
}
