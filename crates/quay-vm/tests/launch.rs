//! Launch tests against stand-in hypervisor binaries.
//!
//! Each stand-in is a shell script named `<prefix>-<arch>` so the launcher
//! resolves it like a real `qemu-system-<arch>`.

use quay_vm::{Drive, ExitError, Launcher, Machine, NetDev, VmError, DEFAULT_GRACE_PERIOD};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Generous enough for a loaded machine to run `sh -c 'exit 3'`.
const TEST_GRACE: Duration = Duration::from_millis(250);

/// Scripts are written once, before any test spawns, so no exec races with an
/// open write handle.
fn bin_prefix() -> &'static Path {
    static PREFIX: OnceLock<PathBuf> = OnceLock::new();
    PREFIX.get_or_init(|| {
        let dir = tempfile::tempdir().expect("create temp dir").keep();
        write_script(&dir.join("fake-fail"), "exit 3");
        write_script(&dir.join("fake-ok"), "exit 0");
        write_script(&dir.join("fake-run"), "exec sleep 30");
        dir.join("fake")
    })
}

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
}

fn launcher(arch: &str) -> Launcher {
    Launcher::new(arch)
        .binary_prefix(bin_prefix().to_string_lossy())
        .grace_period(TEST_GRACE)
}

fn sample_machine() -> Machine {
    let mut machine = Machine::new(2, 1024);
    machine.attach_drive(Drive::new("/vm.qcow2", "qcow2"));
    machine.attach_network_interface(NetDev::user("net0"));
    machine
}

#[tokio::test]
async fn test_immediate_failure_is_reported() {
    let start = Instant::now();
    let err = launcher("fail")
        .launch(&sample_machine())
        .await
        .expect_err("launch should fail");

    assert!(start.elapsed() >= TEST_GRACE);
    match &err {
        VmError::EarlyExit { binary, source } => {
            assert!(binary.ends_with("fake-fail"));
            match source {
                ExitError::Status(status) => assert_eq!(status.code(), Some(3)),
                other => panic!("unexpected exit error: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("fake-fail"));
}

#[tokio::test]
async fn test_running_process_returns_handle() {
    let start = Instant::now();
    let process = launcher("run")
        .launch(&sample_machine())
        .await
        .expect("launch should succeed");

    assert!(start.elapsed() >= TEST_GRACE);
    assert!(process.pid() > 0);
    assert_eq!(process.arch(), "run");
    assert!(process.is_alive());

    process.kill().expect("kill process");
}

#[tokio::test]
async fn test_default_grace_period_catches_immediate_failure() {
    let start = Instant::now();
    let err = Launcher::new("fail")
        .binary_prefix(bin_prefix().to_string_lossy())
        .launch(&sample_machine())
        .await
        .expect_err("launch should fail");

    assert!(start.elapsed() >= DEFAULT_GRACE_PERIOD);
    assert!(matches!(err, VmError::EarlyExit { .. }));
}

#[tokio::test]
async fn test_clean_exit_is_not_a_failure() {
    let result = launcher("ok").launch(&sample_machine()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_child_runs_in_new_session() {
    let process = launcher("run")
        .launch(&Machine::new(1, 128))
        .await
        .expect("launch should succeed");

    let pid = nix::unistd::Pid::from_raw(process.pid() as i32);
    let sid = nix::unistd::getsid(Some(pid)).expect("getsid");
    assert_eq!(sid, pid);
    assert_ne!(sid, nix::unistd::getsid(None).expect("own sid"));

    process.terminate().expect("terminate process");
}

#[tokio::test]
async fn test_missing_binary_is_spawn_error() {
    let err = Launcher::new("does-not-exist")
        .binary_prefix("/nonexistent/quay/qemu-system")
        .launch(&Machine::new(1, 128))
        .await
        .expect_err("spawn should fail");

    match err {
        VmError::Spawn { binary, source } => {
            assert_eq!(binary, "/nonexistent/quay/qemu-system-does-not-exist");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Requires a real QEMU installation.
#[tokio::test]
#[ignore = "requires qemu-system-x86_64"]
async fn test_real_qemu_without_disks() {
    let mut machine = Machine::new(1, 128);
    machine.attach_display("127.0.0.1", 5999);

    let process = machine
        .start("x86_64", false)
        .await
        .expect("Failed to start QEMU");
    assert!(process.is_alive());

    process.kill().expect("Failed to kill QEMU");
}
