use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::session::*;

/// Stands in for weston: creates the socket named by `--socket=` and idles.
const HELPER: &str = r#"touch "$XDG_RUNTIME_DIR/${1#--socket=}"; exec sleep 30"#;

fn sh(script: &str, name: &str) -> ProcessCommand {
    ProcessCommand::new("/bin/sh").args(["-c", script, name])
}

fn config(dir: &Path, nested: bool, helper: ProcessCommand, compositor: ProcessCommand) -> SessionConfig {
    SessionConfig {
        nested,
        runtime_dir: dir.to_path_buf(),
        helper,
        compositor,
        screensaver: ProcessCommand::new("/bin/true"),
        stop_timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(20),
    }
}

/// Stands in for the compositor: records its pid in `compositor.pid` and idles.
const IDLE_COMPOSITOR: &str = r#"echo $$ > "$XDG_RUNTIME_DIR/compositor.tmp"; mv "$XDG_RUNTIME_DIR/compositor.tmp" "$XDG_RUNTIME_DIR/compositor.pid"; exec sleep 30"#;

/// Block until the idle compositor is up and return its pid.
fn wait_for_compositor(dir: &Path) -> libc::pid_t {
    let path = dir.join("compositor.pid");
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(pid) = fs::read_to_string(&path) {
            return pid.trim().parse().unwrap();
        }
        assert!(Instant::now() < deadline, "compositor never started");
        thread::sleep(Duration::from_millis(10));
    }
}

fn is_alive(pid: libc::pid_t) -> bool {
    unsafe { libc::kill(pid, 0) == 0 }
}

fn supervisor(config: SessionConfig) -> Supervisor {
    Supervisor::with_lookup(config, |_| None)
}

#[test]
fn test_nested_pipeline_start_and_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let compositor = sh(
        r#"printf '%s' "$WAYLAND_DISPLAY" > "$XDG_RUNTIME_DIR/compositor.env"; exit 1"#,
        "compositor",
    );
    let mut sup = supervisor(config(dir.path(), true, sh(HELPER, "helper"), compositor));

    let exit = sup.run().unwrap();
    assert_eq!(exit, SessionExit::CompositorExited(Some(1)));

    let sockets = sup.sockets().unwrap().clone();
    assert!(sockets.master.starts_with("hawaii-master-"));
    assert!(dir.path().join(&sockets.master).exists());
    let display = fs::read_to_string(dir.path().join("compositor.env")).unwrap();
    assert_eq!(display, sockets.master);

    // The helper was asked to terminate once the compositor went away
    let helper = sup.helper().unwrap();
    assert_eq!(helper.state(), ProcessState::Stopped);
    assert_eq!(helper.last_exit().unwrap().signal(), Some(libc::SIGTERM));

    let notifications = sup.take_notifications();
    assert_eq!(notifications.len(), 2);
    assert!(matches!(notifications[0], PipelineNotification::HelperStarted { .. }));
    assert!(matches!(notifications[1], PipelineNotification::CompositorStarted { .. }));
}

#[test]
fn test_nested_compositor_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let compositor = sh(r#"printf '%s ' "$@" > "$XDG_RUNTIME_DIR/compositor.args""#, "compositor");
    let mut sup = supervisor(config(dir.path(), true, sh(HELPER, "helper"), compositor));

    assert_eq!(sup.run().unwrap(), SessionExit::CompositorExited(Some(0)));
    let slave = sup.sockets().unwrap().slave.clone();
    let args = fs::read_to_string(dir.path().join("compositor.args")).unwrap();
    assert_eq!(args, format!("-platform wayland --socket={} ", slave));
}

#[test]
fn test_direct_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let compositor = sh(
        r#"printf '%s|%s|%s' "$XDG_CURRENT_DESKTOP" "$XDG_RUNTIME_DIR" "$KSCREEN_BACKEND" > "$XDG_RUNTIME_DIR/compositor.env""#,
        "compositor",
    );
    let mut sup = supervisor(config(dir.path(), false, ProcessCommand::new("/nonexistent"), compositor));

    assert_eq!(sup.run().unwrap(), SessionExit::CompositorExited(Some(0)));
    assert!(sup.helper().is_none());
    assert!(sup.sockets().is_none());

    let env = fs::read_to_string(dir.path().join("compositor.env")).unwrap();
    assert_eq!(env, format!("Hawaii|{}|QScreen", dir.path().display()));
}

#[test]
fn test_helper_launch_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut sup = supervisor(config(
        dir.path(),
        true,
        ProcessCommand::new("/nonexistent/weston"),
        sh("exit 0", "compositor"),
    ));

    let err = sup.run().unwrap_err();
    assert!(matches!(err, SessionError::LaunchFailed { ref name, .. } if name == "helper"));
    assert_eq!(sup.helper().unwrap().state(), ProcessState::Failed);
    assert!(sup.compositor().is_none());
}

#[test]
fn test_compositor_launch_failure_stops_helper() {
    let dir = tempfile::tempdir().unwrap();
    let mut sup = supervisor(config(
        dir.path(),
        true,
        sh(HELPER, "helper"),
        ProcessCommand::new("/nonexistent/hawaii"),
    ));

    let err = sup.run().unwrap_err();
    assert!(matches!(err, SessionError::LaunchFailed { ref name, .. } if name == "compositor"));
    assert_eq!(sup.compositor().unwrap().state(), ProcessState::Failed);
    assert!(!sup.helper().unwrap().is_running());
}

#[test]
fn test_missing_runtime_dir() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let mut sup = supervisor(config(&missing, false, sh("exit 0", "h"), sh("exit 0", "c")));
    assert!(matches!(sup.run(), Err(SessionError::RuntimeDirMissing(_))));
    assert!(sup.compositor().is_none());
}

#[test]
fn test_helper_exit_stops_compositor() {
    let dir = tempfile::tempdir().unwrap();
    // Exits once the compositor is up
    let helper = sh(
        r#"touch "$XDG_RUNTIME_DIR/${1#--socket=}"
        while [ ! -e "$XDG_RUNTIME_DIR/compositor.pid" ]; do sleep 0.05; done
        exit 2"#,
        "helper",
    );
    let mut sup = supervisor(config(dir.path(), true, helper, sh(IDLE_COMPOSITOR, "compositor")));

    assert_eq!(sup.run().unwrap(), SessionExit::HelperExited(Some(2)));
    let pid = wait_for_compositor(dir.path());
    assert!(!is_alive(pid));

    let compositor = sup.compositor().expect("compositor was launched");
    assert!(!compositor.is_running());
    assert_eq!(compositor.state(), ProcessState::Stopped);
    assert_eq!(compositor.last_exit().unwrap().signal(), Some(libc::SIGTERM));
}

#[test]
fn test_operator_stop() {
    let dir = tempfile::tempdir().unwrap();
    let mut sup = supervisor(config(
        dir.path(),
        true,
        sh(HELPER, "helper"),
        sh(IDLE_COMPOSITOR, "compositor"),
    ));
    let handle = sup.handle();

    let runtime_dir = dir.path().to_path_buf();
    let stopper = thread::spawn(move || {
        wait_for_compositor(&runtime_dir);
        handle.stop()
    });

    assert_eq!(sup.run().unwrap(), SessionExit::Stopped);
    assert!(stopper.join().unwrap());
    assert!(!sup.helper().unwrap().is_running());

    let notifications = sup.take_notifications();
    assert_eq!(notifications.last(), Some(&PipelineNotification::Stopped));
    let compositor = sup.compositor().expect("compositor was launched");
    assert_eq!(compositor.last_exit().unwrap().signal(), Some(libc::SIGTERM));
}

#[test]
fn test_log_out_runs_handler_before_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let mut sup = supervisor(config(dir.path(), false, sh("exit 0", "h"), sh(IDLE_COMPOSITOR, "compositor")));

    // Whether the compositor was still running when the handler ran
    let alive_at_logout = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&alive_at_logout);
    let pid_dir = dir.path().to_path_buf();
    sup.set_logout_handler(Box::new(move || {
        let pid = wait_for_compositor(&pid_dir);
        flag.store(is_alive(pid), Ordering::SeqCst);
    }));

    let handle = sup.handle();
    let runtime_dir = dir.path().to_path_buf();
    let requester = thread::spawn(move || {
        wait_for_compositor(&runtime_dir);
        handle.log_out()
    });

    assert_eq!(sup.run().unwrap(), SessionExit::Stopped);
    assert!(requester.join().unwrap());
    assert!(alive_at_logout.load(Ordering::SeqCst));

    let pid = wait_for_compositor(dir.path());
    assert!(!is_alive(pid));
    assert!(!sup.compositor().unwrap().is_running());
}

#[test]
fn test_handle_outliving_supervisor() {
    let dir = tempfile::tempdir().unwrap();
    let handle = supervisor(config(dir.path(), false, sh("exit 0", "h"), sh("exit 0", "c"))).handle();
    assert!(!handle.stop());
}
