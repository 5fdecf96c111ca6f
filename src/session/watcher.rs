//! One-shot watch for the helper's socket file.
//!
//! The watch is installed on the runtime directory before the helper starts
//! so the socket cannot appear unobserved. It reports the first sighting of
//! the exact socket path through a callback and stays silent afterwards.
//! Dropping the [`SocketWatch`] tears down the underlying inotify watch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::errors::{Result, SessionError};

pub struct SocketWatch {
    path: PathBuf,
    fired: Arc<AtomicBool>,
    _watcher: RecommendedWatcher,
}

impl SocketWatch {
    /// Watch `dir` for `socket_name`, calling `on_ready` once it exists.
    pub fn start<F>(dir: &Path, socket_name: &str, on_ready: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        if !dir.is_dir() {
            return Err(SessionError::RuntimeDirMissing(dir.to_path_buf()));
        }

        let path = dir.join(socket_name);
        let fired = Arc::new(AtomicBool::new(false));

        let target = path.clone();
        let flag = Arc::clone(&fired);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_) | EventKind::Remove(_)) {
                        return;
                    }
                    if event.paths.iter().any(|p| p.file_name() == target.file_name())
                        && target.exists()
                    {
                        fire(&flag, &target, &on_ready);
                    }
                }
                Err(e) => tracing::warn!("Socket watch error: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching {:?} for {}", dir, socket_name);

        Ok(Self {
            path,
            fired,
            _watcher: watcher,
        })
    }

    /// Path of the socket being waited for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the socket has been reported.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Report the socket now if it was created before the watch saw it.
    pub fn check_existing<F: Fn()>(&self, on_ready: F) {
        if self.path.exists() {
            fire(&self.fired, &self.path, &on_ready);
        }
    }
}

fn fire<F: Fn() + ?Sized>(flag: &AtomicBool, path: &Path, on_ready: &F) {
    if flag
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        tracing::info!("Socket {:?} is up", path);
        on_ready();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_reports_socket_once() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let watch = SocketWatch::start(dir.path(), "hawaii-master-test", move || {
            let _ = tx.send(());
        })
        .unwrap();

        File::create(dir.path().join("unrelated")).unwrap();
        File::create(dir.path().join("hawaii-master-test")).unwrap();
        std::fs::write(dir.path().join("hawaii-master-test"), b"x").unwrap();

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(watch.has_fired());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_existing_socket() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("sock")).unwrap();
        let watch = SocketWatch::start(dir.path(), "sock", || {}).unwrap();

        let (tx, rx) = mpsc::channel();
        watch.check_existing(move || {
            let _ = tx.send(());
        });
        assert!(rx.try_recv().is_ok());
        assert_eq!(watch.path(), dir.path().join("sock"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = SocketWatch::start(&missing, "sock", || {}).err().unwrap();
        assert!(matches!(err, SessionError::RuntimeDirMissing(p) if p == missing));
    }
}
