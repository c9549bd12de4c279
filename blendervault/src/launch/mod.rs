//! Launch supervision for registered Blender copies.
//!
//! Spawns the chosen executable as a child process with both output streams
//! redirected into a fresh log file next to the executable, then waits for
//! exit on a dedicated thread. The caller's thread never blocks; completion
//! arrives as a [`LaunchEvent`] on the observer channel.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use thiserror::Error;

/// Log file written next to the launched executable, truncated per launch.
pub const LOG_FILE_NAME: &str = "blender_log.txt";

/// Result type for launch operations.
pub type LaunchResult<T> = Result<T, LaunchError>;

/// Errors that can occur when launching an installation.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The registered executable no longer exists.
    #[error("executable '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    /// The log file could not be created.
    #[error("failed to open log file {}: {source}", path.display())]
    Log { path: PathBuf, source: io::Error },

    /// The child process could not be spawned.
    #[error("failed to start '{}': {source}", path.display())]
    Spawn { path: PathBuf, source: io::Error },
}

/// Completion notification from a supervised launch.
#[derive(Debug, Clone)]
pub enum LaunchEvent {
    /// The child process exited.
    Exited {
        /// Executable that was launched.
        executable: PathBuf,
        /// Process exit code, when the platform reports one.
        exit_code: Option<i32>,
        /// Whether the process exited successfully.
        success: bool,
        /// Log file holding the interleaved stdout/stderr of the run.
        log_path: PathBuf,
    },
}

/// Handle on a running supervised process.
#[derive(Debug)]
pub struct LaunchHandle {
    log_path: PathBuf,
    supervisor: JoinHandle<()>,
}

impl LaunchHandle {
    /// Log file the child's output is redirected into.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Block until the supervised process has exited.
    ///
    /// Optional: the completion event arrives on the channel either way.
    pub fn wait(self) {
        let _ = self.supervisor.join();
    }
}

/// Starts registered executables and supervises them to completion.
#[derive(Debug, Default)]
pub struct LaunchSupervisor;

impl LaunchSupervisor {
    /// Launch `executable`, redirecting its output into a sibling log file.
    ///
    /// Fails fast with [`LaunchError::NotFound`] before spawning if the
    /// executable path does not exist. Runs asynchronously: the exit
    /// notification is delivered on `events` from the supervisor thread.
    pub fn launch(executable: &Path, events: Sender<LaunchEvent>) -> LaunchResult<LaunchHandle> {
        if !executable.is_file() {
            return Err(LaunchError::NotFound {
                path: executable.to_path_buf(),
            });
        }

        let log_path = executable
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(LOG_FILE_NAME);

        let log = File::create(&log_path).map_err(|e| LaunchError::Log {
            path: log_path.clone(),
            source: e,
        })?;
        let log_stderr = log.try_clone().map_err(|e| LaunchError::Log {
            path: log_path.clone(),
            source: e,
        })?;

        let mut child = Command::new(executable)
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_stderr))
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                path: executable.to_path_buf(),
                source: e,
            })?;

        tracing::info!("launched {} (logging to {})", executable.display(), log_path.display());

        let executable = executable.to_path_buf();
        let event_log_path = log_path.clone();
        let supervisor = thread::spawn(move || {
            let status = child.wait();
            let (exit_code, success) = match &status {
                Ok(status) => (status.code(), status.success()),
                Err(_) => (None, false),
            };

            match &status {
                Ok(status) if status.success() => {
                    tracing::info!("{} exited cleanly", executable.display());
                }
                Ok(status) => {
                    tracing::warn!("{} exited with {}", executable.display(), status);
                }
                Err(e) => {
                    tracing::error!("failed to wait on {}: {}", executable.display(), e);
                }
            }

            let _ = events.send(LaunchEvent::Exited {
                executable,
                exit_code,
                success,
                log_path: event_log_path,
            });
        });

        Ok(LaunchHandle {
            log_path,
            supervisor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn script_in(temp: &TempDir, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = temp.path().join("blender");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_missing_executable_fails_before_spawn() {
        let temp = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();

        let err = LaunchSupervisor::launch(&temp.path().join("absent"), tx).unwrap_err();

        assert!(matches!(err, LaunchError::NotFound { .. }));
        assert!(rx.try_recv().is_err(), "no event for a failed launch");
    }

    #[cfg(unix)]
    #[test]
    fn test_output_streams_land_in_sibling_log() {
        let temp = TempDir::new().unwrap();
        let exe = script_in(&temp, "echo to-stdout\necho to-stderr >&2");
        let (tx, rx) = mpsc::channel();

        let handle = LaunchSupervisor::launch(&exe, tx).unwrap();
        assert_eq!(handle.log_path(), temp.path().join(LOG_FILE_NAME));
        handle.wait();

        match rx.recv().unwrap() {
            LaunchEvent::Exited {
                success, log_path, ..
            } => {
                assert!(success);
                let log = std::fs::read_to_string(log_path).unwrap();
                assert!(log.contains("to-stdout"));
                assert!(log.contains("to-stderr"));
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_reported_as_failure() {
        let temp = TempDir::new().unwrap();
        let exe = script_in(&temp, "exit 3");
        let (tx, rx) = mpsc::channel();

        LaunchSupervisor::launch(&exe, tx).unwrap().wait();

        match rx.recv().unwrap() {
            LaunchEvent::Exited {
                exit_code, success, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert!(!success);
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_log_truncated_on_each_launch() {
        let temp = TempDir::new().unwrap();
        let exe = script_in(&temp, "echo run-output");
        let log_path = temp.path().join(LOG_FILE_NAME);
        std::fs::write(&log_path, "stale content from a previous run\n").unwrap();

        let (tx, rx) = mpsc::channel();
        LaunchSupervisor::launch(&exe, tx).unwrap().wait();
        rx.recv().unwrap();

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("run-output"));
        assert!(!log.contains("stale content"));
    }
}
