//! Download-and-install CLI command with live progress.

use std::sync::mpsc;
use std::thread;

use blendervault::manager::DownloadEvent;
use blendervault::Engine;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CliError;

/// Download a release archive, install it, and register the result.
///
/// The engine runs on a worker thread; this thread only drains progress
/// events into the terminal progress bar.
pub fn run(major_version: &str, minor_version: &str) -> Result<(), CliError> {
    let mut engine = Engine::open()?;

    println!("Installing {}/{} ...", major_version, minor_version);

    let (tx, rx) = mpsc::channel();
    let major = major_version.to_string();
    let minor = minor_version.to_string();
    let worker = thread::spawn(move || engine.install_release(&major, &minor, &tx));

    let mut bar: Option<ProgressBar> = None;
    for event in rx {
        match event {
            DownloadEvent::Started {
                total_size,
                worker_count,
                ..
            } => {
                if total_size > 0 {
                    let progress = ProgressBar::new(total_size);
                    progress.set_style(
                        ProgressStyle::with_template(
                            "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                        )
                        .expect("progress template is valid"),
                    );
                    bar = Some(progress);
                    println!("Downloading with {} worker(s)...", worker_count);
                } else {
                    println!("Size unknown; downloading in a single stream...");
                }
            }
            DownloadEvent::Progress { transferred, .. } => {
                if let Some(progress) = &bar {
                    progress.set_position(transferred);
                }
            }
        }
    }
    if let Some(progress) = bar.take() {
        progress.finish();
    }

    let entry = worker
        .join()
        .map_err(|_| CliError::Worker("install worker panicked".to_string()))??;

    println!(
        "Installed and registered '{}' ({}).",
        entry.name,
        entry.executable.display()
    );
    Ok(())
}
