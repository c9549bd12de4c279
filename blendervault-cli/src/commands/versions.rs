//! Registry management CLI commands: list, add, rename, remove, scan.

use std::path::{Path, PathBuf};

use blendervault::Engine;

use crate::error::CliError;

/// List registered installations, honoring the auto-fetch preference.
pub fn run_list() -> Result<(), CliError> {
    let mut engine = Engine::open()?;

    let discovered = engine.refresh_watched_folder()?;
    if !discovered.is_empty() {
        println!("Discovered {} new installation(s) in the versions folder.", discovered.len());
    }

    let entries = engine.registry().list();
    if entries.is_empty() {
        println!("No installations registered. Use 'blendervault add' or 'blendervault scan'.");
        return Ok(());
    }

    for entry in entries {
        // Paths are verified at time of use; flag stale ones instead of
        // failing the listing.
        let marker = if entry.executable.is_file() { "" } else { "  (missing)" };
        println!("{}  ->  {}{}", entry.name, entry.executable.display(), marker);
    }

    Ok(())
}

/// Register an installation.
pub fn run_add(name: &str, executable: &Path) -> Result<(), CliError> {
    let mut engine = Engine::open()?;
    engine.registry_mut().add(name, executable)?;

    println!("Registered '{}'.", name);
    Ok(())
}

/// Rename an installation and replace its executable path.
pub fn run_rename(name: &str, new_name: &str, executable: &Path) -> Result<(), CliError> {
    let mut engine = Engine::open()?;
    engine.registry_mut().rename(name, new_name, executable)?;

    println!("Renamed '{}' to '{}'.", name, new_name);
    Ok(())
}

/// Remove an installation from the registry.
///
/// Only the registration is removed; files on disk are left alone.
pub fn run_remove(name: &str) -> Result<(), CliError> {
    let mut engine = Engine::open()?;
    let removed = engine.registry_mut().remove(name)?;

    println!(
        "Removed '{}' ({} stays on disk).",
        removed.name,
        removed.executable.display()
    );
    Ok(())
}

/// Scan a folder for installations and register the new ones.
///
/// Without an explicit folder, the configured versions folder is scanned.
pub fn run_scan(folder: Option<PathBuf>) -> Result<(), CliError> {
    let mut engine = Engine::open()?;

    let folder = match folder {
        Some(folder) => folder,
        None => {
            let configured = engine.preferences().folder_path.clone();
            if configured.as_os_str().is_empty() {
                return Err(CliError::Config(
                    "No folder given and preferences.FolderPath is not set.".to_string(),
                ));
            }
            configured
        }
    };

    let discovered = engine.registry_mut().scan(&folder)?;
    if discovered.is_empty() {
        println!("Nothing new in {}.", folder.display());
    } else {
        for name in &discovered {
            println!("Registered '{}'.", name);
        }
        println!("{} installation(s) registered.", discovered.len());
    }

    Ok(())
}
