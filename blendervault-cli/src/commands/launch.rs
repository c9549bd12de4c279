//! Launch CLI command.

use std::sync::mpsc;

use blendervault::launch::LaunchEvent;
use blendervault::Engine;

use crate::error::CliError;

/// Launch a registered installation and wait for it to exit.
pub fn run(name: &str) -> Result<(), CliError> {
    let engine = Engine::open()?;

    let (tx, rx) = mpsc::channel();
    let handle = engine.launch(name, tx)?;
    println!(
        "Launched '{}'; output goes to {}.",
        name,
        handle.log_path().display()
    );

    handle.wait();
    match rx.recv() {
        Ok(LaunchEvent::Exited {
            exit_code,
            success,
            log_path,
            ..
        }) => {
            if success {
                println!("Blender exited cleanly. Log: {}", log_path.display());
            } else {
                match exit_code {
                    Some(code) => {
                        println!("Blender exited with code {}. Log: {}", code, log_path.display())
                    }
                    None => println!(
                        "Blender was terminated by a signal. Log: {}",
                        log_path.display()
                    ),
                }
            }
            Ok(())
        }
        Err(_) => Err(CliError::Worker(
            "launch supervisor ended without reporting".to_string(),
        )),
    }
}
