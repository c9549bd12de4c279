//! Release discovery CLI command.

use blendervault::Engine;

use crate::error::CliError;

/// List releases on the configured mirror.
///
/// Without a major version, lists the major version folders; with one,
/// lists the downloadable archives inside it. An empty listing means the
/// mirror is reachable but has nothing matching, reported as such rather than
/// an error.
pub fn run(major_version: Option<String>) -> Result<(), CliError> {
    let engine = Engine::open()?;

    match major_version {
        None => {
            let majors = engine.list_major_versions()?;
            if majors.is_empty() {
                println!("No releases found on the mirror.");
                return Ok(());
            }
            for major in majors {
                println!("{}", major);
            }
        }
        Some(major) => {
            let minors = engine.list_minor_versions(&major)?;
            if minors.is_empty() {
                println!("No archives found for {}.", major);
                return Ok(());
            }
            for minor in minors {
                println!("{}", minor);
            }
        }
    }

    Ok(())
}
