//! Legacy-name redirector
//!
//! Installed under the old executable name; starts `UniGetUI.exe` from the same
//! directory with the same arguments and exits.

use anyhow::Context;
use tracing::error;
use winget_interop::{error::LaunchError, launcher, utils};

fn main() {
    std::process::exit(match run() {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            e.downcast_ref::<LaunchError>()
                .map_or(1, LaunchError::exit_code)
        }
    });
}

fn run() -> anyhow::Result<()> {
    if let Err(e) = utils::init_console_logging() {
        eprintln!("ERROR: Failed to initialize logging system: {e}");
    }
    launcher::redirect(std::env::args_os().skip(1)).context("Failed to redirect")?;
    Ok(())
}
