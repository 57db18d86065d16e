//! xs-devs command dispatch.

pub mod cli;

use anyhow::Result;
use std::io::Write;
use xs_devs_core::{MarkerStore, Tagger};
use xs_devs_hal::SystemHal;

pub use cli::{usage, Cli, Command};

/// Execute one command, writing its user-facing output to `out`.
pub fn run<H: SystemHal + ?Sized>(
    command: &Command,
    hal: &H,
    store: &MarkerStore,
    out: &mut dyn Write,
) -> Result<()> {
    let tagger = Tagger::new(hal, store);
    match command {
        Command::Tag { device, system } => {
            let receipt = tagger.tag(device, system, true)?;
            log::info!("{} is in use by {}", receipt.device, receipt.system);
        }
        Command::Untag { device, system } => tagger.untag(device, system.as_deref()),
        Command::Show { device } => {
            for tag in tagger.show(device)? {
                writeln!(out, "{}", tag)?;
            }
        }
        Command::Refresh { dm_device } => {
            let class = tagger.refresh_multipath(dm_device)?;
            writeln!(out, "{}", class)?;
        }
    }
    Ok(())
}
