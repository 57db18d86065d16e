//! CLI argument parsing for xs-devs.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "xs-devs")]
#[command(about = "Tag block devices as in use by a storage subsystem")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Tag a device as in use by a system
    Tag { device: String, system: String },

    /// Release a device from one system, or from all of them
    Untag {
        device: String,
        system: Option<String>,
    },

    /// Show all udev tags of a device
    Show { device: String },

    /// Update tags for the paths of a multipath device
    Refresh { dm_device: String },
}

impl Command {
    /// Commands that must succeed even when the host is misconfigured.
    pub fn is_best_effort(&self) -> bool {
        matches!(self, Command::Untag { .. })
    }
}

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} tag <dev_name> <system>\n\
         \x20          - tag 'dev_name' as in use by 'system'\n\
         \x20          - ex: {prog} tag sdb xs\n\
         \x20      {prog} untag <dev_name> [system]\n\
         \x20          - untag 'dev_name' as no longer used by 'system'\n\
         \x20          - ex: {prog} untag sdb xs\n\
         \x20      {prog} show <dev_name>\n\
         \x20          - show all udev tags for 'dev_name'\n\
         \x20          - ex: {prog} show sdb\n\
         \x20      {prog} refresh <dm_dev_name>\n\
         \x20          - update tags for multipath device\n\
         \x20          - ex: {prog} refresh dm-1\n"
    )
}
