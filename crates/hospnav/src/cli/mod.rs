//! Command-line interface for hospnav.
//!
//! This module provides the CLI structure for the `hospnav` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DispenseCommand, FamilyCommand, FamilySaveArgs, HistoryCommand, ListArgs,
    OutputFormat, RecognizeCommand, TitleCommand, ZoneCommand,
};

use crate::logging::Verbosity;

/// hospnav - Hospital navigation assistant
///
/// Route classification, family member profiles, medication recognition
/// history and the medication dispenser, from the command line.
#[derive(Debug, Parser)]
#[command(name = "hospnav")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show which zone a route belongs to
    Zone(ZoneCommand),

    /// Show the header title for a route
    Title(TitleCommand),

    /// Manage family member profiles
    #[command(subcommand)]
    Family(FamilyCommand),

    /// View or clear medication recognition history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Photograph a medication and recognise it
    Recognize(RecognizeCommand),

    /// List medications on the plan
    Medications(ListArgs),

    /// List hospital departments
    Departments(ListArgs),

    /// List emergency contacts
    Contacts(ListArgs),

    /// Open the medication dispenser
    Dispense(DispenseCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
