//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::records::Relation;

/// Zone lookup arguments.
#[derive(Debug, Args)]
pub struct ZoneCommand {
    /// Route path, optionally with a query string
    pub path: String,

    /// Referrer of the navigation, used for shared pages
    #[arg(short, long)]
    pub referrer: Option<String>,
}

/// Title lookup arguments.
#[derive(Debug, Args)]
pub struct TitleCommand {
    /// Route path
    pub path: String,
}

/// Arguments shared by the list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show entries whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl ListArgs {
    /// The search term, empty when none was given.
    #[must_use]
    pub fn term(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }
}

/// Family member commands.
#[derive(Debug, Subcommand)]
pub enum FamilyCommand {
    /// List family members
    List(ListArgs),

    /// Show one family member
    Show {
        /// Member id
        id: String,

        /// Print full ID card and phone numbers
        #[arg(long)]
        unmasked: bool,
    },

    /// Add a family member, or edit one with --id
    Save(FamilySaveArgs),

    /// Delete a family member
    Delete {
        /// Member id
        id: String,
    },
}

/// Fields of the add/edit family member form.
#[derive(Debug, Args)]
pub struct FamilySaveArgs {
    /// Id of the member to edit (omit to add)
    #[arg(long)]
    pub id: Option<String>,

    /// Full name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Relation to you (self, spouse, parent, child, sibling, grandchild, relative, other)
    #[arg(short, long)]
    pub relation: Option<Relation>,

    /// Resident ID card number
    #[arg(long)]
    pub id_card: Option<String>,

    /// Contact phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Hospital medical card number
    #[arg(long)]
    pub medical_card_no: Option<String>,

    /// Make this the default member
    #[arg(long)]
    pub default: bool,
}

/// Recognition history commands.
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List past recognitions, newest first
    List(ListArgs),

    /// Show one recognition result
    Show {
        /// Recognition id
        id: String,
    },

    /// Delete all recognition history
    Clear {
        /// Skip the confirmation notice
        #[arg(short, long)]
        yes: bool,
    },
}

/// Recognize command arguments.
#[derive(Debug, Args)]
pub struct RecognizeCommand {
    /// Image file to use as the camera frame
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,

    /// Fix the random seed of the sample recognizer
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dispense command arguments.
#[derive(Debug, Args)]
pub struct DispenseCommand {
    /// Medication the dispenser should open for
    #[arg(short, long)]
    pub medication_id: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file (uses default if not specified)
        file: Option<PathBuf>,
    },
}

/// Output format for list results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// Plain text (one name per line)
    Plain,
}
