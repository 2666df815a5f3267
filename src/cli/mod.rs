//! CLI command definitions for taskify
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod auth;
pub mod tags;
pub mod tasks;

use crate::filter::{CompletionStatus, StatusFilter};
use crate::format::OutputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Markdown,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Taskify: personal task lists with dependencies and time tracking
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Output format (overrides config)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<FormatArg>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the user
    Signin(SigninArgs),

    /// Sign out and forget the remembered user
    Signout,

    /// Show the signed-in user
    Whoami,

    /// Create a task
    Add {
        /// Task text
        text: String,
    },

    /// List tasks, filtered and searched
    List(ListArgs),

    /// Toggle a task's completion
    Done {
        /// Task id or unique id prefix
        id: String,
    },

    /// Toggle a task's priority flag
    Priority { id: String },

    /// Set or clear a task's tag
    Tag {
        id: String,
        /// Tag name; omit to clear
        tag: Option<String>,
    },

    /// Set or clear a task's due date
    Due {
        id: String,
        /// Date as YYYY-MM-DD; omit to clear
        date: Option<String>,
    },

    /// Start or stop time tracking on a task
    Track { id: String },

    /// Manage subtasks
    #[command(subcommand)]
    Subtask(SubtaskCommand),

    /// Replace a task's prerequisites
    Deps {
        id: String,
        /// Prerequisite task ids; none clears the list
        depends_on: Vec<String>,
    },

    /// Set or clear a task's recurrence rule
    Recur {
        id: String,
        /// Rule text (e.g. "weekly"); omit to clear
        rule: Option<String>,
    },

    /// Delete a task
    Rm { id: String },

    /// List known tags, or add one
    Tags {
        #[command(subcommand)]
        action: Option<TagsCommand>,
    },

    /// Re-render the list on every change until Ctrl-C
    Watch(ListArgs),
}

#[derive(Args, Debug)]
pub struct SigninArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Profile photo URL
    #[arg(long)]
    pub photo_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SubtaskCommand {
    /// Append a subtask
    Add { id: String, text: String },

    /// Toggle a subtask's completion
    Toggle { id: String, subtask_id: String },
}

#[derive(Subcommand, Debug)]
pub enum TagsCommand {
    /// Add a tag to the known set
    Add { name: String },
}

/// Filter and search options shared by `list` and `watch`.
#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Status filter: all, priority, today, upcoming
    #[arg(short, long, value_parser = parse_status, default_value = "all")]
    pub status: StatusFilter,

    /// Case-insensitive search over task and subtask text
    #[arg(short = 'q', long)]
    pub search: Option<String>,

    /// Only these tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Due on or after (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Due on or before (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Completion: all, completed, incomplete
    #[arg(long, value_parser = parse_completion)]
    pub completion: Option<CompletionStatus>,
}

fn parse_status(s: &str) -> Result<StatusFilter, String> {
    StatusFilter::from_str(s)
        .ok_or_else(|| format!("invalid status '{}': expected all, priority, today or upcoming", s))
}

fn parse_completion(s: &str) -> Result<CompletionStatus, String> {
    CompletionStatus::from_str(s)
        .ok_or_else(|| format!("invalid completion '{}': expected all, completed or incomplete", s))
}
