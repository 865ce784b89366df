use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasktracker_core::error::AppError;
use tasktracker_core::model::TaskStatus;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasktracker add "Write report" --date 2026-08-10
    Add {
        title: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        #[arg(long)]
        description: Option<String>,
        /// not-started, in-progress or completed (defaults to not-started)
        #[arg(long)]
        status: Option<String>,
    },
    /// Edit fields of a task
    ///
    /// Example: tasktracker edit task-1 --status completed
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: tasktracker delete task-1
    Delete {
        id: String,
    },
    /// Show details of a task
    ///
    /// Example: tasktracker show task-1
    Show {
        id: String,
    },
    /// List tasks, optionally filtered by date, date range or status
    ///
    /// Example: tasktracker list --from 2026-08-01 --to 2026-08-31
    List {
        /// Exact due date (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        date: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Replace the whole collection with tasks from a JSON file
    ///
    /// Example: tasktracker import backup.json
    Import {
        file: PathBuf,
    },
    /// Write the collection to a JSON file
    ///
    /// Example: tasktracker export backup.json
    Export {
        file: PathBuf,
    },
    /// Reports over the task collection
    Stats {
        #[command(subcommand)]
        stats: StatsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Completion overview for a period (day, week, month or year)
    ///
    /// Example: tasktracker stats overview month
    Overview {
        period: Option<String>,
    },
    /// Completed-task trend over time (week, month or year)
    ///
    /// Example: tasktracker stats trend year
    Trend {
        period: Option<String>,
    },
    /// Recency-weighted productivity score over the last thirty days
    Score,
    /// Most productive weekday
    BestDay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    DataPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let key = canonicalize_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    match key.as_str() {
        "theme" => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::Theme,
            value,
        }),
        "data_path" => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::DataPath,
            value,
        }),
        other => Err(format!("unknown config field '{other}'")),
    }
}

/// Maps a user-supplied status name ("in-progress", "Not Started", ...)
/// onto the closed status enum.
pub fn parse_status(raw: &str) -> Result<TaskStatus, AppError> {
    let canonical = canonicalize_name(raw)
        .ok_or_else(|| AppError::invalid_input("status is required"))?;

    match canonical.as_str() {
        "not_started" => Ok(TaskStatus::NotStarted),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        other => Err(AppError::invalid_input(format!(
            "unknown status '{other}', expected not-started, in-progress or completed"
        ))),
    }
}

fn canonicalize_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
