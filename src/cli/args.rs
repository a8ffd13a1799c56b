//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::domain::CategoryId;

/// Client core for the goal-tracking platform: categories and rate-limit aware API calls
#[derive(Parser, Debug)]
#[command(name = "goalcore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding a local .goalcore.toml (default: cwd)
    #[arg(short = 'C', long, global = true, env = "GOALCORE_CONFIG_DIR", value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Override the API base url
    #[arg(long, global = true, value_hint = ValueHint::Url)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the category forest
    Categories {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// GET an API path with rate-limit retries and print the JSON payload
    Fetch {
        /// API path, e.g. goals/search-similar
        path: String,
        /// Query parameter (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
        /// Use bulk retry limits
        #[arg(long)]
        batch: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where categories come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read categories from a JSON file instead of the API
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub file: Option<String>,
    /// Use bulk retry limits
    #[arg(long)]
    pub batch: bool,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Print the category forest
    Tree {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show one category with its path and subcategories
    Show {
        /// Category id
        id: CategoryId,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Find a category by name or English name
    Find {
        /// Name to look for
        name: String,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the nested forest as JSON
    Json {
        /// Pretty-print
        #[arg(long)]
        pretty: bool,
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a config template
    Template,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
