// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// Migralog - changelog-based SQL migration runner
///
/// Applies versioned SQL scripts in order and records every applied script
/// in a changelog table inside the target database.
#[derive(Parser, Debug)]
#[command(name = "migralog")]
#[command(author = "Migralog Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Changelog-based SQL migration runner")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Initialize a new project:     migralog init --dialect sqlite
  2. Create a migration script:    migralog new \"create users\"
  3. Apply pending scripts:        migralog up
  4. Check migration status:       migralog status

For detailed help on each command, use: migralog <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (script log and debug tracing)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new migration project
    ///
    /// Creates the configuration file, the scripts directory and a first
    /// script that creates the changelog table.
    Init {
        /// Database dialect (postgresql, mysql, sqlite)
        #[arg(short, long, value_name = "DIALECT", default_value = "sqlite")]
        dialect: String,

        /// Force initialization even if config exists
        #[arg(short, long)]
        force: bool,
    },

    /// Create a new, empty migration script
    New {
        /// Description of the change
        #[arg(value_name = "DESCRIPTION")]
        description: String,
    },

    /// Apply pending migration scripts
    ///
    /// EXAMPLES:
    ///   # Apply everything that is pending
    ///   migralog up
    ///
    ///   # Apply only the next two scripts
    ///   migralog up --steps 2
    Up {
        /// Maximum number of scripts to apply
        #[arg(short, long, value_name = "N")]
        steps: Option<usize>,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },

    /// Undo the most recently applied migration scripts
    Down {
        /// Number of scripts to undo
        #[arg(short, long, value_name = "N", default_value_t = 1)]
        steps: usize,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },

    /// Show applied and pending migrations and report drift
    Status {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },
}
