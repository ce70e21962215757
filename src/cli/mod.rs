// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use crate::core::config::Dialect;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// strata-delta - Schema Diff & Migration Synthesis CLI
///
/// Compares two DDL snapshots and writes the up/down migration between them.
#[derive(Parser, Debug)]
#[command(name = "strata-delta")]
#[command(author = "Stratum Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synthesize up/down migrations from two DDL snapshots")]
#[command(long_about = "strata-delta - Schema Diff & Migration Synthesis CLI

Reads an old and a new DDL snapshot (CREATE TABLE / ALTER TABLE / CREATE INDEX ...),
computes the per-table, per-column and per-index differences, and renders
forward (up) and reverse (down) migration scripts.

Supported dialects: MySQL (default), PostgreSQL")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Preview the changes:        strata-delta diff --old schema/v1.sql --new schema/v2.sql
  2. Preview the migration:      strata-delta generate --old schema/v1.sql --new schema/v2.sql --dry-run
  3. Write the migration files:  strata-delta generate --old schema/v1.sql --new schema/v2.sql -d \"add age\"

For detailed help on each command, use: strata-delta <command> --help")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
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
    /// Generate migration files from two DDL snapshots
    ///
    /// Builds both snapshots, diffs them and writes up.sql / down.sql
    /// into <migrations_dir>/<timestamp>_<description>/.
    ///
    /// EXAMPLES:
    ///   # Generate migration with description
    ///   strata-delta generate --old v1.sql --new v2.sql --description "add user age"
    ///
    ///   # Initial migration (empty old snapshot)
    ///   strata-delta generate --new schema.sql
    ///
    ///   # Dry run to preview SQL
    ///   strata-delta generate --old v1.sql --new v2.sql --dry-run
    Generate {
        /// Old snapshot (empty schema if omitted)
        #[arg(long, value_name = "FILE")]
        old: Option<PathBuf>,

        /// New snapshot
        #[arg(long, value_name = "FILE")]
        new: PathBuf,

        /// Description for the migration
        #[arg(short, long, value_name = "DESCRIPTION")]
        description: Option<String>,

        /// Dry run - show SQL without creating files
        #[arg(long)]
        dry_run: bool,

        /// Database dialect (mysql, postgresql); overrides the config file
        #[arg(long, value_name = "DIALECT")]
        dialect: Option<Dialect>,

        /// Render keywords in lowercase
        #[arg(long)]
        lowercase: bool,
    },

    /// Show per-entity differences between two DDL snapshots
    ///
    /// EXAMPLES:
    ///   # Text output
    ///   strata-delta diff --old v1.sql --new v2.sql
    ///
    ///   # JSON output
    ///   strata-delta diff --old v1.sql --new v2.sql --format json
    Diff {
        /// Old snapshot
        #[arg(long, value_name = "FILE")]
        old: PathBuf,

        /// New snapshot
        #[arg(long, value_name = "FILE")]
        new: PathBuf,

        /// Database dialect (mysql, postgresql); overrides the config file
        #[arg(long, value_name = "DIALECT")]
        dialect: Option<Dialect>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_args() {
        let cli = Cli::parse_from([
            "strata-delta",
            "generate",
            "--old",
            "v1.sql",
            "--new",
            "v2.sql",
            "--dialect",
            "postgres",
            "--lowercase",
        ]);

        match cli.command {
            Commands::Generate {
                old,
                new,
                dialect,
                lowercase,
                dry_run,
                ..
            } => {
                assert_eq!(old, Some(PathBuf::from("v1.sql")));
                assert_eq!(new, PathBuf::from("v2.sql"));
                assert_eq!(dialect, Some(Dialect::PostgreSQL));
                assert!(lowercase);
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
