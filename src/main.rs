use anyhow::Result;
use clap::Parser;
use std::env;
use std::process;
use strata_delta::cli::commands::diff::{DiffCommand, DiffCommandHandler};
use strata_delta::cli::commands::generate::{GenerateCommand, GenerateCommandHandler};
use strata_delta::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    init_tracing(cli.verbose);

    match run_command(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する（RUST_LOG が優先）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// コマンドを実行する
fn run_command(cli: Cli) -> Result<String> {
    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    match cli.command {
        Commands::Generate {
            old,
            new,
            description,
            dry_run,
            dialect,
            lowercase,
        } => {
            let handler = GenerateCommandHandler::new();
            let command = GenerateCommand {
                project_path,
                config_path: cli.config,
                old,
                new,
                description,
                dry_run,
                dialect,
                lowercase,
                format: cli.format,
            };
            handler.execute(&command)
        }

        Commands::Diff { old, new, dialect } => {
            let handler = DiffCommandHandler::new();
            let command = DiffCommand {
                project_path,
                config_path: cli.config,
                old,
                new,
                dialect,
                format: cli.format,
            };
            handler.execute(&command)
        }
    }
}
