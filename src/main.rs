use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use migralog::cli::commands::down::{DownCommand, DownCommandHandler};
use migralog::cli::commands::init::{InitCommand, InitCommandHandler};
use migralog::cli::commands::new::{NewCommand, NewCommandHandler};
use migralog::cli::commands::status::{StatusCommand, StatusCommandHandler};
use migralog::cli::commands::up::{UpCommand, UpCommandHandler};
use migralog::cli::{Cli, Commands};
use migralog::core::config::Dialect;
use std::env;
use std::process;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// トレーシングを初期化する
///
/// 既定はWARN。`--verbose` の場合はDEBUG。RUST_LOGで上書き可能。
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;

    match cli.command {
        Commands::Init { dialect, force } => {
            let dialect: Dialect = dialect.parse()?;
            let database_name = match dialect {
                Dialect::SQLite => "app.db".to_string(),
                other => format!("{}_db", other),
            };
            let handler = InitCommandHandler::new();
            let command = InitCommand {
                project_path,
                dialect,
                force,
                database_name,
            };
            handler.execute(&command)
        }

        Commands::New { description } => {
            let handler = NewCommandHandler::new();
            let command = NewCommand {
                project_path,
                config_path: cli.config,
                description,
            };
            handler.execute(&command)
        }

        Commands::Up { steps, env } => {
            let handler = UpCommandHandler::new();
            let command = UpCommand {
                project_path,
                config_path: cli.config,
                steps,
                env,
                verbose: cli.verbose,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Down { steps, env } => {
            let handler = DownCommandHandler::new();
            let command = DownCommand {
                project_path,
                config_path: cli.config,
                steps,
                env,
                verbose: cli.verbose,
                format: cli.format,
            };
            handler.execute(&command).await
        }

        Commands::Status { env } => {
            let handler = StatusCommandHandler::new();
            let command = StatusCommand {
                project_path,
                config_path: cli.config,
                env,
                format: cli.format,
            };
            handler.execute(&command).await
        }
    }
}
