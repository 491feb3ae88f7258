// Copyright 2025 Webmobix Solutions AG
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUTHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod app;
mod auth;
mod config;
mod input;
mod sheets;
mod utils;

use app::Application;
use auth::Credentials;
use clap::{Parser, ValueEnum};
use config::{AppAction, Config};
use sheets::client::{ACTION_RETRY_BUDGET, GoogleSheetsClient, RUN_RETRY_BUDGET};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use utils::errors::{EXIT_APPLICATION_ERROR, WriterError};

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_env_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(name = "csv-google-sync")]
#[command(about = "Push CSV table extracts into Google Sheets")]
#[command(version)]
struct Cli {
    /// Data directory containing config.json and in/tables/
    #[arg(long, short = 'd')]
    data: PathBuf,

    /// Controls verbosity of log output (overrides RUST_LOG when provided)
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

fn init_logging(level: &LogLevel) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level.as_env_filter()))?;

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level) {
        eprintln!("Failed to initialize logging: {err}");
        return ExitCode::from(EXIT_APPLICATION_ERROR);
    }

    // Initialize default crypto provider for rustls
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        error!("Failed to install rustls crypto provider");
        return ExitCode::from(EXIT_APPLICATION_ERROR);
    }

    ExitCode::from(execute(cli).await)
}

async fn execute(cli: Cli) -> u8 {
    info!("Starting up");

    let config = match Config::load(&cli.data) {
        Ok(config) => config,
        Err(err) => return report_error(None, err),
    };
    let action = config.action;

    match bootstrap_and_run(config).await {
        Ok(result) => {
            // Non-run actions report their result object on stdout.
            if action != AppAction::Run {
                println!("{result}");
            }
            info!("✅ Writer finished successfully.");
            0
        }
        Err(err) => report_error(Some(action), err),
    }
}

async fn bootstrap_and_run(config: Config) -> Result<serde_json::Value, WriterError> {
    let credentials = Credentials::from_config(&config)?;
    let authenticator = credentials.into_authenticator().await?;

    let retry_budget = if config.action == AppAction::Run {
        RUN_RETRY_BUDGET
    } else {
        ACTION_RETRY_BUDGET
    };
    let client = GoogleSheetsClient::new(authenticator, retry_budget)?;

    Application::new(config, client).run().await
}

fn report_error(action: Option<AppAction>, err: WriterError) -> u8 {
    // Non-run actions emit a machine-readable error object on stdout.
    if err.is_user() && action.is_some_and(|action| action != AppAction::Run) {
        println!(
            "{}",
            serde_json::json!({
                "status": "error",
                "error": "User Error",
                "message": err.to_string(),
            })
        );
    } else {
        error!("❌ {err}");
    }

    err.exit_code()
}
