//! evbook - find and book EV charging stations from the terminal.

mod app;
mod format;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use evbook_core::{Config, Locale};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Log file name inside the data directory
const LOG_FILE: &str = "evbook.log";

#[derive(Parser)]
#[command(name = "evbook", version, about = "Find and book EV charging stations")]
struct Cli {
    /// Base URL of the booking API
    #[arg(long, env = "EVBOOK_API_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List charging stations
    Stations,
    /// Show booking history
    Bookings,
    /// Book a charging station
    Book {
        station_id: String,
        /// Duration in hours (1-24)
        #[arg(long, default_value_t = 1)]
        hours: u32,
    },
    /// Show or set the interface language (en, pt)
    Locale { locale: Option<Locale> },
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) if std::fs::create_dir_all(dir).is_ok() => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_dir = Config::data_dir().ok();
    let _log_guard = init_tracing(log_dir.as_deref());
    info!("evbook starting");

    let mut app = App::new(cli.api_url)?;
    app.run(cli.command).await
}
