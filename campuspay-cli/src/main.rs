//! CampusPay CLI - your student wallet in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;
mod output;

use campuspay_core::config::API_URL_ENV;
use commands::{block, config, device, login, logs, pay, pin, status, transactions, vendor};

/// CampusPay - pay campus vendors from your terminal
#[derive(Parser)]
#[command(name = "cpay", version, about, long_about = None)]
struct Cli {
    /// Payment service base URL
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a campus identity token
    Login {
        /// Identity token (read from CAMPUSPAY_IDENTITY_TOKEN or prompted if omitted)
        #[arg(long)]
        token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show session status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the payment PIN
    Pin {
        #[command(subcommand)]
        command: pin::PinCommands,
    },

    /// Look up a vendor
    Vendor {
        /// Vendor ID (from the vendor's QR code)
        vendor_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pay a vendor
    Pay {
        /// Vendor ID
        vendor_id: String,
        /// Amount to pay
        amount: Decimal,
        /// PIN (prompted if omitted)
        #[arg(long)]
        pin: Option<String>,
        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON (requires --yes)
        #[arg(long)]
        json: bool,
    },

    /// Show balance and transaction history
    Transactions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Block the account (e.g. lost device)
    Block {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON (requires --force)
        #[arg(long)]
        json: bool,
    },

    /// Show the device details sent with payments
    Device,

    /// View and manage the local event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// View and change saved settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let api_url = cli.api_url.as_deref();
    if let Some(logger) = commands::get_logger() {
        let _ = logger.log_command(command_name(&cli.command));
    }

    match cli.command {
        Commands::Login { token, json } => login::run(api_url, token, json).await,
        Commands::Status { json } => status::run(api_url, json).await,
        Commands::Pin { command } => pin::run(api_url, command).await,
        Commands::Vendor { vendor_id, json } => vendor::run(api_url, &vendor_id, json).await,
        Commands::Pay {
            vendor_id,
            amount,
            pin,
            yes,
            json,
        } => pay::run(api_url, &vendor_id, amount, pin, yes, json).await,
        Commands::Transactions { json } => transactions::run(api_url, json).await,
        Commands::Block { force, json } => block::run(api_url, force, json).await,
        Commands::Device => device::run(),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Login { .. } => "login",
        Commands::Status { .. } => "status",
        Commands::Pin { .. } => "pin",
        Commands::Vendor { .. } => "vendor",
        Commands::Pay { .. } => "pay",
        Commands::Transactions { .. } => "transactions",
        Commands::Block { .. } => "block",
        Commands::Device => "device",
        Commands::Logs { .. } => "logs",
        Commands::Config { .. } => "config",
    }
}
