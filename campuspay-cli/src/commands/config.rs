//! Config command - view and change settings.json

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use campuspay_core::config::{API_URL_ENV, DEFAULT_TIMEOUT_SECS};
use campuspay_core::Config;

use super::get_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the payment service URL
    SetUrl {
        /// Base URL, e.g. https://pay.example.edu/api
        url: String,
    },
    /// Remove the saved payment service URL
    UnsetUrl,
    /// Save the request timeout in seconds (0 disables it)
    SetTimeout {
        /// Timeout in seconds
        secs: u64,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;
    let mut config = Config::load(&data_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            let timeout = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "apiUrl": config.api_url,
                        "savedApiUrl": config.saved_api_url(),
                        "timeoutSecs": timeout,
                        "maxAuthRetries": config.max_auth_retries,
                    })
                );
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            println!(
                "  API URL: {}",
                config.api_url.as_deref().unwrap_or("(not set)")
            );
            if config.api_url.as_deref() != config.saved_api_url() {
                println!("  {}", format!("(overridden by {})", API_URL_ENV).dimmed());
            }
            println!("  Timeout: {}s", timeout);
            println!("  Data directory: {}", data_dir.display());
        }
        ConfigCommands::SetUrl { url } => {
            config.set_api_url(Some(&url))?;
            config.save(&data_dir)?;
            output::success(&format!(
                "API URL set to {}",
                config.saved_api_url().unwrap_or_default()
            ));
        }
        ConfigCommands::UnsetUrl => {
            config.set_api_url(None)?;
            config.save(&data_dir)?;
            output::success("API URL removed");
        }
        ConfigCommands::SetTimeout { secs } => {
            config.set_timeout_secs(Some(secs));
            config.save(&data_dir)?;
            if secs == 0 {
                output::success("Request timeout disabled");
            } else {
                output::success(&format!("Request timeout set to {}s", secs));
            }
        }
    }

    Ok(())
}
