//! CLI command implementations

pub mod block;
pub mod config;
pub mod device;
pub mod login;
pub mod logs;
pub mod pay;
pub mod pin;
pub mod status;
pub mod transactions;
pub mod vendor;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::{Confirm, Password};

use campuspay_core::{CampusPayContext, EntryPoint, Error, LogEvent, LoggingService, Pin};

/// Environment variable pointing at the data directory
pub const DATA_DIR_ENV: &str = "CAMPUSPAY_DIR";

/// Environment variable holding the session database passphrase
pub const SESSION_PASSWORD_ENV: &str = "CAMPUSPAY_SESSION_PASSWORD";

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: Option<&LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".campuspay"))
}

/// Open the session store, event log and payment client
pub fn get_context(api_url: Option<&str>) -> Result<CampusPayContext> {
    let data_dir = get_data_dir()?;
    let passphrase = std::env::var(SESSION_PASSWORD_ENV)
        .ok()
        .filter(|p| !p.is_empty());
    log::debug!(
        "[cpay] Data directory {:?} (session passphrase set: {})",
        data_dir,
        passphrase.is_some()
    );

    CampusPayContext::new(&data_dir, passphrase.as_deref(), api_url, EntryPoint::Cli)
        .context("Failed to initialize campuspay context")
}

/// Take a PIN from a flag or prompt for it
pub fn read_pin(flag: Option<String>, prompt: &str) -> Result<Pin> {
    if let Some(pin) = flag {
        return Ok(Pin::new(pin));
    }
    let pin = Password::new().with_prompt(prompt).interact()?;
    Ok(Pin::new(pin))
}

/// Prompt twice for a new PIN unless one was given on the command line
pub fn read_new_pin(flag: Option<String>) -> Result<Pin> {
    if let Some(pin) = flag {
        return Ok(Pin::new(pin));
    }
    let pin = Password::new()
        .with_prompt("New PIN")
        .with_confirmation("Confirm new PIN", "PINs do not match")
        .interact()?;
    Ok(Pin::new(pin))
}

/// Ask before an irreversible action unless the skip flag was given
pub fn confirm_action(prompt: &str, skip: bool, json: bool, skip_flag: &str) -> Result<bool> {
    if skip {
        return Ok(true);
    }
    require_skip_flag(json, skip_flag)?;
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// JSON output is for scripts, which cannot answer a prompt
fn require_skip_flag(json: bool, skip_flag: &str) -> Result<()> {
    if json {
        anyhow::bail!("--json cannot answer the confirmation prompt; pass {} to proceed", skip_flag);
    }
    Ok(())
}

/// Add a next step to errors a user can act on
pub fn explain(err: Error) -> anyhow::Error {
    match &err {
        Error::SessionExpired { .. } => {
            anyhow::Error::new(err).context("Your session has expired. Run `cpay login` again.")
        }
        _ if err.is_retryable() => anyhow::Error::new(err)
            .context("The payment service is unavailable right now, please try again"),
        _ => anyhow::Error::new(err),
    }
}
