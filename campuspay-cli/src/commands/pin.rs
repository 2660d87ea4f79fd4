//! PIN commands - check, reveal, set and reset the payment PIN

use anyhow::Result;
use clap::Subcommand;
use dialoguer::Password;

use campuspay_core::LogEvent;

use super::{explain, get_context, log_event, read_new_pin};
use crate::output;

#[derive(Subcommand)]
pub enum PinCommands {
    /// Show whether a PIN is set
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reveal the current PIN
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a new PIN
    Set {
        /// New PIN (prompted if omitted)
        #[arg(long)]
        pin: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset a forgotten PIN with a one-time code
    Reset {
        /// One-time code (requested and prompted if omitted)
        #[arg(long)]
        otp: Option<String>,
        /// New PIN (prompted if omitted)
        #[arg(long)]
        pin: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(api_url: Option<&str>, command: PinCommands) -> Result<()> {
    let ctx = get_context(api_url)?;
    let client = &ctx.client;

    match command {
        PinCommands::Status { json } => {
            let has_pin = client.has_pin().await.map_err(explain)?;
            if json {
                println!("{}", serde_json::json!({ "hasPin": has_pin }));
            } else if has_pin {
                output::success("A PIN is set");
            } else {
                output::warning("No PIN set. Run `cpay pin set` to create one.");
            }
        }
        PinCommands::Show { json } => {
            let pin = client.get_pin().await.map_err(explain)?;
            if json {
                println!("{}", serde_json::json!({ "pin": pin.expose() }));
            } else {
                println!("{}", pin.expose());
            }
        }
        PinCommands::Set { pin, json } => {
            let pin = read_new_pin(pin)?;
            let ok = client.set_pin(&pin).await.map_err(explain)?;
            log_event(ctx.events.as_deref(), LogEvent::new("pin_set").with_command("pin set"));
            if json {
                println!("{}", serde_json::json!({ "success": ok }));
            } else {
                output::success("PIN updated");
            }
        }
        PinCommands::Reset { otp, pin, json } => {
            let otp = match otp {
                Some(otp) => otp,
                None => {
                    let message = client.request_otp().await.map_err(explain)?;
                    if !json {
                        output::info(&message);
                    }
                    Password::new()
                        .with_prompt("One-time code")
                        .interact()?
                }
            };
            let pin = read_new_pin(pin)?;
            let ok = client
                .verify_otp_and_reset_pin(otp.trim(), &pin)
                .await
                .map_err(explain)?;
            log_event(ctx.events.as_deref(), LogEvent::new("pin_reset").with_command("pin reset"));
            if json {
                println!("{}", serde_json::json!({ "success": ok }));
            } else {
                output::success("PIN reset");
            }
        }
    }

    Ok(())
}
