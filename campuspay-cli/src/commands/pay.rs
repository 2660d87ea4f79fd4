//! Pay command - pay a campus vendor

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;

use campuspay_core::{Error, LogEvent};

use super::{confirm_action, explain, get_context, log_event, read_pin};
use crate::output;

pub async fn run(
    api_url: Option<&str>,
    vendor_id: &str,
    amount: Decimal,
    pin: Option<String>,
    yes: bool,
    json: bool,
) -> Result<()> {
    if amount <= Decimal::ZERO {
        anyhow::bail!("Amount must be greater than zero");
    }

    let ctx = get_context(api_url)?;
    let client = &ctx.client;

    let Some(shop_name) = client.validate_vendor(vendor_id).await.map_err(explain)? else {
        anyhow::bail!("Unknown vendor: {}", vendor_id);
    };

    let prompt = format!("Pay {} to {}?", output::amount(amount).bold(), shop_name.bold());
    if !confirm_action(&prompt, yes, json, "--yes")? {
        println!("Cancelled.");
        return Ok(());
    }

    let pin = read_pin(pin, "PIN")?;

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Processing payment...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    };

    let result = client.make_payment(vendor_id, amount, &pin).await;
    spinner.finish_and_clear();

    match result {
        Ok(confirmation) => {
            log_event(ctx.events.as_deref(), LogEvent::new("payment_completed").with_command("pay"));
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "vendor": shop_name,
                        "message": confirmation,
                    })
                );
            } else {
                output::success(&format!("Paid {} to {}", output::amount(amount), shop_name));
                if !confirmation.is_empty() {
                    println!("{}", confirmation.dimmed());
                }
            }
            Ok(())
        }
        Err(Error::PaymentDenied { reason }) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "success": false, "reason": reason })
                );
                return Ok(());
            }
            anyhow::bail!("Payment denied: {}", reason)
        }
        Err(e) => Err(explain(e)),
    }
}
