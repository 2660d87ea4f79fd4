//! Login command - exchange an identity token for a session

use anyhow::Result;
use colored::Colorize;
use dialoguer::Password;

use campuspay_core::adapters::identity::EnvIdentityProvider;
use campuspay_core::{AuthOutcome, IdentityProvider, LogEvent};

use super::{explain, get_context, log_event};
use crate::output;

pub async fn run(api_url: Option<&str>, token: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context(api_url)?;

    let identity_token = match token {
        Some(token) => token,
        None => match EnvIdentityProvider::new().identity_token().await? {
            Some(token) => token,
            None => Password::new().with_prompt("Identity token").interact()?,
        },
    };

    let outcome = ctx
        .client
        .authenticate(&identity_token)
        .await
        .map_err(explain)?;

    log_event(
        ctx.events.as_deref(),
        LogEvent::new("login").with_command("login"),
    );

    if json {
        println!(
            "{}",
            serde_json::json!({
                "userType": if outcome.is_guest() { "guest" } else { "normal" },
            })
        );
        return Ok(());
    }

    match outcome {
        AuthOutcome::Registered(_) => output::success("Logged in"),
        AuthOutcome::Guest => {
            output::warning("Logged in as guest");
            println!(
                "{}",
                "Payments and PIN management need a registered student account.".dimmed()
            );
        }
    }

    Ok(())
}
