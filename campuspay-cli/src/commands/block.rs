//! Block command - freeze the student account

use anyhow::Result;

use campuspay_core::LogEvent;

use super::{confirm_action, explain, get_context, log_event};
use crate::output;

pub async fn run(api_url: Option<&str>, force: bool, json: bool) -> Result<()> {
    if !force && !json {
        output::warning("Blocking stops all payments until the account is unblocked by the campus office.");
    }
    if !confirm_action("Block your account?", force, json, "--force")? {
        println!("Cancelled.");
        return Ok(());
    }

    let ctx = get_context(api_url)?;
    let message = ctx.client.block_account().await.map_err(explain)?;
    log_event(ctx.events.as_deref(), LogEvent::new("account_blocked").with_command("block"));

    if json {
        println!("{}", serde_json::json!({ "success": true, "message": message }));
    } else {
        output::success("Account blocked");
        if !message.is_empty() {
            println!("{}", message);
        }
    }

    Ok(())
}
