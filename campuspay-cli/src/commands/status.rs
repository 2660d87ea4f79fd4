//! Status command - show the current session

use anyhow::Result;
use colored::Colorize;

use campuspay_core::Session;

use super::get_context;
use crate::output;

pub async fn run(api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(api_url)?;
    let session = ctx.client.session().await;

    let has_pin = match &session {
        Session::Registered { .. } => match ctx.client.has_pin().await {
            Ok(has_pin) => Some(has_pin),
            Err(e) => {
                if !json {
                    output::warning(&format!("Could not check PIN: {}", e));
                }
                None
            }
        },
        _ => None,
    };

    let user_type = session.user_type().map(|u| u.as_str());

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "userType": user_type,
                "loggedIn": session != Session::Unauthenticated,
                "hasPin": has_pin,
                "apiUrl": ctx.client.config().base_url,
                "encrypted": ctx.store.is_encrypted(),
            }))?
        );
        return Ok(());
    }

    println!("{}", "CampusPay Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec![
        "Session",
        match session {
            Session::Unauthenticated => "not logged in",
            Session::Registered { .. } => "registered student",
            Session::Guest => "guest",
        },
    ]);
    table.add_row(vec![
        "PIN",
        match has_pin {
            Some(true) => "set",
            Some(false) => "not set",
            None => "-",
        },
    ]);
    table.add_row(vec!["Service", ctx.client.config().base_url.as_str()]);
    table.add_row(vec![
        "Session storage",
        if ctx.store.is_encrypted() {
            "encrypted"
        } else {
            "unencrypted"
        },
    ]);
    println!("{}", table);

    if session == Session::Unauthenticated {
        println!();
        output::info("Run `cpay login` to sign in.");
    }

    Ok(())
}
