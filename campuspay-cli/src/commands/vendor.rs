//! Vendor command - look up a vendor before paying

use anyhow::Result;

use super::{explain, get_context};
use crate::output;

pub async fn run(api_url: Option<&str>, vendor_id: &str, json: bool) -> Result<()> {
    let ctx = get_context(api_url)?;
    let shop_name = ctx
        .client
        .validate_vendor(vendor_id)
        .await
        .map_err(explain)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "vendorId": vendor_id,
                "valid": shop_name.is_some(),
                "shopName": shop_name,
            })
        );
        return Ok(());
    }

    match shop_name {
        Some(name) => output::success(&format!("{} -> {}", vendor_id, name)),
        None => output::warning(&format!("Unknown vendor: {}", vendor_id)),
    }

    Ok(())
}
