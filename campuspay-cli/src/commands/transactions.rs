//! Transactions command - balance and payment history

use anyhow::Result;
use colored::Colorize;
use serde_json::Value as JsonValue;

use super::{explain, get_context};
use crate::output;

/// Render a JSON value as a table cell
fn cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Column names in first-seen order across all transaction objects
fn columns(transactions: &[JsonValue]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for tx in transactions {
        if let JsonValue::Object(map) = tx {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

pub async fn run(api_url: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(api_url)?;
    let history = ctx.client.list_transactions().await.map_err(explain)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    let balance = match history.balance_amount() {
        Some(amount) => output::amount(amount),
        None => history.balance.as_ref().map(cell).unwrap_or_default(),
    };
    println!("{} {}", "Balance:".bold(), balance);
    println!();

    let entries = history.entries();
    if entries.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    let columns = columns(entries);
    let mut table = output::create_table();
    if columns.is_empty() {
        table.set_header(vec!["Transaction"]);
        for tx in entries {
            table.add_row(vec![cell(tx)]);
        }
    } else {
        table.set_header(columns.clone());
        for tx in entries {
            let row: Vec<String> = columns
                .iter()
                .map(|c| tx.get(c).map(cell).unwrap_or_default())
                .collect();
            table.add_row(row);
        }
    }
    println!("{}", table);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_merge_in_first_seen_order() {
        let txs = vec![json!({"id": 1, "amt": 50}), json!({"id": 2, "vendor": "Cafe"})];
        let cols = columns(&txs);
        assert_eq!(cols.len(), 3);
        assert!(cols.contains(&"vendor".to_string()));
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(cell(&json!("Cafe")), "Cafe");
        assert_eq!(cell(&json!(50)), "50");
        assert_eq!(cell(&JsonValue::Null), "");
    }
}
