//! Rules, update-row, ticket and notify commands

use anyhow::{bail, Result};
use recondash_client::{EmailNotification, MutationResponse, TicketPriority, TicketRequest};
use recondash_core::CellValue;
use recondash_import::coerce_cell;
use serde_json::{Map, Value};

use crate::output;
use crate::SharedState;

/// Parses `key=value` pairs. Numeric values are sent as JSON numbers.
pub fn parse_assignments(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected key=value, got '{pair}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Empty field name in '{pair}'");
        }
        let value = match coerce_cell(value) {
            CellValue::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(value.trim().to_string())),
            CellValue::Text(s) => Value::String(s),
        };
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

fn confirm(response: MutationResponse, fallback: &str) {
    if response.message.is_empty() {
        output::success(fallback);
    } else {
        output::success(&response.message);
    }
}

pub async fn run_rules(state: &SharedState, filename: &str, json: bool) -> Result<()> {
    let client = state.lock().await.client.clone();
    let rules = client.rule_suggestions(filename).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }
    if rules.is_empty() {
        output::info(&format!("No rule suggestions for {filename}"));
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Rule", "Description", "Condition", "Action", "Confidence"]);
    for rule in &rules {
        table.add_row(vec![
            rule.rule_name.clone().unwrap_or_default(),
            rule.description.clone().unwrap_or_default(),
            rule.condition.clone().unwrap_or_default(),
            rule.action.clone().unwrap_or_default(),
            rule.confidence
                .map(|c| format!("{:.0}%", c * 100.0))
                .unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn run_update_row(
    state: &SharedState,
    source: &str,
    trade_id: &str,
    assignments: &[String],
) -> Result<()> {
    let fields = parse_assignments(assignments)?;
    if fields.is_empty() {
        bail!("Nothing to update: pass at least one --set key=value");
    }
    let client = state.lock().await.client.clone();
    let response = client.update_row(source, trade_id, &fields).await?;
    confirm(response, &format!("Updated {trade_id} in {source}"));
    Ok(())
}

pub async fn run_ticket(
    state: &SharedState,
    title: String,
    description: String,
    priority: TicketPriority,
    anomaly_id: Option<String>,
) -> Result<()> {
    let ticket = TicketRequest {
        title,
        description,
        priority,
        anomaly_id,
    };
    let client = state.lock().await.client.clone();
    let response = client.raise_ticket(&ticket).await?;
    confirm(response, &format!("Ticket raised: {}", ticket.title));
    Ok(())
}

pub async fn run_notify(state: &SharedState, email: EmailNotification) -> Result<()> {
    let client = state.lock().await.client.clone();
    let response = client.send_email_notification(&email).await?;
    confirm(response, &format!("Notification sent to {}", email.recipient));
    Ok(())
}
