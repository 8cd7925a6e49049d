//! Output formatting utilities for chatctl

use crate::cli::OutputFormat;
use chatrelay_core::errors::CoreError;
use chatrelay_core::types::ContentType;
use chatrelay_http::{ChatResponse, HealthStatus};
use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Display a classified reply
pub fn display_reply(response: &ChatResponse, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "Reply".bold().blue());
            println!("{}", response.reply);
            println!();

            let table = Table::new(reply_rows(response));
            println!("{}", table);
        }
        OutputFormat::Json => print_json(response)?,
    }
    Ok(())
}

/// Display server health
pub fn display_health(health: &HealthStatus, format: &OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "✓ chatrelay is healthy".green().bold());
            println!("{:<12} {}", "Version:".bold(), health.version);
            println!("{:<12} {}", "Timestamp:".bold(), health.timestamp);
        }
        OutputFormat::Json => print_json(health)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize to JSON: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Metadata rows shown under the reply
fn reply_rows(response: &ChatResponse) -> Vec<FieldRow> {
    let metadata = &response.metadata;
    let mut rows = vec![FieldRow::new("Type", format_content_type(response.response_type))];

    if let Some(language) = metadata.language() {
        rows.push(FieldRow::new("Language", language));
    }
    if let Some(confidence) = metadata.confidence() {
        rows.push(FieldRow::new("Confidence", format!("{:.2}", confidence)));
    }
    if let Some(keys) = metadata.json_keys() {
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        rows.push(FieldRow::new("JSON keys", keys.join(", ")));
    }
    if let Some(depth) = metadata.json_depth() {
        rows.push(FieldRow::new("JSON depth", depth.to_string()));
    }
    if let Some(ref model) = response.model {
        rows.push(FieldRow::new("Model", model));
    }
    if let Some(usage) = response.usage {
        rows.push(FieldRow::new(
            "Tokens",
            format!(
                "{} ({} prompt + {} completion)",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            ),
        ));
    }

    rows
}

/// Format content type with color
fn format_content_type(content_type: ContentType) -> String {
    let label = content_type.to_string();
    match content_type {
        ContentType::Json => label.green().to_string(),
        ContentType::Code => label.cyan().to_string(),
        ContentType::Markdown => label.magenta().to_string(),
        ContentType::Table | ContentType::HtmlTable => label.yellow().to_string(),
        ContentType::Mixed => label.blue().to_string(),
        ContentType::Raw => label.red().to_string(),
        ContentType::Text => label,
    }
}

/// Table row for reply metadata
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}
