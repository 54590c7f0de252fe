//! Output → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): one item per line, `id  sku  name`
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use serde_json::json;
use skudb_catalog::{CatalogError, Item};
use std::collections::BTreeMap;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Item(Item),
    Items(Vec<Item>),
    Skus(BTreeMap<String, String>),
    Done,
}

/// Format a successful output.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(output),
        OutputMode::Human => format_human(output),
    }
}

/// Format an error.
pub fn format_error(err: &CatalogError, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({ "error": err.to_string() }).to_string(),
        OutputMode::Human => format!("(error) {}", err),
    }
}

fn format_json(output: &Output) -> String {
    let value = match output {
        Output::Item(item) => json!(item),
        Output::Items(items) => json!(items),
        Output::Skus(skus) => json!(skus),
        Output::Done => json!({ "ok": true }),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn format_item(item: &Item) -> String {
    format!("{}  {}  {}", item.id, item.sku, item.name)
}

fn format_human(output: &Output) -> String {
    match output {
        Output::Item(item) => format_item(item),
        Output::Items(items) if items.is_empty() => "(empty)".to_string(),
        Output::Items(items) => items.iter().map(format_item).collect::<Vec<_>>().join("\n"),
        Output::Skus(skus) if skus.is_empty() => "(empty)".to_string(),
        Output::Skus(skus) => skus
            .iter()
            .map(|(sku, id)| format!("{}  {}", sku, id))
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Done => "OK".to_string(),
    }
}
