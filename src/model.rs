use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One purchase-order record from the input stream. Immutable after receipt;
/// dropped once its submission outcome is reported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    #[serde(rename = "supplier_remoteId")]
    pub supplier_remote_id: String,
    pub id: String,
    #[serde(default)]
    pub warehouse_code: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub externalid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "product_remoteId")]
    pub product_remote_id: String,
    #[serde(default)]
    pub supplier_item_code: Option<String>,
    /// JSON numbers arrive as-is; the mapper rejects anything that is not a
    /// positive integer.
    pub quantity: f64,
}

/// Per-record state during submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Pending,
    OrderCreated,
    LinesAdded,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Pending => "PENDING",
            SubmissionState::OrderCreated => "ORDER_CREATED",
            SubmissionState::LinesAdded => "LINES_ADDED",
        }
    }
}

/// Decode one input line. Lines are either bare order records or
/// Singer-style messages; only `RECORD` messages carry an order, the rest
/// (`SCHEMA`, `STATE`, blank lines) are skipped and yield `None`.
pub fn decode_stream_line(line: &str) -> Result<Option<OrderRecord>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(line).context("input line is not valid JSON")?;
    let payload = match value.get("type").and_then(|t| t.as_str()) {
        Some("RECORD") => value
            .get("record")
            .cloned()
            .context("RECORD message without a record body")?,
        Some(_) => return Ok(None),
        None => value,
    };
    let record: OrderRecord =
        serde_json::from_value(payload).context("malformed order record")?;
    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_bare_record() {
        let line = json!({
            "supplier_remoteId": "GAM002",
            "id": "optest123456_4d",
            "warehouse_code": "MAINWAREHOUSE",
            "created_at": "2025-11-28T00:00:00.000000Z",
            "line_items": [
                {"product_remoteId": "ITM007", "quantity": 5},
            ],
        })
        .to_string();
        let record = decode_stream_line(&line).unwrap().unwrap();
        assert_eq!(record.supplier_remote_id, "GAM002");
        assert_eq!(record.line_items.len(), 1);
        assert_eq!(record.line_items[0].supplier_item_code, None);
        assert_eq!(
            record.created_at.unwrap().to_rfc3339(),
            "2025-11-28T00:00:00+00:00"
        );
    }

    #[test]
    fn decode_singer_record_message() {
        let line = json!({
            "type": "RECORD",
            "stream": "BuyOrders",
            "record": {
                "supplier_remoteId": "GAM002",
                "id": "abc",
                "line_items": [],
            },
        })
        .to_string();
        let record = decode_stream_line(&line).unwrap().unwrap();
        assert_eq!(record.id, "abc");
    }

    #[test]
    fn schema_and_state_messages_are_skipped() {
        let schema = json!({"type": "SCHEMA", "stream": "BuyOrders"}).to_string();
        let state = json!({"type": "STATE", "value": {}}).to_string();
        assert!(decode_stream_line(&schema).unwrap().is_none());
        assert!(decode_stream_line(&state).unwrap().is_none());
        assert!(decode_stream_line("  ").unwrap().is_none());
    }

    #[test]
    fn garbage_line_is_an_error() {
        assert!(decode_stream_line("not json").is_err());
    }
}
