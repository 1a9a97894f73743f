//! Pure mapping from an input order record to the two Sherpa request payloads.
//!
//! No I/O happens here; the mapper only validates and reshapes. Credentials
//! are injected later by the envelope codec.
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::OrderRecord;

/// Wire format Sherpa expects for `ExpectedDate`. Milliseconds are always
/// rendered as a literal `.000`.
const EXPECTED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000";

/// Records without `created_at` get an expected date this far in the future.
const DEFAULT_EXPECTED_DAYS: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid order record: {0}")]
pub struct ValidationError(pub String);

/// Payload for `AddOrderedPurchase`, the order shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub supplier_code: String,
    pub reference: String,
    pub warehouse_code: String,
}

/// One `ChangePurchaseLine`. `expected_date` is already in wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    pub item_code: String,
    pub supplier_item_code: String,
    pub quantity: u32,
    pub expected_date: String,
}

/// Payload for `ChangePurchase2`, attaching lines to a created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLinesRequest {
    pub order_number: String,
    pub lines: Vec<PurchaseLine>,
}

/// Result of mapping one record: the phase-1 request plus the lines that
/// become the phase-2 request once the order number is known.
#[derive(Debug, Clone)]
pub struct MappedOrder {
    pub create: CreateOrderRequest,
    lines: Vec<PurchaseLine>,
}

impl MappedOrder {
    /// Build the phase-2 request for the order number returned by phase 1.
    pub fn add_lines_request(&self, order_number: &str) -> AddLinesRequest {
        AddLinesRequest {
            order_number: order_number.to_string(),
            lines: self.lines.clone(),
        }
    }
}

/// Map one order record. Every line receives the same expected date, taken
/// from the order-level `created_at` (never `transaction_date`, never a
/// per-line value). Falls back to now + 30 days when `created_at` is absent.
pub fn map_order(
    record: &OrderRecord,
    default_warehouse: Option<&str>,
) -> Result<MappedOrder, ValidationError> {
    if record.id.trim().is_empty() {
        return Err(ValidationError("order id must be non-empty".into()));
    }
    if record.supplier_remote_id.trim().is_empty() {
        return Err(ValidationError(format!(
            "order {}: supplier_remoteId must be non-empty",
            record.id
        )));
    }

    let warehouse_code = record
        .warehouse_code
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .or(default_warehouse)
        .ok_or_else(|| {
            ValidationError(format!(
                "order {}: warehouse_code missing from record and no default_warehouse configured",
                record.id
            ))
        })?;

    let expected_date = format_expected_date(record.created_at);

    let mut lines = Vec::with_capacity(record.line_items.len());
    for (idx, item) in record.line_items.iter().enumerate() {
        let item_code = item.product_remote_id.trim();
        if item_code.is_empty() {
            return Err(ValidationError(format!(
                "order {}: line {} is missing product_remoteId",
                record.id, idx
            )));
        }
        let quantity = to_positive_integer(item.quantity).ok_or_else(|| {
            ValidationError(format!(
                "order {}: line {} has non-positive or fractional quantity {}",
                record.id, idx, item.quantity
            ))
        })?;
        let supplier_item_code = item
            .supplier_item_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(item_code);
        lines.push(PurchaseLine {
            item_code: item_code.to_string(),
            supplier_item_code: supplier_item_code.to_string(),
            quantity,
            expected_date: expected_date.clone(),
        });
    }

    Ok(MappedOrder {
        create: CreateOrderRequest {
            supplier_code: record.supplier_remote_id.clone(),
            reference: record.id.clone(),
            warehouse_code: warehouse_code.to_string(),
        },
        lines,
    })
}

fn format_expected_date(created_at: Option<DateTime<Utc>>) -> String {
    let dt = created_at.unwrap_or_else(|| Utc::now() + Duration::days(DEFAULT_EXPECTED_DAYS));
    dt.format(EXPECTED_DATE_FORMAT).to_string()
}

fn to_positive_integer(quantity: f64) -> Option<u32> {
    if quantity <= 0.0 || quantity.fract() != 0.0 || quantity > u32::MAX as f64 {
        return None;
    }
    Some(quantity as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineItem;
    use chrono::TimeZone;

    fn sample_record() -> OrderRecord {
        OrderRecord {
            supplier_remote_id: "GAM002".into(),
            id: "optest123456_4d".into(),
            warehouse_code: Some("MAINWAREHOUSE".into()),
            transaction_date: Some(Utc.with_ymd_and_hms(2025, 12, 1, 12, 30, 0).unwrap()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 11, 28, 0, 0, 0).unwrap()),
            line_items: vec![
                LineItem {
                    product_remote_id: "ITM007".into(),
                    supplier_item_code: None,
                    quantity: 5.0,
                },
                LineItem {
                    product_remote_id: "ITM013".into(),
                    supplier_item_code: Some("ITM013".into()),
                    quantity: 10.0,
                },
            ],
            externalid: Some("optest123456_4d".into()),
        }
    }

    #[test]
    fn maps_spec_example() {
        let mapped = map_order(&sample_record(), None).unwrap();
        assert_eq!(
            mapped.create,
            CreateOrderRequest {
                supplier_code: "GAM002".into(),
                reference: "optest123456_4d".into(),
                warehouse_code: "MAINWAREHOUSE".into(),
            }
        );
        let req = mapped.add_lines_request("PO-1");
        assert_eq!(req.order_number, "PO-1");
        assert_eq!(
            req.lines,
            vec![
                PurchaseLine {
                    item_code: "ITM007".into(),
                    supplier_item_code: "ITM007".into(),
                    quantity: 5,
                    expected_date: "2025-11-28T00:00:00.000".into(),
                },
                PurchaseLine {
                    item_code: "ITM013".into(),
                    supplier_item_code: "ITM013".into(),
                    quantity: 10,
                    expected_date: "2025-11-28T00:00:00.000".into(),
                },
            ]
        );
    }

    #[test]
    fn every_line_gets_order_level_created_at() {
        // Per-line date fields in the input are ignored entirely; only the
        // order-level created_at reaches the wire.
        let json = serde_json::json!({
            "supplier_remoteId": "SUP1",
            "id": "ord-1",
            "warehouse_code": "WH1",
            "transaction_date": "2026-01-15T09:00:00.000000Z",
            "created_at": "2025-11-28T00:00:00.000000Z",
            "line_items": [
                {"product_remoteId": "A", "quantity": 1, "expected_date": "2030-01-01T00:00:00Z"},
                {"product_remoteId": "B", "quantity": 2, "created_at": "2031-06-06T00:00:00Z"},
                {"product_remoteId": "C", "quantity": 3},
            ],
        });
        let record: OrderRecord = serde_json::from_value(json).unwrap();
        let mapped = map_order(&record, None).unwrap();
        let req = mapped.add_lines_request("PO-9");
        assert_eq!(req.lines.len(), 3);
        for line in &req.lines {
            assert_eq!(line.expected_date, "2025-11-28T00:00:00.000");
        }
    }

    #[test]
    fn missing_supplier_item_code_falls_back_to_item_code() {
        let mut record = sample_record();
        record.line_items[1].supplier_item_code = Some("  ".into());
        let mapped = map_order(&record, None).unwrap();
        let req = mapped.add_lines_request("PO-1");
        assert_eq!(req.lines[0].supplier_item_code, "ITM007");
        assert_eq!(req.lines[1].supplier_item_code, "ITM013");
    }

    #[test]
    fn rejects_bad_quantities() {
        for bad in [0.0, -3.0, 2.5] {
            let mut record = sample_record();
            record.line_items[0].quantity = bad;
            let err = map_order(&record, None).unwrap_err();
            assert!(err.0.contains("quantity"), "{err}");
        }
    }

    #[test]
    fn rejects_empty_order_id_and_product_code() {
        let mut record = sample_record();
        record.id = "".into();
        assert!(map_order(&record, None).is_err());

        let mut record = sample_record();
        record.line_items[0].product_remote_id = " ".into();
        let err = map_order(&record, None).unwrap_err();
        assert!(err.0.contains("product_remoteId"));
    }

    #[test]
    fn warehouse_falls_back_to_configured_default() {
        let mut record = sample_record();
        record.warehouse_code = None;
        let mapped = map_order(&record, Some("FALLBACK")).unwrap();
        assert_eq!(mapped.create.warehouse_code, "FALLBACK");

        let err = map_order(&record, None).unwrap_err();
        assert!(err.0.contains("warehouse_code"));
    }

    #[test]
    fn missing_created_at_defaults_thirty_days_out() {
        let mut record = sample_record();
        record.created_at = None;
        let mapped = map_order(&record, None).unwrap();
        let req = mapped.add_lines_request("PO-1");
        let parsed = chrono::NaiveDateTime::parse_from_str(
            &req.lines[0].expected_date,
            "%Y-%m-%dT%H:%M:%S%.3f",
        )
        .unwrap()
        .and_utc();
        let delta = parsed - Utc::now();
        assert!(delta > Duration::days(29) && delta < Duration::days(31));
    }
}
