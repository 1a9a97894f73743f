//! SOAP 1.2 envelope codec for the two Sherpa operations.
//!
//! The service validates the envelope shape strictly, so the builders here
//! reproduce it byte-for-byte: soap12 namespaces, two-space indentation,
//! operation elements under `http://sherpa.sherpaan.nl/`.
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::mapper::{AddLinesRequest, CreateOrderRequest};

pub const SERVICE_NAMESPACE: &str = "http://sherpa.sherpaan.nl/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AddOrderedPurchase,
    ChangePurchase2,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddOrderedPurchase => "AddOrderedPurchase",
            Operation::ChangePurchase2 => "ChangePurchase2",
        }
    }

    /// Value for the `SOAPAction` header, quotes included.
    pub fn soap_action(&self) -> String {
        format!("\"{}{}\"", SERVICE_NAMESPACE, self.name())
    }
}

/// Envelope for `AddOrderedPurchase`: creates the purchase-order shell and
/// returns its number in `ResponseValue`.
pub fn add_ordered_purchase_envelope(security_code: &str, req: &CreateOrderRequest) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap12:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap12="http://www.w3.org/2003/05/soap-envelope">
  <soap12:Body>
    <AddOrderedPurchase xmlns="http://sherpa.sherpaan.nl/">
      <securityCode>{}</securityCode>
      <supplierCode>{}</supplierCode>
      <reference>{}</reference>
      <warehouseCode>{}</warehouseCode>
    </AddOrderedPurchase>
  </soap12:Body>
</soap12:Envelope>"#,
        escape(security_code),
        escape(&req.supplier_code),
        escape(&req.reference),
        escape(&req.warehouse_code),
    )
}

/// Envelope for `ChangePurchase2`: attaches the purchase lines to an
/// already-created order.
pub fn change_purchase_envelope(security_code: &str, req: &AddLinesRequest) -> String {
    let mut purchase_lines = String::new();
    for line in &req.lines {
        purchase_lines.push_str(&format!(
            r#"      <ChangePurchaseLine>
        <ItemCode>{}</ItemCode>
        <SupplierItemCode>{}</SupplierItemCode>
        <QuantityOrdered>{}</QuantityOrdered>
        <ExpectedDate>{}</ExpectedDate>
      </ChangePurchaseLine>
"#,
            escape(&line.item_code),
            escape(&line.supplier_item_code),
            line.quantity,
            escape(&line.expected_date),
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap12:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap12="http://www.w3.org/2003/05/soap-envelope">
  <soap12:Body>
    <ChangePurchase2 xmlns="http://sherpa.sherpaan.nl/">
      <securityCode>{}</securityCode>
      <purchaseOrderNumber>{}</purchaseOrderNumber>
      <purchaseLines>
{}      </purchaseLines>
    </ChangePurchase2>
  </soap12:Body>
</soap12:Envelope>"#,
        escape(security_code),
        escape(&req.order_number),
        purchase_lines,
    )
}

/// Extract the `ResponseValue` text from a response envelope, tolerating
/// namespace-prefix variation. Returns `None` on malformed XML or when the
/// element is absent or empty.
pub fn find_response_value(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"ResponseValue" => inside = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"ResponseValue" => inside = false,
            Ok(Event::Text(t)) if inside => {
                let value = t.unescape().ok()?.trim().to_string();
                if value.is_empty() {
                    return None;
                }
                return Some(value);
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Detect a SOAP `Fault` and collect its text content as the diagnostic.
pub fn find_fault(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut depth = 0u32;
    let mut parts: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Fault" => depth += 1,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Fault" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let text = parts.join("; ");
                    return Some(if text.is_empty() {
                        "SOAP fault".to_string()
                    } else {
                        text
                    });
                }
            }
            Ok(Event::Text(t)) if depth > 0 => {
                if let Ok(text) = t.unescape() {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        parts.push(text);
                    }
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}
