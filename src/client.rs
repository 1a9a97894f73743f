//! HTTP transport for the Sherpa SOAP service.
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::mapper::{AddLinesRequest, CreateOrderRequest};
use crate::soap::{self, Operation};

/// Failure of a single SOAP call, before any phase tagging.
#[derive(Debug, Error)]
pub enum CallError {
    /// Network-level failure: connect error, timeout, broken transfer.
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    /// The service answered but declined the request: HTTP error status,
    /// SOAP fault, or a success-shaped body without the expected value.
    #[error("remote rejected request: {detail}")]
    Rejected { detail: String },
}

/// Seam between the submission logic and the wire. Tests substitute a
/// recording implementation.
#[async_trait]
pub trait SherpaService: Send + Sync {
    /// Phase 1: create the order shell; returns the purchase-order number.
    async fn add_ordered_purchase(&self, req: &CreateOrderRequest) -> Result<String, CallError>;

    /// Phase 2: attach the lines to an existing order.
    async fn change_purchase(&self, req: &AddLinesRequest) -> Result<(), CallError>;
}

#[derive(Clone)]
pub struct SherpaClient {
    http: Client,
    endpoint: String,
    security_code: String,
}

impl fmt::Debug for SherpaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SherpaClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SherpaClient {
    pub fn from_config(cfg: &Config) -> Self {
        let http = Client::builder()
            .user_agent("target-sherpaan/0.1")
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: cfg.endpoint(),
            security_code: cfg.security_code.clone(),
        }
    }

    pub fn build_request(
        &self,
        operation: Operation,
        envelope: String,
    ) -> Result<reqwest::Request, CallError> {
        self.http
            .post(&self.endpoint)
            .header("Content-Type", "application/soap+xml; charset=utf-8")
            .header("SOAPAction", operation.soap_action())
            .body(envelope)
            .build()
            .map_err(CallError::Transport)
    }

    /// One call, no retries. A failed record is reported upward; the caller
    /// decides what to do with it.
    async fn call(&self, operation: Operation, envelope: String) -> Result<String, CallError> {
        info!(operation = operation.name(), endpoint = %self.endpoint, "calling Sherpa");
        debug!(payload = %envelope, "soap request");
        let request = self.build_request(operation, envelope)?;
        let res = self
            .http
            .execute(request)
            .await
            .map_err(CallError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(CallError::Transport)?;
        if !status.is_success() {
            warn!(operation = operation.name(), %status, "Sherpa returned HTTP error");
            return Err(CallError::Rejected {
                detail: format!("HTTP {}: {}", status, truncate(&body, 500)),
            });
        }
        if let Some(fault) = soap::find_fault(&body) {
            warn!(operation = operation.name(), fault = %fault, "Sherpa returned SOAP fault");
            return Err(CallError::Rejected { detail: fault });
        }
        debug!(operation = operation.name(), response = %truncate(&body, 2000), "soap response");
        Ok(body)
    }
}

#[async_trait]
impl SherpaService for SherpaClient {
    async fn add_ordered_purchase(&self, req: &CreateOrderRequest) -> Result<String, CallError> {
        let envelope = soap::add_ordered_purchase_envelope(&self.security_code, req);
        let body = self.call(Operation::AddOrderedPurchase, envelope).await?;
        // A success-shaped response without the order number is still a
        // rejection; there is nothing to attach lines to.
        soap::find_response_value(&body).ok_or_else(|| CallError::Rejected {
            detail: format!(
                "AddOrderedPurchase response has no ResponseValue: {}",
                truncate(&body, 500)
            ),
        })
    }

    async fn change_purchase(&self, req: &AddLinesRequest) -> Result<(), CallError> {
        let envelope = soap::change_purchase_envelope(&self.security_code, req);
        self.call(Operation::ChangePurchase2, envelope).await?;
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
