//! Two-phase purchase-order submission.
//!
//! Each record is mapped, then `AddOrderedPurchase` creates the shell and
//! `ChangePurchase2` attaches the lines to the returned order number. A
//! phase-1 failure suppresses phase 2; a phase-2 failure leaves an orphaned
//! shell on the remote side and the error carries its order number so the
//! caller can report it. No retries, no rollback.
use std::fmt;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::client::{CallError, SherpaService};
use crate::config::Config;
use crate::mapper::{self, ValidationError};
use crate::model::{OrderRecord, SubmissionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    CreateOrder,
    AddLines,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::CreateOrder => "AddOrderedPurchase",
            Phase::AddLines => "ChangePurchase2",
        })
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Record failed mapping preconditions; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Network failure at either phase. `order_number` is set when phase 1
    /// had already created the shell.
    #[error("transport failure during {phase}: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: reqwest::Error,
        order_number: Option<String>,
    },
    /// The service answered but declined the request.
    #[error("remote rejected {phase}: {detail}")]
    RemoteRejected {
        phase: Phase,
        order_number: Option<String>,
        detail: String,
    },
}

impl SubmissionError {
    /// Order number of a shell that was created but never got its lines.
    pub fn orphaned_order(&self) -> Option<&str> {
        match self {
            SubmissionError::Transport { order_number, .. }
            | SubmissionError::RemoteRejected { order_number, .. } => order_number.as_deref(),
            SubmissionError::Validation(_) => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            SubmissionError::Transport { phase, .. }
            | SubmissionError::RemoteRejected { phase, .. } => Some(*phase),
            SubmissionError::Validation(_) => None,
        }
    }
}

fn tag(phase: Phase, err: CallError, order_number: Option<String>) -> SubmissionError {
    match err {
        CallError::Transport(source) => SubmissionError::Transport {
            phase,
            source,
            order_number,
        },
        CallError::Rejected { detail } => SubmissionError::RemoteRejected {
            phase,
            order_number,
            detail,
        },
    }
}

/// Successful submission of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub order_number: String,
    pub lines_added: usize,
}

/// Outcome of one record. Records without line items are skipped without
/// touching the service at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Completed(Acknowledgement),
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct PurchaseOrderSink {
    default_warehouse: Option<String>,
}

impl PurchaseOrderSink {
    pub fn new(cfg: &Config) -> Self {
        Self {
            default_warehouse: cfg.default_warehouse.clone(),
        }
    }

    /// Submit one record: `Pending → OrderCreated → LinesAdded`. Strictly
    /// sequential; the caller drives records one at a time.
    #[instrument(skip_all, fields(order_id = %record.id))]
    pub async fn submit(
        &self,
        service: &dyn SherpaService,
        record: &OrderRecord,
    ) -> Result<Submission, SubmissionError> {
        if record.line_items.is_empty() {
            warn!("record has no line items, skipping");
            return Ok(Submission::Skipped {
                reason: "no line items".into(),
            });
        }

        let mapped = mapper::map_order(record, self.default_warehouse.as_deref())?;

        let order_number = service
            .add_ordered_purchase(&mapped.create)
            .await
            .map_err(|err| tag(Phase::CreateOrder, err, None))?;
        info!(
            order_number = %order_number,
            state = SubmissionState::OrderCreated.as_str(),
            "purchase order shell created"
        );

        let add_lines = mapped.add_lines_request(&order_number);
        service
            .change_purchase(&add_lines)
            .await
            .map_err(|err| tag(Phase::AddLines, err, Some(order_number.clone())))?;
        info!(
            order_number = %order_number,
            lines = add_lines.lines.len(),
            state = SubmissionState::LinesAdded.as_str(),
            "purchase lines attached"
        );

        Ok(Submission::Completed(Acknowledgement {
            order_number,
            lines_added: add_lines.lines.len(),
        }))
    }
}
