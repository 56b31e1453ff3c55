//! Core data model.
//!
//! A transfer request moves goods between two warehouses and walks a
//! strictly forward lifecycle: created as a draft, shipped into transit,
//! received to done. Request types arrive from the transport boundary
//! already shaped; `validate()` guards the structural invariants this
//! subsystem still owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ledger::Ledger;

// ---------------------------------------------------------------------------
// Transfer state
// ---------------------------------------------------------------------------

/// Lifecycle state of a transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    /// Created, nothing shipped yet.
    Draft,
    /// At least one shipment note posted, goods under way.
    InTransit,
    /// At least one goods-receipt note posted. Never left.
    Done,
}

impl TransferState {
    /// Can transition from self to `to`? Transitions are strictly forward;
    /// re-posting in the same state is allowed (additional references),
    /// moving backward never is.
    pub fn can_transition_to(self, to: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, to),
            (Draft, InTransit)
                | (InTransit, InTransit) // further shipment notes
                | (Draft, Done)          // receipt may land before shipment confirms
                | (InTransit, Done)
                | (Done, Done) // further receipt notes
        )
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransferState::Draft => "draft",
            TransferState::InTransit => "in_transit",
            TransferState::Done => "done",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TransferState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(TransferState::Draft),
            "in_transit" => Ok(TransferState::InTransit),
            "done" => Ok(TransferState::Done),
            _ => Err(Error::Other(format!("unknown transfer state: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One requested product on a new transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferLine {
    /// Product SKU, resolved against the upstream product table.
    pub sku: String,
    pub quantity: u32,
}

/// Create-transfer action. Idempotent on `reference_no`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransfer {
    /// Caller-supplied reference, globally unique across transfers.
    pub reference_no: String,
    /// Source warehouse code.
    pub store_warehouse: String,
    /// Destination warehouse code.
    pub fulfillment_warehouse: String,
    pub sto_type: String,
    pub scheduled_date: DateTime<Utc>,
    pub lines: Vec<TransferLine>,
}

impl CreateTransfer {
    pub fn validate(&self) -> Result<()> {
        if self.reference_no.is_empty() {
            return Err(Error::Validation("reference_no is required".into()));
        }
        if self.store_warehouse.is_empty() || self.fulfillment_warehouse.is_empty() {
            return Err(Error::Validation("both warehouse codes are required".into()));
        }
        if self.lines.is_empty() {
            return Err(Error::Validation("at least one transfer line is required".into()));
        }
        validate_quantities(self.lines.iter().map(|l| l.quantity))
    }
}

/// One product on a shipment note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentLine {
    pub sku: String,
    pub quantity: u32,
}

/// Post-shipment action. Advances the transfer to `in_transit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentPosting {
    /// Transfer number or internal id.
    pub transfer_no: String,
    pub shipment_type: String,
    /// Shipment-note reference; recorded in the shipment ledger.
    pub shipment_no: String,
    pub source_node: String,
    pub source_location: String,
    /// Ship date; the posting instant when omitted.
    pub shipped_on: Option<DateTime<Utc>>,
    pub products: Vec<ShipmentLine>,
}

impl ShipmentPosting {
    pub fn validate(&self) -> Result<()> {
        if self.transfer_no.is_empty() {
            return Err(Error::Validation("transfer_no is required".into()));
        }
        if self.shipment_no.is_empty() {
            return Err(Error::Validation("shipment_no is required".into()));
        }
        if self.products.is_empty() {
            return Err(Error::Validation("at least one shipped product is required".into()));
        }
        validate_quantities(self.products.iter().map(|p| p.quantity))
    }
}

/// One product on a goods-receipt note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub sku: String,
    pub quantity: u32,
    pub destination_location: String,
}

/// Post-receipt action. Advances the transfer to `done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptPosting {
    /// Transfer number or internal id.
    pub transfer_no: String,
    /// Goods-receipt reference; recorded in the receipt ledger.
    pub receipt_no: String,
    pub received_on: DateTime<Utc>,
    pub products: Vec<ReceiptLine>,
}

impl ReceiptPosting {
    pub fn validate(&self) -> Result<()> {
        if self.transfer_no.is_empty() {
            return Err(Error::Validation("transfer_no is required".into()));
        }
        if self.receipt_no.is_empty() {
            return Err(Error::Validation("receipt_no is required".into()));
        }
        if self.products.is_empty() {
            return Err(Error::Validation("at least one received product is required".into()));
        }
        validate_quantities(self.products.iter().map(|p| p.quantity))
    }
}

fn validate_quantities(quantities: impl Iterator<Item = u32>) -> Result<()> {
    for qty in quantities {
        if qty < 1 {
            return Err(Error::Validation("quantity must be at least 1".into()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOutcome {
    pub transfer_no: String,
    /// False when the reference_no already existed and the call was a no-op.
    pub created: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentOutcome {
    pub transfer_no: String,
    pub shipment_no: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptOutcome {
    pub transfer_no: String,
    pub receipt_no: String,
    pub message: String,
}

/// Per-reference result of a purchase-order state query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseStatus {
    pub po_number: String,
    /// True when the upstream status is the single "approved for receipt"
    /// value.
    pub approved: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Read model
// ---------------------------------------------------------------------------

/// Persisted head of a transfer request: identity, state, both ledgers.
#[derive(Debug, Clone)]
pub struct TransferHead {
    pub id: i64,
    /// Upstream-assigned transfer number, when present.
    pub name: Option<String>,
    pub state: TransferState,
    pub shipment_refs: Ledger,
    pub receipt_refs: Ledger,
}
