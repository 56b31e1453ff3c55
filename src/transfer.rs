//! Transfer workflow service.
//!
//! Owns the lifecycle of a transfer request (create → ship → receive) and
//! the purchase-order state query. An explicitly constructed instance over
//! the database handle it depends on; lookups resolve external codes, the
//! state machine validates the persisted state, and the filtered
//! insert/update primitives persist the change.

use std::sync::Arc;

use chrono::Utc;

use crate::db::Db;
use crate::db::schema::{Fields, SqlValue};
use crate::error::{Error, Result};
use crate::model::{
    CreateOutcome, CreateTransfer, PurchaseStatus, ReceiptOutcome, ReceiptPosting,
    ShipmentOutcome, ShipmentPosting, TransferState,
};

/// Upstream parent table, one row per transfer request.
pub const TRANSFER_TABLE: &str = "sto_request";
/// Upstream child table, one row per requested product.
pub const TRANSFER_LINE_TABLE: &str = "sto_product_line";

/// The single upstream purchase-order status meaning "approved for receipt".
const PO_APPROVED_STATE: &str = "purchase";

pub struct TransferService {
    db: Arc<Db>,
}

impl TransferService {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Create a transfer request in `draft` with one line per product.
    ///
    /// Idempotent on `reference_no`: when a transfer with the same reference
    /// already exists, the existing record is echoed with `created = false`.
    /// Warehouse codes and every product SKU are resolved before the first
    /// write, so a resolution failure leaves no partial state.
    pub async fn create(&self, req: CreateTransfer) -> Result<CreateOutcome> {
        req.validate()?;

        for table in [TRANSFER_TABLE, TRANSFER_LINE_TABLE] {
            if !self.db.table_exists(table).await? {
                return Err(Error::SchemaUnavailable(table.to_string()));
            }
        }

        if let Some((id, name)) = self.db.transfer_by_client_ref(&req.reference_no).await? {
            let transfer_no = name.unwrap_or_else(|| id.to_string());
            return Ok(CreateOutcome {
                created: false,
                message: format!("transfer {transfer_no} already exists"),
                transfer_no,
            });
        }

        let store_warehouse_id = self.db.warehouse_id(&req.store_warehouse).await?;
        let fulfillment_warehouse_id = self.db.warehouse_id(&req.fulfillment_warehouse).await?;

        let mut resolved = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            resolved.push((self.db.product_id(&line.sku).await?, line.quantity));
        }

        let now = Utc::now();
        let transfer_id = self
            .db
            .insert_filtered(
                TRANSFER_TABLE,
                Fields::new()
                    .set("reference_no", req.reference_no.as_str())
                    .set("store_warehouse", store_warehouse_id)
                    .set("fulfillment_warehouse", fulfillment_warehouse_id)
                    .set("sto_type", req.sto_type.as_str())
                    .set("scheduled_date", req.scheduled_date)
                    .set("state", TransferState::Draft.to_string())
                    .set("is_api_record", true)
                    .set("create_date", now)
                    .set("write_date", now),
            )
            .await?;

        // Line inserts commit independently; a fault between them leaves
        // earlier lines persisted.
        for (product_id, quantity) in resolved {
            self.db
                .insert_filtered(
                    TRANSFER_LINE_TABLE,
                    Fields::new()
                        .set("sto_id", transfer_id)
                        .set("product_id", product_id)
                        .set("product_uom_qty", quantity)
                        .set("state", TransferState::Draft.to_string())
                        .set("create_date", now)
                        .set("write_date", now),
                )
                .await?;
        }

        tracing::info!(
            transfer_id,
            reference_no = %req.reference_no,
            lines = req.lines.len(),
            "transfer created"
        );
        Ok(CreateOutcome {
            transfer_no: transfer_id.to_string(),
            created: true,
            message: format!("transfer {transfer_id} created"),
        })
    }

    /// Post a shipment note: append its reference to the shipment ledger and
    /// advance the transfer to `in_transit`.
    ///
    /// A reference already in the ledger fails with `DuplicatePost`, the
    /// idempotency guard against replayed webhooks and retries.
    pub async fn post_shipment(&self, posting: ShipmentPosting) -> Result<ShipmentOutcome> {
        posting.validate()?;

        let mut head = self
            .db
            .transfer_head(&posting.transfer_no)
            .await?
            .ok_or_else(|| Error::NotFound(posting.transfer_no.clone()))?;

        if head.shipment_refs.contains(&posting.shipment_no) {
            return Err(Error::DuplicatePost(posting.shipment_no));
        }

        let next = TransferState::InTransit;
        if !head.state.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: head.state,
                to: next,
            });
        }

        head.shipment_refs.append(posting.shipment_no.as_str());
        let shipped_on = posting.shipped_on.unwrap_or_else(Utc::now);
        self.db
            .update_filtered(
                TRANSFER_TABLE,
                Fields::new()
                    .set("stn_number", head.shipment_refs.join())
                    .set("state", next.to_string())
                    .set("shipment_date", shipped_on)
                    .set("write_date", Utc::now()),
                "id = ?",
                vec![SqlValue::Int(head.id)],
            )
            .await?;

        tracing::info!(
            transfer_id = head.id,
            shipment_no = %posting.shipment_no,
            from = %head.state,
            "shipment note posted"
        );
        Ok(ShipmentOutcome {
            transfer_no: posting.transfer_no,
            shipment_no: posting.shipment_no,
            message: "shipment note posted".into(),
        })
    }

    /// Post a goods-receipt note: append its reference to the receipt ledger
    /// and advance the transfer to `done`.
    pub async fn post_receipt(&self, posting: ReceiptPosting) -> Result<ReceiptOutcome> {
        posting.validate()?;

        let mut head = self
            .db
            .transfer_head(&posting.transfer_no)
            .await?
            .ok_or_else(|| Error::NotFound(posting.transfer_no.clone()))?;

        if head.receipt_refs.contains(&posting.receipt_no) {
            return Err(Error::DuplicatePost(posting.receipt_no));
        }

        let next = TransferState::Done;
        if !head.state.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: head.state,
                to: next,
            });
        }

        head.receipt_refs.append(posting.receipt_no.as_str());
        self.db
            .update_filtered(
                TRANSFER_TABLE,
                Fields::new()
                    .set("grn_number", head.receipt_refs.join())
                    .set("grn_date", posting.received_on)
                    .set("state", next.to_string())
                    .set("write_date", Utc::now()),
                "id = ?",
                vec![SqlValue::Int(head.id)],
            )
            .await?;

        tracing::info!(
            transfer_id = head.id,
            receipt_no = %posting.receipt_no,
            from = %head.state,
            "goods-receipt note posted"
        );
        Ok(ReceiptOutcome {
            transfer_no: posting.transfer_no,
            receipt_no: posting.receipt_no,
            message: "goods-receipt note posted".into(),
        })
    }

    /// Report, for each purchase order in the batch, whether its upstream
    /// status allows receipt. Result order mirrors input order; an unknown
    /// reference yields an invalid entry instead of aborting the batch.
    pub async fn purchase_state(&self, po_numbers: &[String]) -> Result<Vec<PurchaseStatus>> {
        if po_numbers.is_empty() {
            return Err(Error::Validation("po_numbers must not be empty".into()));
        }

        let mut results = Vec::with_capacity(po_numbers.len());
        for po_number in po_numbers {
            let status = match self.db.purchase_order_state(po_number).await? {
                None => PurchaseStatus {
                    po_number: po_number.clone(),
                    approved: false,
                    message: format!("purchase order not found: {po_number}"),
                },
                Some(state) => {
                    let approved = state == PO_APPROVED_STATE;
                    let message = if approved {
                        "purchase order is approved for receipt".to_string()
                    } else {
                        format!("purchase order is not approved for receipt (state: {state})")
                    };
                    PurchaseStatus {
                        po_number: po_number.clone(),
                        approved,
                        message,
                    }
                }
            };
            results.push(status);
        }
        Ok(results)
    }
}
