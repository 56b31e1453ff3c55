//! Reference and row lookups against the upstream schema.
//!
//! External business codes (warehouse code, product SKU) resolve to internal
//! numeric ids with exact, case-sensitive equality; an unresolved code is a
//! client-input error, not a system fault. Transfer and purchase-order
//! lookups live here too so the service layer never issues raw SQL.

use crate::error::{Error, Result};
use crate::ledger::Ledger;
use crate::model::TransferHead;

impl super::Db {
    /// Resolve a warehouse code to its internal id.
    pub async fn warehouse_id(&self, code: &str) -> Result<i64> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT id::BIGINT FROM stock_warehouse WHERE code = $1 LIMIT 1")
                .bind(code)
                .fetch_optional(self.pool())
                .await?;
        row.map(|r| r.0).ok_or_else(|| Error::ReferenceNotFound {
            kind: "warehouse",
            code: code.to_string(),
        })
    }

    /// Resolve a product SKU to its internal id.
    pub async fn product_id(&self, sku: &str) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id::BIGINT FROM product_product WHERE default_code = $1 LIMIT 1",
        )
        .bind(sku)
        .fetch_optional(self.pool())
        .await?;
        row.map(|r| r.0).ok_or_else(|| Error::ReferenceNotFound {
            kind: "product",
            code: sku.to_string(),
        })
    }

    /// Find a transfer by the caller-supplied reference_no. Backs the
    /// idempotent create check.
    pub async fn transfer_by_client_ref(
        &self,
        reference_no: &str,
    ) -> Result<Option<(i64, Option<String>)>> {
        let row: Option<(i64, Option<String>)> = sqlx::query_as(
            "SELECT id::BIGINT, name FROM sto_request WHERE reference_no = $1 LIMIT 1",
        )
        .bind(reference_no)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Find a transfer head by its external number or internal id.
    pub async fn transfer_head(&self, reference: &str) -> Result<Option<TransferHead>> {
        let row: Option<TransferHeadRow> = sqlx::query_as(
            "SELECT id::BIGINT AS id, name, state, stn_number, grn_number
             FROM sto_request
             WHERE name = $1 OR id::text = $1
             LIMIT 1",
        )
        .bind(reference)
        .fetch_optional(self.pool())
        .await?;
        row.map(TransferHeadRow::try_into_head).transpose()
    }

    /// Upstream status of a purchase order, or None when the reference is
    /// unknown.
    pub async fn purchase_order_state(&self, po_number: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT state FROM purchase_order WHERE name = $1 LIMIT 1")
                .bind(po_number)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|r| r.0))
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct TransferHeadRow {
    id: i64,
    name: Option<String>,
    state: String,
    stn_number: Option<String>,
    grn_number: Option<String>,
}

impl TransferHeadRow {
    fn try_into_head(self) -> Result<TransferHead> {
        Ok(TransferHead {
            id: self.id,
            name: self.name,
            state: self.state.parse()?,
            shipment_refs: Ledger::parse(self.stn_number.as_deref()),
            receipt_refs: Ledger::parse(self.grn_number.as_deref()),
        })
    }
}
