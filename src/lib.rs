//! # stobridge
//!
//! Schema-aware integration bridge for a warehouse transfer workflow
//! (Stock Transfer Order → Shipment Note → Goods-Receipt Note) and
//! purchase-order state queries, persisted against an upstream ERP
//! database this crate does not own.
//!
//! Writes go through schema-introspecting primitives that filter field
//! maps down to the columns that exist at call time; shipment and receipt
//! postings are idempotent through append-only reference ledgers; deferred
//! work (invoices, payments) is recorded as durable async jobs.

pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod model;
pub mod telemetry;
pub mod transfer;
