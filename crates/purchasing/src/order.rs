//! Purchase orders and goods receipts as the matcher sees them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use apflow_core::{Money, ProjectId, VendorId};

/// A purchase-order line: an approved rate for a role at a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoLine {
    /// Role/position the line covers (e.g. "Senior Engineer").
    pub role: String,
    pub quantity: u32,
    /// Rate approved on the PO, in minor units.
    pub approved_rate: Money,
}

/// Purchase order snapshot used for three-way matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Human-facing reference ("PO-1001"), the key invoices point at.
    pub number: String,
    pub vendor_id: VendorId,
    pub project_id: Option<ProjectId>,
    pub lines: Vec<PoLine>,
    pub total: Money,
}

/// Confirmed delivery quantity for one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub role: String,
    pub received_quantity: u32,
}

/// Goods receipt associated with a purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceipt {
    pub po_number: String,
    pub lines: Vec<ReceiptLine>,
}

/// Lookup failure in a backing source (I/O, not "no such record").
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("source lookup failed: {0}")]
pub struct SourceError(pub String);

impl SourceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Resolves purchase orders by their human-facing number.
pub trait PurchaseOrderSource: Send + Sync {
    fn find_by_number(&self, number: &str) -> Result<Option<PurchaseOrder>, SourceError>;
}

/// Resolves the goods receipt recorded against a purchase order.
pub trait GoodsReceiptSource: Send + Sync {
    fn find_by_po_number(&self, po_number: &str) -> Result<Option<GoodsReceipt>, SourceError>;
}

impl<S> PurchaseOrderSource for Arc<S>
where
    S: PurchaseOrderSource + ?Sized,
{
    fn find_by_number(&self, number: &str) -> Result<Option<PurchaseOrder>, SourceError> {
        (**self).find_by_number(number)
    }
}

impl<S> GoodsReceiptSource for Arc<S>
where
    S: GoodsReceiptSource + ?Sized,
{
    fn find_by_po_number(&self, po_number: &str) -> Result<Option<GoodsReceipt>, SourceError> {
        (**self).find_by_po_number(po_number)
    }
}
