//! `apflow-purchasing` — purchase-order and goods-receipt read models.
//!
//! These records are owned by the procurement side of the house; the
//! matching engine only reads them. The source traits are the narrow
//! interface the matcher depends on, so storage can be swapped without
//! touching matching logic.

pub mod order;
pub mod rate_card;

pub use order::{
    GoodsReceipt, GoodsReceiptSource, PoLine, PurchaseOrder, PurchaseOrderSource, ReceiptLine,
    SourceError,
};
pub use rate_card::{RateCard, RateCardSource, RateCardStatus, RateEntry};
