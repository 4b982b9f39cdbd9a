//! In-memory reference-data stores backing the matcher and the approval
//! context. Intended for tests/dev; a real deployment wires the source
//! traits to the purchasing system of record.

use std::collections::HashMap;
use std::sync::RwLock;

use apflow_core::VendorId;
use apflow_purchasing::{
    GoodsReceipt, GoodsReceiptSource, PurchaseOrder, PurchaseOrderSource, RateCard,
    RateCardSource, SourceError,
};

#[derive(Debug, Default)]
pub struct InMemoryPurchaseOrderStore {
    orders: RwLock<HashMap<String, PurchaseOrder>>,
}

impl InMemoryPurchaseOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, order: PurchaseOrder) -> Result<(), SourceError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| SourceError::new("purchase order store lock poisoned"))?;
        orders.insert(order.number.clone(), order);
        Ok(())
    }
}

impl PurchaseOrderSource for InMemoryPurchaseOrderStore {
    fn find_by_number(&self, number: &str) -> Result<Option<PurchaseOrder>, SourceError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| SourceError::new("purchase order store lock poisoned"))?;
        Ok(orders.get(number).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGoodsReceiptStore {
    receipts: RwLock<HashMap<String, GoodsReceipt>>,
}

impl InMemoryGoodsReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, receipt: GoodsReceipt) -> Result<(), SourceError> {
        let mut receipts = self
            .receipts
            .write()
            .map_err(|_| SourceError::new("goods receipt store lock poisoned"))?;
        receipts.insert(receipt.po_number.clone(), receipt);
        Ok(())
    }
}

impl GoodsReceiptSource for InMemoryGoodsReceiptStore {
    fn find_by_po_number(&self, po_number: &str) -> Result<Option<GoodsReceipt>, SourceError> {
        let receipts = self
            .receipts
            .read()
            .map_err(|_| SourceError::new("goods receipt store lock poisoned"))?;
        Ok(receipts.get(po_number).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRateCardStore {
    cards: RwLock<Vec<RateCard>>,
}

impl InMemoryRateCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, card: RateCard) -> Result<(), SourceError> {
        let mut cards = self
            .cards
            .write()
            .map_err(|_| SourceError::new("rate card store lock poisoned"))?;
        cards.push(card);
        Ok(())
    }
}

impl RateCardSource for InMemoryRateCardStore {
    fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<RateCard>, SourceError> {
        let cards = self
            .cards
            .read()
            .map_err(|_| SourceError::new("rate card store lock poisoned"))?;
        Ok(cards
            .iter()
            .filter(|c| c.vendor_id == vendor_id)
            .cloned()
            .collect())
    }
}
