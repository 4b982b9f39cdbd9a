//! Shared service wiring: stores plus the update pipeline over them.

use std::sync::Arc;

use apflow_infra::{
    InMemoryGoodsReceiptStore, InMemoryInvoiceRepository, InMemoryProjectStore,
    InMemoryPurchaseOrderStore, InMemoryRateCardStore, UpdatePipeline,
};
use apflow_matching::ThreeWayMatcher;

type Pipeline = UpdatePipeline<
    Arc<InMemoryInvoiceRepository>,
    Arc<InMemoryPurchaseOrderStore>,
    Arc<InMemoryGoodsReceiptStore>,
>;

pub struct AppServices {
    pub invoices: Arc<InMemoryInvoiceRepository>,
    pub projects: Arc<InMemoryProjectStore>,
    pub rate_cards: Arc<InMemoryRateCardStore>,
    pub purchase_orders: Arc<InMemoryPurchaseOrderStore>,
    pub goods_receipts: Arc<InMemoryGoodsReceiptStore>,
    pipeline: Pipeline,
}

impl AppServices {
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

pub fn build_services() -> AppServices {
    let invoices = Arc::new(InMemoryInvoiceRepository::new());
    let purchase_orders = Arc::new(InMemoryPurchaseOrderStore::new());
    let goods_receipts = Arc::new(InMemoryGoodsReceiptStore::new());

    let pipeline = UpdatePipeline::new(
        Arc::clone(&invoices),
        ThreeWayMatcher::new(Arc::clone(&purchase_orders), Arc::clone(&goods_receipts)),
    );

    AppServices {
        invoices,
        projects: Arc::new(InMemoryProjectStore::new()),
        rate_cards: Arc::new(InMemoryRateCardStore::new()),
        purchase_orders,
        goods_receipts,
        pipeline,
    }
}
