//! Response DTOs. Invoice and patch shapes come straight from the domain
//! crates; only composite responses are defined here.

use serde::Serialize;

use apflow_core::Money;
use apflow_invoicing::Invoice;
use apflow_purchasing::RateCard;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceResponse {
    pub message: String,
    pub invoice: Invoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_invoices: usize,
    pub paid_count: usize,
    /// RECEIVED + DIGITIZING.
    pub processing_count: usize,
    pub total_billing_volume: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorDashboardResponse {
    pub invoices: Vec<Invoice>,
    pub stats: DashboardStats,
    /// Best-effort: empty when the rate-card source is unavailable.
    pub active_rate_cards: Vec<RateCard>,
}
