use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use chrono::Utc;

use apflow_auth::Role;
use apflow_core::Money;
use apflow_infra::InvoiceRepository;
use apflow_invoicing::InvoiceStatus;
use apflow_purchasing::{RateCard, RateCardSource};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/dashboard", get(dashboard))
}

pub async fn dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    let actor = actor.actor();
    if !matches!(actor.role, Role::Vendor | Role::Admin) {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "the vendor dashboard is limited to vendor and admin users",
        );
    }

    let invoices = match services.invoices.list(actor) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut total_billing_volume = Money::ZERO;
    let mut paid_count = 0usize;
    let mut processing_count = 0usize;
    for invoice in &invoices {
        total_billing_volume = match total_billing_volume.checked_add(invoice.amount) {
            Some(v) => v,
            None => {
                return errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "billing volume overflow",
                )
            }
        };
        match invoice.status {
            InvoiceStatus::Paid => paid_count += 1,
            InvoiceStatus::Received | InvoiceStatus::Digitizing => processing_count += 1,
            _ => {}
        }
    }

    let stats = dto::DashboardStats {
        total_invoices: invoices.len(),
        paid_count,
        processing_count,
        total_billing_volume,
    };

    // Rate cards are context, not the primary payload; a broken source
    // degrades to an empty list rather than failing the dashboard.
    let active_rate_cards = actor
        .vendor_id
        .map(|vendor_id| match services.rate_cards.list_for_vendor(vendor_id) {
            Ok(cards) => {
                let now = Utc::now();
                cards
                    .into_iter()
                    .filter(|c| c.is_active_at(now))
                    .collect::<Vec<RateCard>>()
            }
            Err(e) => {
                tracing::warn!(error = %e, "rate card lookup failed; omitting from dashboard");
                Vec::new()
            }
        })
        .unwrap_or_default();

    Json(dto::VendorDashboardResponse {
        invoices,
        stats,
        active_rate_cards,
    })
    .into_response()
}
