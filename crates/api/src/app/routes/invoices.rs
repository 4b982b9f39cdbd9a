use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use apflow_core::InvoiceId;
use apflow_infra::InvoiceRepository;
use apflow_invoicing::InvoicePatch;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, ProvenanceContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice).put(update_invoice))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    match services.invoices.list(actor.actor()) {
        Ok(invoices) => Json(invoices).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match InvoiceId::parse(id) {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id")
        }
    };

    // Out-of-scope records read as absent, same as unknown ids.
    match services.invoices.get(&id, actor.actor()) {
        Ok(Some(versioned)) => Json(versioned.value).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "invoice not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
    Extension(provenance): Extension<ProvenanceContext>,
    Path(id): Path<String>,
    Json(patch): Json<InvoicePatch>,
) -> axum::response::Response {
    let id = match InvoiceId::parse(id) {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id")
        }
    };

    match services.pipeline().update_invoice(
        &id,
        &patch,
        actor.actor(),
        provenance.provenance(),
        Utc::now(),
    ) {
        Ok(outcome) => Json(dto::UpdateInvoiceResponse {
            message: outcome.message.to_string(),
            invoice: outcome.invoice,
        })
        .into_response(),
        Err(e) => errors::update_error_to_response(e),
    }
}
