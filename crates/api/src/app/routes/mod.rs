use axum::Router;

pub mod finance;
pub mod invoices;
pub mod system;
pub mod vendors;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/invoices", invoices::router())
        .nest("/vendors", vendors::router())
        .nest("/finance", finance::router())
}
