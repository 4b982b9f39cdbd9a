use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};

use apflow_auth::Role;
use apflow_infra::ProjectStore;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/projects", get(projects))
}

pub async fn projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<ActorContext>,
) -> axum::response::Response {
    let actor = actor.actor();
    if !matches!(actor.role, Role::Admin | Role::FinanceUser) {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "project listing is limited to admin and finance users",
        );
    }

    match services.projects.list_visible(actor) {
        Ok(projects) => Json(projects).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
