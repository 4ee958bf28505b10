// libs/diagnostic-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{DiagnosticPipeline, PhysicianReviewService};

#[derive(Clone)]
pub struct DiagnosticState {
    pub pipeline: Arc<DiagnosticPipeline>,
    pub review: Arc<PhysicianReviewService>,
}

pub fn diagnostic_routes(config: Arc<AppConfig>, state: DiagnosticState) -> Router {
    Router::new()
        .route("/appointments/{appointment_id}/xray", post(handlers::upload_xray))
        .route("/appointments/{appointment_id}/diagnosis", post(handlers::submit_diagnosis))
        .route("/reports", get(handlers::list_reports))
        .route(
            "/reports/{report_id}/file",
            post(handlers::attach_report_file)
                .delete(handlers::remove_report_file)
                .get(handlers::download_report_file),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
