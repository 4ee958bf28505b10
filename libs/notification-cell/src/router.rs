// libs/notification-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::VisibilityNotifier;

pub fn notification_routes(config: Arc<AppConfig>, notifier: Arc<VisibilityNotifier>) -> Router {
    Router::new()
        .route("/reports/{report_id}/release", post(handlers::release_report))
        .route("/appointments/{appointment_id}/reports", get(handlers::appointment_reports))
        .route("/patients/{patient_id}", get(handlers::patient_notifications))
        .route("/acknowledge", post(handlers::acknowledge))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(notifier)
}
