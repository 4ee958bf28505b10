use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use diagnostic_cell::diagnostic_routes;
use notification_cell::notification_routes;

use crate::state::AppServices;

pub fn create_router(services: &AppServices) -> Router {
    Router::new()
        .route("/", get(|| async { "X-ray Clinic API is running!" }))
        .nest(
            "/appointments",
            appointment_routes(services.config.clone(), services.workflow.clone()),
        )
        .nest(
            "/diagnostics",
            diagnostic_routes(services.config.clone(), services.diagnostics.clone()),
        )
        .nest(
            "/notifications",
            notification_routes(services.config.clone(), services.notifier.clone()),
        )
}
