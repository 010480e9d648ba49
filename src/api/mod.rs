pub mod middleware;
pub mod tickets;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::context::AppContext;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/health/", get(health))
        .route("/api/tickets/", get(tickets::list).post(tickets::create))
        .route("/api/tickets/stats/", get(tickets::stats))
        .route("/api/tickets/classify/", post(tickets::classify))
        .route(
            "/api/tickets/:id/",
            get(tickets::retrieve)
                .put(tickets::replace)
                .patch(tickets::patch)
                .delete(tickets::destroy),
        )
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::log_requests))
}
