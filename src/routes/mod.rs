pub mod activities;
pub mod children;
pub mod extract;
pub mod health;
pub mod metrics;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{services::photos::MAX_PHOTO_BYTES, AppState};

/// Room for multipart framing and capture fields on top of the photo itself.
const BODY_LIMIT: usize = MAX_PHOTO_BYTES + 1024 * 1024;

pub fn router(state: AppState, api_prefix: &str) -> Router {
    let api = Router::new()
        .route(
            "/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route("/activities/generate", post(activities::generate_activities))
        .route(
            "/activities/{activity_id}/submit-photo",
            post(activities::submit_photo),
        )
        .route("/children", post(children::create_child))
        .route("/children/{id}", get(children::get_child))
        .route("/children/{id}/tokens", get(children::get_tokens))
        .route("/children/{id}/completions", get(children::list_completions));

    let prefix = api_prefix.trim_end_matches('/');
    let app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler));
    let app = if prefix.is_empty() {
        app.merge(api)
    } else {
        app.nest(prefix, api)
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any);

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
