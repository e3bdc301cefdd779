use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, patch, post},
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api::{definitions_endpoint, endpoint},
    config::Config,
    flags::flag_service::FlagService,
};

#[derive(Clone)]
pub struct State {
    pub flag_service: Arc<FlagService>,
    pub config: Config,
}

pub fn router(flag_service: Arc<FlagService>, config: Config) -> Router {
    let state = State {
        flag_service,
        config: config.clone(),
    };

    // Very permissive CORS policy, as old SDK versions
    // and reverse proxies might send funky headers.
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .allow_origin(AllowOrigin::mirror_request());

    let status_router = Router::new()
        .route("/", get(index))
        .route("/_liveness", get(liveness));

    // evaluation endpoints sit on the request hot path
    let flags_router = Router::new()
        .route("/flags", post(endpoint::flags))
        .route("/flags/:key", post(endpoint::flag))
        .route("/flags/:key/ab-test", post(endpoint::ab_test))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrency));

    let admin_router = Router::new()
        .route(
            "/api/flags",
            post(definitions_endpoint::create_flag).get(definitions_endpoint::list_flags),
        )
        .route(
            "/api/flags/:key",
            patch(definitions_endpoint::update_flag).delete(definitions_endpoint::delete_flag),
        )
        .route(
            "/api/flags/:key/assignments/reset",
            post(definitions_endpoint::reset_assignments),
        );

    Router::new()
        .merge(status_router)
        .merge(flags_router)
        .merge(admin_router)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn index() -> &'static str {
    "feature flags"
}

pub async fn liveness() -> &'static str {
    "ok"
}
