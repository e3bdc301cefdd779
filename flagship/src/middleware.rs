use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};

use crate::flags::flag_models::{UserContext, VariantConfig};
use crate::router;

/// Flag key a gated route is controlled by. Attach it as a route-scoped
/// extension layer, outside the `feature_gate` middleware.
#[derive(Debug, Clone, Copy)]
pub struct GatedFlag(pub &'static str);

/// Evaluation outcome attached to admitted requests, for downstream handlers
/// to branch on.
#[derive(Debug, Clone)]
pub struct FeatureFlagContext {
    pub enabled: bool,
    pub variant: Option<String>,
    pub config: VariantConfig,
}

/// Builds the evaluation context from the identity headers the edge proxy
/// forwards for authenticated requests. Absent headers leave the caller
/// anonymous.
pub fn context_from_headers(headers: &HeaderMap) -> UserContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    UserContext {
        user_id: header("x-user-id"),
        user_type: header("x-user-type"),
        location: header("x-location"),
        subscription_tier: header("x-subscription-tier"),
        custom_attributes: None,
    }
}

/// Rejects requests for which the gated flag is off with a 404, and attaches
/// the evaluation as a `FeatureFlagContext` extension otherwise.
pub async fn feature_gate(
    State(state): State<router::State>,
    Extension(GatedFlag(flag_key)): Extension<GatedFlag>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = context_from_headers(request.headers());
    let evaluation = state.flag_service.evaluate_flag(flag_key, &context);

    if !evaluation.enabled {
        return (StatusCode::NOT_FOUND, "feature not available").into_response();
    }

    request.extensions_mut().insert(FeatureFlagContext {
        enabled: true,
        variant: evaluation.variant,
        config: evaluation.config.unwrap_or_default(),
    });
    next.run(request).await
}
