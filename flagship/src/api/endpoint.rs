use std::collections::HashMap;

use axum::extract::{MatchedPath, Path, State};
use axum::Json;
use axum_client_ip::InsecureClientIp;
use bytes::Bytes;
use serde_json::Value;
use uuid::Uuid;

use crate::api::errors::FlagError;
use crate::api::types::{
    AbTestResponse, EvaluateRequest, EvaluateResponse, FlagValue, FlagsRequest, FlagsResponse,
};
use crate::flags::flag_models::VariantConfig;
use crate::router;

/// Bulk evaluation endpoint. Only supports a specific shape of data, and
/// rejects any malformed data.
pub async fn flags(
    State(state): State<router::State>,
    InsecureClientIp(ip): InsecureClientIp,
    path: MatchedPath,
    body: Bytes,
) -> Result<Json<FlagsResponse>, FlagError> {
    let request_id = Uuid::new_v4();
    let request = FlagsRequest::from_bytes(body)?;

    let keys = match &request.flag_keys {
        Some(keys) => keys.clone(),
        None => state
            .flag_service
            .get_all_flags()
            .into_iter()
            .map(|flag| flag.key)
            .collect(),
    };

    tracing::info!(
        %request_id,
        ip = %ip,
        path = path.as_str(),
        identity = request.user_context.identity(),
        flag_count = keys.len(),
        "evaluating flags"
    );

    let mut feature_flags = HashMap::new();
    let mut feature_flag_payloads = HashMap::new();
    for key in keys {
        let flag = state.flag_service.get_flag(&key);
        let evaluation = state.flag_service.evaluate_flag(&key, &request.user_context);

        let multivariate = flag.map_or(false, |flag| !flag.variants.is_empty());
        let value = match (&evaluation.variant, evaluation.enabled && multivariate) {
            (Some(variant), true) => FlagValue::String(variant.clone()),
            _ => FlagValue::Boolean(evaluation.enabled),
        };
        feature_flags.insert(key.clone(), value);

        if let Some(config) = evaluation.config {
            if !config.is_empty() {
                feature_flag_payloads.insert(key, config_to_value(config));
            }
        }
    }

    Ok(Json(FlagsResponse {
        feature_flags,
        feature_flag_payloads,
    }))
}

/// Single-flag evaluation: the full `{enabled, variant, config}` view.
pub async fn flag(
    State(state): State<router::State>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<EvaluateResponse>, FlagError> {
    let request = EvaluateRequest::from_bytes(body)?;
    let evaluation = state.flag_service.evaluate_flag(&key, &request.user_context);

    Ok(Json(EvaluateResponse {
        enabled: evaluation.enabled,
        variant: evaluation.variant,
        config: evaluation.config,
    }))
}

pub async fn ab_test(
    State(state): State<router::State>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<AbTestResponse>, FlagError> {
    let request = EvaluateRequest::from_bytes(body)?;
    let result = state
        .flag_service
        .evaluate_ab_test(&key, &request.user_context);

    Ok(Json(AbTestResponse {
        variant: result.variant,
        in_test: result.in_test,
        config: result.config,
    }))
}

fn config_to_value(config: VariantConfig) -> Value {
    Value::Object(config.into_iter().collect())
}
