use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::errors::FlagError;
use crate::api::types::{ListFlagsQuery, ResetAssignmentsResponse};
use crate::flags::flag_models::{FeatureFlag, FeatureFlagList};
use crate::flags::flag_registry::{FlagDefinition, FlagUpdate};
use crate::router;

pub async fn create_flag(
    State(state): State<router::State>,
    Json(definition): Json<FlagDefinition>,
) -> Result<(StatusCode, Json<FeatureFlag>), FlagError> {
    let flag = state.flag_service.create_flag(definition)?;
    Ok((StatusCode::CREATED, Json(flag)))
}

pub async fn update_flag(
    State(state): State<router::State>,
    Path(key): Path<String>,
    Json(update): Json<FlagUpdate>,
) -> Result<Json<FeatureFlag>, FlagError> {
    let flag = state.flag_service.update_flag(&key, update)?;
    Ok(Json(flag))
}

/// Deleting a missing key is not an error; both paths come back 204.
pub async fn delete_flag(State(state): State<router::State>, Path(key): Path<String>) -> StatusCode {
    state.flag_service.delete_flag(&key);
    StatusCode::NO_CONTENT
}

pub async fn list_flags(
    State(state): State<router::State>,
    Query(query): Query<ListFlagsQuery>,
) -> Json<FeatureFlagList> {
    let flags = match query.environment {
        Some(environment) => state.flag_service.get_flags_for_environment(environment),
        None => state.flag_service.get_all_flags(),
    };
    Json(FeatureFlagList { flags })
}

pub async fn reset_assignments(
    State(state): State<router::State>,
    Path(key): Path<String>,
) -> Json<ResetAssignmentsResponse> {
    let removed = state.flag_service.reset_assignments(&key);
    Json(ResetAssignmentsResponse { removed })
}
