use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::errors::FlagError;
use crate::flags::flag_models::{Environment, UserContext};

/// Bulk evaluation request. Omitting `flag_keys` evaluates every flag in the
/// registry against the context.
#[derive(Default, Debug, Deserialize, Serialize)]
pub struct FlagsRequest {
    #[serde(default)]
    pub user_context: UserContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_keys: Option<Vec<String>>,
}

impl FlagsRequest {
    /// Takes a request payload and tries to unmarshall it, mapping both
    /// decode and parse failures onto the API error type.
    pub fn from_bytes(bytes: Bytes) -> Result<FlagsRequest, FlagError> {
        tracing::debug!(len = bytes.len(), "decoding new request");
        let payload = String::from_utf8(bytes.into()).map_err(|e| {
            tracing::error!("failed to decode body: {}", e);
            FlagError::RequestDecodingError(String::from("invalid body encoding"))
        })?;

        Ok(serde_json::from_str::<FlagsRequest>(&payload)?)
    }
}

/// Per-call context for the single-flag endpoints.
#[derive(Default, Debug, Deserialize, Serialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub user_context: UserContext,
}

impl EvaluateRequest {
    pub fn from_bytes(bytes: Bytes) -> Result<EvaluateRequest, FlagError> {
        let payload = String::from_utf8(bytes.into()).map_err(|e| {
            tracing::error!("failed to decode body: {}", e);
            FlagError::RequestDecodingError(String::from("invalid body encoding"))
        })?;

        Ok(serde_json::from_str::<EvaluateRequest>(&payload)?)
    }
}

/// A flag's value in the bulk response: `true`/`false` for plain flags, the
/// variant key for multivariate ones.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Boolean(bool),
    String(String),
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsResponse {
    pub feature_flags: HashMap<String, FlagValue>,
    /// Config payloads for the enabled flags that carry one.
    pub feature_flag_payloads: HashMap<String, Value>,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvaluateResponse {
    pub enabled: bool,
    pub variant: Option<String>,
    pub config: Option<HashMap<String, Value>>,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbTestResponse {
    pub variant: String,
    pub in_test: bool,
    pub config: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ListFlagsQuery {
    pub environment: Option<Environment>,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResetAssignmentsResponse {
    pub removed: usize,
}
