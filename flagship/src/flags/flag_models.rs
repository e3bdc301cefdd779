use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conditions::condition_models::FeatureCondition;

/// Identity used for bucketing and sticky assignment when the caller carries
/// no user id. All anonymous traffic shares one bucket per flag.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Arbitrary per-variant payload, returned verbatim to callers.
pub type VariantConfig = HashMap<String, serde_json::Value>;

/// Deployment environment tag. Only used for filtering flag listings, never
/// consulted during evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureVariant {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Weight over the 0-99 bucket space. Variant weights define cumulative
    /// thresholds in list order.
    pub percentage: u8,
    #[serde(default)]
    pub config: Option<VariantConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureFlag {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rollout_percentage: u8,
    #[serde(default)]
    pub conditions: Vec<FeatureCondition>,
    #[serde(default)]
    pub variants: Vec<FeatureVariant>,
    #[serde(default)]
    pub environment: Environment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureFlag {
    /// Config payload for a variant key, `{}` when the variant is unknown or
    /// carries no config.
    pub fn variant_config(&self, variant_key: &str) -> VariantConfig {
        self.variants
            .iter()
            .find(|variant| variant.key == variant_key)
            .and_then(|variant| variant.config.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FeatureFlagList {
    pub flags: Vec<FeatureFlag>,
}

/// Per-call evaluation context. Never stored; the sticky assignment cache
/// only remembers the resolved identity string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<HashMap<String, serde_json::Value>>,
}

impl UserContext {
    pub fn identity(&self) -> &str {
        self.user_id.as_deref().unwrap_or(ANONYMOUS_IDENTITY)
    }
}
