use std::collections::HashMap;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde_json::json;

use crate::conditions::condition_models::{ConditionType, FeatureCondition, OperatorType};
use crate::flags::flag_models::{Environment, FeatureFlag, FeatureVariant, UserContext};
use crate::flags::flag_registry::FlagDefinition;

pub fn random_string(prefix: &str, length: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    format!("{}{}", prefix, suffix)
}

/// An enabled, fully rolled out flag with no targeting and no variants.
pub fn flag_definition(key: &str) -> FlagDefinition {
    FlagDefinition {
        key: key.to_string(),
        name: format!("{key} flag"),
        description: String::new(),
        enabled: true,
        rollout_percentage: 100,
        conditions: vec![],
        variants: vec![],
        environment: Environment::Development,
    }
}

/// A 50/50 control/test definition with a distinct config per variant.
pub fn multivariate_definition(key: &str) -> FlagDefinition {
    let mut definition = flag_definition(key);
    definition.variants = vec![
        variant(
            "control",
            50,
            Some(HashMap::from([("button_color".to_string(), json!("blue"))])),
        ),
        variant(
            "test",
            50,
            Some(HashMap::from([("button_color".to_string(), json!("green"))])),
        ),
    ];
    definition
}

pub fn variant(
    key: &str,
    percentage: u8,
    config: Option<HashMap<String, serde_json::Value>>,
) -> FeatureVariant {
    FeatureVariant {
        key: key.to_string(),
        name: None,
        percentage,
        config,
    }
}

pub fn condition(
    condition_type: ConditionType,
    operator: OperatorType,
    value: serde_json::Value,
) -> FeatureCondition {
    FeatureCondition {
        condition_type,
        operator,
        value,
    }
}

pub fn context_with_user(user_id: &str) -> UserContext {
    UserContext {
        user_id: Some(user_id.to_string()),
        ..Default::default()
    }
}

/// A bare `FeatureFlag` for matcher-level tests, bypassing the registry.
pub fn flag_with_rollout(key: &str, rollout_percentage: u8) -> FeatureFlag {
    let now = Utc::now();
    FeatureFlag {
        key: key.to_string(),
        name: format!("{key} flag"),
        description: String::new(),
        enabled: true,
        rollout_percentage,
        conditions: vec![],
        variants: vec![],
        environment: Environment::Development,
        created_at: now,
        updated_at: now,
    }
}

pub fn flag_with_variants(key: &str, weights: &[(&str, u8)]) -> FeatureFlag {
    let mut flag = flag_with_rollout(key, 100);
    flag.variants = weights
        .iter()
        .map(|(variant_key, percentage)| variant(variant_key, *percentage, None))
        .collect();
    flag
}
