use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::api::errors::FlagError;
use crate::conditions::condition_models::{ConditionType, FeatureCondition, OperatorType};
use crate::flags::flag_models::{Environment, FeatureFlag, FeatureVariant};

/// Definition supplied on create. Timestamps are stamped by the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagDefinition {
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
}

/// Partial update; `None` keeps the current value. `updated_at` is stamped on
/// every successful update, even an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub rollout_percentage: Option<u8>,
    #[serde(default)]
    pub conditions: Option<Vec<FeatureCondition>>,
    #[serde(default)]
    pub variants: Option<Vec<FeatureVariant>>,
    #[serde(default)]
    pub environment: Option<Environment>,
}

/// In-memory store of flag definitions, keyed by flag key.
///
/// Flags are seeded at process start and mutated through the administrative
/// surface; nothing is persisted across restarts. The map is shared between
/// the admin path and concurrent evaluation calls, so it sits behind a
/// read-write lock - the evaluation path has no suspension points and only
/// ever takes the read side.
pub struct FlagRegistry {
    flags: RwLock<HashMap<String, FeatureFlag>>,
}

impl Default for FlagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagRegistry {
    pub fn new() -> Self {
        FlagRegistry {
            flags: RwLock::new(HashMap::new()),
        }
    }

    pub fn create_flag(&self, definition: FlagDefinition) -> Result<FeatureFlag, FlagError> {
        validate(definition.rollout_percentage, &definition.variants)?;

        let mut flags = self.flags.write().expect("flag registry lock poisoned");
        if flags.contains_key(&definition.key) {
            return Err(FlagError::FlagAlreadyExists(definition.key));
        }

        let now = Utc::now();
        let flag = FeatureFlag {
            key: definition.key,
            name: definition.name,
            description: definition.description,
            enabled: definition.enabled,
            rollout_percentage: definition.rollout_percentage,
            conditions: definition.conditions,
            variants: definition.variants,
            environment: definition.environment,
            created_at: now,
            updated_at: now,
        };
        flags.insert(flag.key.clone(), flag.clone());
        tracing::info!(flag_key = %flag.key, "created flag");
        Ok(flag)
    }

    /// Applies a partial update. Absence is an operator mistake here, unlike
    /// on the evaluation path, so a missing key is an error.
    pub fn update_flag(&self, flag_key: &str, update: FlagUpdate) -> Result<FeatureFlag, FlagError> {
        let mut flags = self.flags.write().expect("flag registry lock poisoned");
        let flag = flags
            .get_mut(flag_key)
            .ok_or_else(|| FlagError::FlagNotFound(flag_key.to_string()))?;

        let rollout_percentage = update.rollout_percentage.unwrap_or(flag.rollout_percentage);
        validate(
            rollout_percentage,
            update.variants.as_ref().unwrap_or(&flag.variants),
        )?;

        if let Some(name) = update.name {
            flag.name = name;
        }
        if let Some(description) = update.description {
            flag.description = description;
        }
        if let Some(enabled) = update.enabled {
            flag.enabled = enabled;
        }
        flag.rollout_percentage = rollout_percentage;
        if let Some(conditions) = update.conditions {
            flag.conditions = conditions;
        }
        if let Some(variants) = update.variants {
            flag.variants = variants;
        }
        if let Some(environment) = update.environment {
            flag.environment = environment;
        }
        flag.updated_at = Utc::now();
        tracing::info!(flag_key, "updated flag");
        Ok(flag.clone())
    }

    /// Removes a flag. Deleting a missing key is not an error; returns
    /// whether anything was removed.
    pub fn delete_flag(&self, flag_key: &str) -> bool {
        let removed = self
            .flags
            .write()
            .expect("flag registry lock poisoned")
            .remove(flag_key)
            .is_some();
        if removed {
            tracing::info!(flag_key, "deleted flag");
        }
        removed
    }

    pub fn get_flag(&self, flag_key: &str) -> Option<FeatureFlag> {
        self.flags
            .read()
            .expect("flag registry lock poisoned")
            .get(flag_key)
            .cloned()
    }

    pub fn all_flags(&self) -> Vec<FeatureFlag> {
        self.flags
            .read()
            .expect("flag registry lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn flags_for_environment(&self, environment: Environment) -> Vec<FeatureFlag> {
        self.flags
            .read()
            .expect("flag registry lock poisoned")
            .values()
            .filter(|flag| flag.environment == environment)
            .cloned()
            .collect()
    }

    /// Seeds the bootstrap defaults a fresh process starts with.
    pub fn seed_demo_flags(&self) {
        for definition in demo_flag_definitions() {
            match self.create_flag(definition) {
                Ok(flag) => tracing::info!(flag_key = %flag.key, "seeded flag"),
                Err(e) => tracing::warn!("skipped seed flag: {e}"),
            }
        }
    }
}

fn validate(rollout_percentage: u8, variants: &[FeatureVariant]) -> Result<(), FlagError> {
    if rollout_percentage > 100 {
        return Err(FlagError::InvalidFlagDefinition(format!(
            "rollout_percentage must be within [0, 100], got {rollout_percentage}"
        )));
    }
    for variant in variants {
        if variant.percentage > 100 {
            return Err(FlagError::InvalidFlagDefinition(format!(
                "variant '{}' percentage must be within [0, 100], got {}",
                variant.key, variant.percentage
            )));
        }
    }
    let mut seen = std::collections::HashSet::new();
    for variant in variants {
        if !seen.insert(variant.key.as_str()) {
            return Err(FlagError::InvalidFlagDefinition(format!(
                "duplicate variant key '{}'",
                variant.key
            )));
        }
    }
    // weight sums are deliberately not validated; buckets past the
    // accumulated total fall through to the first variant
    Ok(())
}

fn demo_flag_definitions() -> Vec<FlagDefinition> {
    vec![
        FlagDefinition {
            key: "new-dashboard".to_string(),
            name: "New dashboard".to_string(),
            description: "Gradual rollout of the rebuilt seller dashboard".to_string(),
            enabled: true,
            rollout_percentage: 50,
            conditions: vec![],
            variants: vec![],
            environment: Environment::Production,
        },
        FlagDefinition {
            key: "premium-support".to_string(),
            name: "Premium support".to_string(),
            description: "In-app support chat for paying tiers".to_string(),
            enabled: true,
            rollout_percentage: 100,
            conditions: vec![FeatureCondition {
                condition_type: ConditionType::Subscription,
                operator: OperatorType::In,
                value: json!(["premium", "enterprise"]),
            }],
            variants: vec![],
            environment: Environment::Production,
        },
        FlagDefinition {
            key: "checkout-redesign".to_string(),
            name: "Checkout redesign".to_string(),
            description: "A/B test of the single-page checkout".to_string(),
            enabled: true,
            rollout_percentage: 100,
            conditions: vec![],
            variants: vec![
                FeatureVariant {
                    key: "control".to_string(),
                    name: Some("Current checkout".to_string()),
                    percentage: 50,
                    config: Some(HashMap::from([(
                        "button_color".to_string(),
                        json!("blue"),
                    )])),
                },
                FeatureVariant {
                    key: "test".to_string(),
                    name: Some("Single-page checkout".to_string()),
                    percentage: 50,
                    config: Some(HashMap::from([(
                        "button_color".to_string(),
                        json!("green"),
                    )])),
                },
            ],
            environment: Environment::Production,
        },
    ]
}
