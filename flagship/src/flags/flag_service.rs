use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

use crate::api::errors::FlagError;
use crate::flags::flag_matching::{FeatureFlagMatcher, FeatureFlagMatchReason};
use crate::flags::flag_models::{Environment, FeatureFlag, UserContext, VariantConfig};
use crate::flags::flag_registry::{FlagDefinition, FlagRegistry, FlagUpdate};

/// Variant reported for an enabled flag that defines no variants.
pub const DEFAULT_VARIANT: &str = "default";

/// Variant reported by `evaluate_ab_test` for callers outside the test.
pub const CONTROL_VARIANT: &str = "control";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbTestResult {
    pub variant: String,
    pub in_test: bool,
    pub config: VariantConfig,
}

/// One flag's full evaluation for a context, as attached to gated requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagEvaluation {
    pub enabled: bool,
    pub variant: Option<String>,
    pub config: Option<VariantConfig>,
}

impl FlagEvaluation {
    fn off() -> Self {
        FlagEvaluation {
            enabled: false,
            variant: None,
            config: None,
        }
    }
}

/// Service layer for flag evaluation and administration.
///
/// Owns the registry and the sticky variant assignments; constructed once at
/// startup and shared behind an `Arc`. Every operation is synchronous and
/// non-blocking - there is no I/O anywhere on the evaluation path.
pub struct FlagService {
    registry: FlagRegistry,
    /// Sticky variant assignments keyed by `(identity, flag key)`. An entry
    /// is written on first assignment and never overwritten by
    /// recomputation, so a user keeps their first-seen variant even after
    /// the flag's weights change. The map grows by one entry per distinct
    /// pair for the process lifetime; only `reset_assignments` clears it.
    assignments: RwLock<HashMap<(String, String), String>>,
}

impl Default for FlagService {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagService {
    pub fn new() -> Self {
        FlagService {
            registry: FlagRegistry::new(),
            assignments: RwLock::new(HashMap::new()),
        }
    }

    // ---- evaluation surface ----

    /// Whether `flag_key` is active for this context. A key absent from the
    /// registry is not an error, it is equivalent to disabled.
    pub fn is_enabled(&self, flag_key: &str, context: &UserContext) -> bool {
        self.get_enabled_flag(flag_key, context).is_some()
    }

    /// The sticky variant for this context, `None` whenever the flag is not
    /// enabled. The full enabled chain re-runs on every call, so disabling a
    /// flag mid-session immediately blocks variant retrieval.
    pub fn get_variant(&self, flag_key: &str, context: &UserContext) -> Option<String> {
        let flag = self.get_enabled_flag(flag_key, context)?;
        if flag.variants.is_empty() {
            return Some(DEFAULT_VARIANT.to_string());
        }
        Some(self.sticky_variant(&flag, context))
    }

    /// The assigned variant's config payload, `None` whenever the flag is
    /// not enabled.
    pub fn get_config(&self, flag_key: &str, context: &UserContext) -> Option<VariantConfig> {
        let flag = self.get_enabled_flag(flag_key, context)?;
        if flag.variants.is_empty() {
            return Some(VariantConfig::new());
        }
        let variant = self.sticky_variant(&flag, context);
        Some(flag.variant_config(&variant))
    }

    pub fn evaluate_ab_test(&self, test_key: &str, context: &UserContext) -> AbTestResult {
        let Some(flag) = self.get_enabled_flag(test_key, context) else {
            return AbTestResult {
                variant: CONTROL_VARIANT.to_string(),
                in_test: false,
                config: VariantConfig::new(),
            };
        };
        if flag.variants.is_empty() {
            return AbTestResult {
                variant: DEFAULT_VARIANT.to_string(),
                in_test: true,
                config: VariantConfig::new(),
            };
        }
        let variant = self.sticky_variant(&flag, context);
        let config = flag.variant_config(&variant);
        AbTestResult {
            variant,
            in_test: true,
            config,
        }
    }

    /// Single-call form of the surface above, for handlers and middleware.
    pub fn evaluate_flag(&self, flag_key: &str, context: &UserContext) -> FlagEvaluation {
        let Some(flag) = self.get_enabled_flag(flag_key, context) else {
            return FlagEvaluation::off();
        };
        if flag.variants.is_empty() {
            return FlagEvaluation {
                enabled: true,
                variant: Some(DEFAULT_VARIANT.to_string()),
                config: Some(VariantConfig::new()),
            };
        }
        let variant = self.sticky_variant(&flag, context);
        let config = flag.variant_config(&variant);
        FlagEvaluation {
            enabled: true,
            variant: Some(variant),
            config: Some(config),
        }
    }

    // ---- administrative surface ----

    pub fn create_flag(&self, definition: FlagDefinition) -> Result<FeatureFlag, FlagError> {
        self.registry.create_flag(definition)
    }

    pub fn update_flag(&self, flag_key: &str, update: FlagUpdate) -> Result<FeatureFlag, FlagError> {
        self.registry.update_flag(flag_key, update)
    }

    pub fn delete_flag(&self, flag_key: &str) -> bool {
        self.registry.delete_flag(flag_key)
    }

    pub fn get_flag(&self, flag_key: &str) -> Option<FeatureFlag> {
        self.registry.get_flag(flag_key)
    }

    pub fn get_all_flags(&self) -> Vec<FeatureFlag> {
        self.registry.all_flags()
    }

    pub fn get_flags_for_environment(&self, environment: Environment) -> Vec<FeatureFlag> {
        self.registry.flags_for_environment(environment)
    }

    pub fn seed_demo_flags(&self) {
        self.registry.seed_demo_flags();
    }

    /// Drops the sticky assignments recorded for one flag, releasing every
    /// user back to recomputation on their next evaluation. Returns how many
    /// entries were removed.
    pub fn reset_assignments(&self, flag_key: &str) -> usize {
        let mut assignments = self.assignments.write().expect("assignments lock poisoned");
        let before = assignments.len();
        assignments.retain(|(_, key), _| key != flag_key);
        let removed = before - assignments.len();
        tracing::info!(flag_key, removed, "reset sticky assignments");
        removed
    }

    // ---- internals ----

    fn get_enabled_flag(&self, flag_key: &str, context: &UserContext) -> Option<FeatureFlag> {
        let Some(flag) = self.registry.get_flag(flag_key) else {
            tracing::debug!(
                flag_key,
                reason = %FeatureFlagMatchReason::NotFound,
                "flag evaluation short-circuited"
            );
            return None;
        };
        let result = FeatureFlagMatcher::new(context).get_match(&flag);
        if result.matches {
            Some(flag)
        } else {
            tracing::debug!(
                flag_key,
                reason = %result.reason,
                "flag evaluation short-circuited"
            );
            None
        }
    }

    /// Cache-first variant assignment. Two racing first-time calls compute
    /// the same pure value, so `or_insert` only decides who pays for the
    /// clone; the entry itself is stable once present.
    fn sticky_variant(&self, flag: &FeatureFlag, context: &UserContext) -> String {
        let cache_key = (context.identity().to_string(), flag.key.clone());
        if let Some(existing) = self
            .assignments
            .read()
            .expect("assignments lock poisoned")
            .get(&cache_key)
        {
            return existing.clone();
        }

        let variant = FeatureFlagMatcher::new(context)
            .get_matching_variant(flag)
            .expect("variant list is non-empty");
        self.assignments
            .write()
            .expect("assignments lock poisoned")
            .entry(cache_key)
            .or_insert(variant)
            .clone()
    }
}
