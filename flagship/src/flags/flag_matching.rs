use serde::Serialize;

use crate::conditions::condition_matching::all_conditions_match;
use crate::flags::flag_matching_utils::bucket;
use crate::flags::flag_models::{FeatureFlag, UserContext};

/// Where an evaluation terminated. The first four states are sequential
/// short-circuits carrying a negative result; only `Enabled` permits variant
/// and config resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlagMatchReason {
    NotFound,
    Disabled,
    RolloutExcluded,
    TargetingFailed,
    Enabled,
}

impl std::fmt::Display for FeatureFlagMatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FeatureFlagMatchReason::NotFound => "not_found",
                FeatureFlagMatchReason::Disabled => "disabled",
                FeatureFlagMatchReason::RolloutExcluded => "rollout_excluded",
                FeatureFlagMatchReason::TargetingFailed => "targeting_failed",
                FeatureFlagMatchReason::Enabled => "enabled",
            }
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FeatureFlagMatch {
    pub matches: bool,
    pub reason: FeatureFlagMatchReason,
}

impl FeatureFlagMatch {
    fn miss(reason: FeatureFlagMatchReason) -> Self {
        FeatureFlagMatch {
            matches: false,
            reason,
        }
    }
}

/// Stateless per-call matcher over one evaluation context. Registry lookup
/// and sticky assignment live in the service layer; everything here is a pure
/// function of `(flag, context)`.
pub struct FeatureFlagMatcher<'a> {
    context: &'a UserContext,
}

impl<'a> FeatureFlagMatcher<'a> {
    pub fn new(context: &'a UserContext) -> Self {
        FeatureFlagMatcher { context }
    }

    /// Runs the enabled -> rollout -> targeting chain for one flag.
    pub fn get_match(&self, flag: &FeatureFlag) -> FeatureFlagMatch {
        if !flag.enabled {
            return FeatureFlagMatch::miss(FeatureFlagMatchReason::Disabled);
        }
        if !self.is_in_rollout(flag) {
            return FeatureFlagMatch::miss(FeatureFlagMatchReason::RolloutExcluded);
        }
        if !all_conditions_match(&flag.conditions, self.context) {
            return FeatureFlagMatch::miss(FeatureFlagMatchReason::TargetingFailed);
        }
        FeatureFlagMatch {
            matches: true,
            reason: FeatureFlagMatchReason::Enabled,
        }
    }

    /// Rollout admission. 100 admits everyone and 0 admits no one without
    /// hashing; anything in between compares the caller's fixed bucket
    /// against the threshold, so raising the percentage can only admit more
    /// of the population, never evict anyone.
    pub fn is_in_rollout(&self, flag: &FeatureFlag) -> bool {
        let percentage = flag.rollout_percentage;
        if percentage >= 100 {
            return true;
        }
        if percentage == 0 {
            return false;
        }
        let rollout_bucket = bucket(&format!("{}:{}", flag.key, self.context.identity()));
        rollout_bucket < u64::from(percentage)
    }

    /// Picks a variant by walking cumulative weights over an independent
    /// bucket. The ":variant" salt keeps variant choice uncorrelated with
    /// rollout inclusion. Returns `None` only for an empty variant list.
    pub fn get_matching_variant(&self, flag: &FeatureFlag) -> Option<String> {
        let variant_bucket = bucket(&format!(
            "{}:{}:variant",
            flag.key,
            self.context.identity()
        ));

        let mut total_percentage = 0u64;
        for variant in &flag.variants {
            total_percentage += u64::from(variant.percentage);
            if variant_bucket < total_percentage {
                return Some(variant.key.clone());
            }
        }

        // Weights that sum below 100 leave a tail of uncovered buckets; those
        // fall through to the first variant in list order.
        flag.variants.first().map(|variant| variant.key.clone())
    }
}
