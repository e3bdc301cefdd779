use serde_json::Value;

use crate::conditions::condition_models::{ConditionType, FeatureCondition, OperatorType};
use crate::flags::flag_models::UserContext;

/// Resolves the context value a condition compares against. `Custom` reads
/// `custom_attributes[condition.value]`, reusing the condition value as the
/// lookup key; every other type maps to a fixed context field.
fn context_value(condition: &FeatureCondition, context: &UserContext) -> Option<Value> {
    match condition.condition_type {
        ConditionType::UserId => context.user_id.clone().map(Value::String),
        ConditionType::UserType => context.user_type.clone().map(Value::String),
        ConditionType::Location => context.location.clone().map(Value::String),
        ConditionType::Subscription => context.subscription_tier.clone().map(Value::String),
        ConditionType::Custom => {
            let key = condition.value.as_str()?;
            context.custom_attributes.as_ref()?.get(key).cloned()
        }
    }
}

/// Evaluates a single condition against the context.
///
/// A missing context field fails the condition for every operator, and so
/// does a type-mismatched comparison (e.g. `greater_than` on a string).
/// Targeting sits on hot request paths, so malformed input resolves to
/// `false` here and never propagates.
pub fn match_condition(condition: &FeatureCondition, context: &UserContext) -> bool {
    let Some(target) = context_value(condition, context) else {
        return false;
    };

    match condition.operator {
        OperatorType::Equals => target == condition.value,
        OperatorType::Contains => match (target.as_str(), condition.value.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
        OperatorType::In | OperatorType::NotIn => {
            let Some(options) = condition.value.as_array() else {
                return false;
            };
            let contained = options.contains(&target);
            if condition.operator == OperatorType::In {
                contained
            } else {
                !contained
            }
        }
        OperatorType::GreaterThan | OperatorType::LessThan => {
            let (Some(lhs), Some(rhs)) = (target.as_f64(), condition.value.as_f64()) else {
                return false;
            };
            if condition.operator == OperatorType::GreaterThan {
                lhs > rhs
            } else {
                lhs < rhs
            }
        }
    }
}

/// Logical AND over all conditions; an empty list passes.
pub fn all_conditions_match(conditions: &[FeatureCondition], context: &UserContext) -> bool {
    conditions
        .iter()
        .all(|condition| match_condition(condition, context))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    fn condition(
        condition_type: ConditionType,
        operator: OperatorType,
        value: Value,
    ) -> FeatureCondition {
        FeatureCondition {
            condition_type,
            operator,
            value,
        }
    }

    fn buyer_context() -> UserContext {
        UserContext {
            user_id: Some("user123".to_string()),
            user_type: Some("buyer".to_string()),
            location: Some("US-CA".to_string()),
            subscription_tier: Some("premium".to_string()),
            custom_attributes: Some(HashMap::from([
                ("orders".to_string(), json!(42)),
                ("beta_tester".to_string(), json!("beta_tester")),
                ("plan".to_string(), json!("annual")),
            ])),
        }
    }

    #[test]
    fn test_equals_is_strict() {
        let context = buyer_context();
        assert!(match_condition(
            &condition(ConditionType::UserType, OperatorType::Equals, json!("buyer")),
            &context
        ));
        assert!(!match_condition(
            &condition(
                ConditionType::UserType,
                OperatorType::Equals,
                json!("seller")
            ),
            &context
        ));
        // no cross-type coercion
        assert!(!match_condition(
            &condition(ConditionType::UserId, OperatorType::Equals, json!(123)),
            &context
        ));
    }

    #[test]
    fn test_contains_requires_strings() {
        let context = buyer_context();
        assert!(match_condition(
            &condition(ConditionType::Location, OperatorType::Contains, json!("CA")),
            &context
        ));
        assert!(!match_condition(
            &condition(ConditionType::Location, OperatorType::Contains, json!("NY")),
            &context
        ));
        assert!(!match_condition(
            &condition(ConditionType::Location, OperatorType::Contains, json!(7)),
            &context
        ));
    }

    #[test]
    fn test_in_and_not_in_membership() {
        let context = buyer_context();
        let buyers = json!(["buyer", "admin"]);
        assert!(match_condition(
            &condition(ConditionType::UserType, OperatorType::In, buyers.clone()),
            &context
        ));
        assert!(!match_condition(
            &condition(ConditionType::UserType, OperatorType::NotIn, buyers),
            &context
        ));
        // a non-list value never matches, for either operator
        assert!(!match_condition(
            &condition(ConditionType::UserType, OperatorType::In, json!("buyer")),
            &context
        ));
        assert!(!match_condition(
            &condition(ConditionType::UserType, OperatorType::NotIn, json!("x")),
            &context
        ));
    }

    #[test]
    fn test_numeric_comparisons_fail_closed_on_non_numbers() {
        let context = buyer_context();
        // every typed context field is a string, so numeric operators never match them
        assert!(!match_condition(
            &condition(
                ConditionType::UserType,
                OperatorType::GreaterThan,
                json!(10)
            ),
            &context
        ));
        assert!(!match_condition(
            &condition(ConditionType::UserType, OperatorType::LessThan, json!(10)),
            &context
        ));
        // custom resolves a numeric attribute, but the operand is the lookup
        // key string, so the comparison still fails closed
        assert!(!match_condition(
            &condition(
                ConditionType::Custom,
                OperatorType::GreaterThan,
                json!("orders")
            ),
            &context
        ));
        // a numeric condition value is not a valid lookup key at all
        assert!(!match_condition(
            &condition(ConditionType::Custom, OperatorType::GreaterThan, json!(10)),
            &context
        ));
    }

    #[test]
    fn test_custom_value_doubles_as_lookup_key() {
        // `custom_attributes["beta_tester"] == "beta_tester"` holds, so the
        // same string works as both lookup key and comparison operand.
        let context = buyer_context();
        assert!(match_condition(
            &condition(
                ConditionType::Custom,
                OperatorType::Equals,
                json!("beta_tester")
            ),
            &context
        ));
        // `custom_attributes["plan"]` is "annual", not "plan"
        assert!(!match_condition(
            &condition(ConditionType::Custom, OperatorType::Equals, json!("plan")),
            &context
        ));
        // missing attribute fails closed
        assert!(!match_condition(
            &condition(
                ConditionType::Custom,
                OperatorType::Equals,
                json!("missing")
            ),
            &context
        ));
    }

    #[test]
    fn test_missing_context_field_fails_every_operator() {
        let context = UserContext::default();
        for operator in [
            OperatorType::Equals,
            OperatorType::Contains,
            OperatorType::In,
            OperatorType::NotIn,
            OperatorType::GreaterThan,
            OperatorType::LessThan,
        ] {
            assert!(
                !match_condition(
                    &condition(ConditionType::UserType, operator, json!(["buyer"])),
                    &context
                ),
                "operator {operator:?} should fail closed on a missing field"
            );
        }
    }

    #[test]
    fn test_all_conditions_are_anded() {
        let context = buyer_context();
        let satisfied = condition(ConditionType::UserType, OperatorType::Equals, json!("buyer"));
        let unsatisfied = condition(
            ConditionType::Subscription,
            OperatorType::Equals,
            json!("free"),
        );

        assert!(all_conditions_match(&[], &context));
        assert!(all_conditions_match(&[satisfied.clone()], &context));
        assert!(!all_conditions_match(&[satisfied, unsatisfied], &context));
    }
}
