use serde::{Deserialize, Serialize};

/// Which context field a condition reads. `Custom` is special: the condition
/// value doubles as the lookup key into `custom_attributes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    UserId,
    UserType,
    Location,
    Subscription,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorType {
    Equals,
    Contains,
    In,
    NotIn,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub operator: OperatorType,
    /// Scalar or list, interpreted according to the operator.
    pub value: serde_json::Value,
}
