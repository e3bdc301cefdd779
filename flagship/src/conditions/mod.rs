pub mod condition_matching;
pub mod condition_models;
