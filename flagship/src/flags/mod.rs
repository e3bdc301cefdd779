pub mod flag_matching;
pub mod flag_matching_utils;
pub mod flag_models;
pub mod flag_registry;
pub mod flag_service;
