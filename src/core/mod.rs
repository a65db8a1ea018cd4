//! Core question answering engine

pub mod cache;
pub mod chain;
pub mod confidence;
pub mod config;
pub mod errors;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod usage_tracker;

#[cfg(test)]
pub(crate) mod testing;
