// Resume Analysis: provider fallback chain, result normalization, orchestration.
// All provider calls go through llm_client; document parsing goes through extraction.

pub mod chain;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod sample;
