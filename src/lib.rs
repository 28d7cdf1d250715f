//! AI Financial Agents
//!
//! A multi-agent financial advisory platform:
//! - Orchestrator routes requests by explicit target, workflow type, or keywords
//! - Fixed advisory and transactional workflows run ordered agent pipelines
//! - An AI CFO agent performs a staged analysis over a company snapshot
//! - Deterministic financial calculator tools live behind a shared hub
//!
//! REQUEST FLOW:
//! INPUT → ROUTE → (AGENT | WORKFLOW) → STAGED ANALYSIS → REPORT

pub mod agent;
pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use orchestrator::Orchestrator;
