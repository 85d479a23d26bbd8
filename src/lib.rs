//! Savings Planner
//!
//! Turns a free-text financial request into a validated savings and
//! investment plan:
//! - Classifies risk appetite from keywords
//! - Extracts income/expense figures from the message
//! - Asks a language model for a draft (optional; never trusted)
//! - Falls back to a deterministic plan generator when the draft is unusable
//! - Normalizes every plan through an ordered rule engine
//!
//! PIPELINE:
//! INPUT → CLASSIFY → EXTRACT → DRAFT → RESOLVE → VALIDATE → COMPLETE

pub mod agent;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extraction;
pub mod fallback;
pub mod llm;
pub mod models;
pub mod planner;
pub mod tvm;
pub mod verification;

pub use error::{PlannerError, Result};

// Re-export common types
pub use agent::{finalize_plan, PlanningAgent};
pub use classifier::{classify_risk, default_allocation};
pub use models::*;
pub use verification::{create_default_validator, PlanValidator};
