//! Runtime configuration
//!
//! `PlanningPolicy` holds the fixed planning constants used by the
//! calculator, the fallback generator and the validator. `AppConfig`
//! is the service-level configuration loaded from the environment.

use crate::error::PlannerError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Fixed planning constants. These are policy, not user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanningPolicy {
    /// Share of net monthly savings directed to investment
    pub investment_ratio: f64,
    /// Annual return assumed when projecting goal corpora
    pub generation_rate: f64,
    /// Annual return assumed when checking the primary goal's duration
    pub duration_check_rate: f64,
    pub default_duration_years: u32,
    /// Horizon cap for the required-years search
    pub max_years: u32,
    /// Retirement targets below this are assumed to be mis-scaled
    pub retirement_threshold: i64,
    pub retirement_magnitude_factor: i64,
    /// Baseline monthly income when neither draft nor text gives one
    pub fallback_income: i64,
    pub fallback_expenses: i64,
}

impl Default for PlanningPolicy {
    fn default() -> Self {
        Self {
            investment_ratio: 0.6,
            generation_rate: 0.12,
            duration_check_rate: 0.10,
            default_duration_years: 5,
            max_years: crate::tvm::DEFAULT_MAX_YEARS,
            retirement_threshold: 10_000_000,
            retirement_magnitude_factor: 10,
            fallback_income: 100_000,
            fallback_expenses: 50_000,
        }
    }
}

/// Whether the pipeline asks the model for a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    Model,
    FallbackOnly,
}

impl FromStr for PipelineMode {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "model" | "llm" => Ok(PipelineMode::Model),
            "fallback" | "fallback_only" | "offline" => Ok(PipelineMode::FallbackOnly),
            other => Err(PlannerError::ConfigError(format!(
                "Unknown PLANNER_MODE '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineMode::Model => "model",
            PipelineMode::FallbackOnly => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Model endpoint settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "meta-llama/llama-3-70b-instruct".to_string(),
            base_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            max_tokens: 700,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub mode: PipelineMode,
    pub llm: LlmConfig,
    pub policy: PlanningPolicy,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = LlmConfig::default();

        let port: u16 = env::var("PORT")
            .or_else(|_| env::var("API_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| PlannerError::ConfigError(format!("Invalid PORT: {}", e)))?;

        let max_tokens: u32 = match env::var("LLM_MAX_TOKENS") {
            Ok(v) => v
                .parse()
                .map_err(|e| PlannerError::ConfigError(format!("Invalid LLM_MAX_TOKENS: {}", e)))?,
            Err(_) => defaults.max_tokens,
        };

        let llm = LlmConfig {
            api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            model: env::var("OPENROUTER_MODEL").unwrap_or(defaults.model),
            base_url: env::var("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            max_tokens,
        };

        let requested_mode = match env::var("PLANNER_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => PipelineMode::Model,
        };

        Ok(Self {
            port,
            mode: effective_mode(requested_mode, &llm),
            llm,
            policy: PlanningPolicy::default(),
        })
    }
}

/// Without an API key there is no model to ask.
fn effective_mode(requested: PipelineMode, llm: &LlmConfig) -> PipelineMode {
    if llm.api_key.trim().is_empty() {
        PipelineMode::FallbackOnly
    } else {
        requested
    }
}
