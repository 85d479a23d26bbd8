//! Planner trait and implementations
//!
//! A planner asks a language model for a draft plan. Drafts are untrusted:
//! everything a planner returns goes through resolution and validation.

use crate::llm::{split_model_reply, ModelReply};
use crate::Result;
use async_trait::async_trait;

pub mod openrouter;
pub use openrouter::OpenRouterPlanner;

/// Trait for draft generation (LLM controlled)
#[async_trait]
pub trait Planner: Send + Sync {
    async fn draft(&self, message: &str) -> Result<ModelReply>;
}

/// Canned reply used in tests and offline runs.
/// Keeps the pipeline functional without an LLM dependency.
pub struct MockPlanner {
    reply: String,
}

impl MockPlanner {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for MockPlanner {
    fn default() -> Self {
        Self::new(
            r#"Save steadily and invest most of the surplus.
{
  "monthly_savings": 50000,
  "monthly_recommended_investment": 30000,
  "portfolio_allocation": { "equity": 50, "debt": 30, "gold": 10, "emergency": 10 },
  "goals": [ { "name": "Emergency corpus", "target_amount": 300000, "duration_years": 1 } ]
}"#,
        )
    }
}

#[async_trait]
impl Planner for MockPlanner {
    async fn draft(&self, _message: &str) -> Result<ModelReply> {
        split_model_reply(&self.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_planner_returns_draft() {
        let reply = MockPlanner::default().draft("anything").await.unwrap();
        assert_eq!(reply.summary, "Save steadily and invest most of the surplus.");

        let draft = reply.draft.unwrap();
        assert_eq!(draft["monthly_recommended_investment"], 30000);
    }

    #[tokio::test]
    async fn test_mock_planner_surfaces_bad_json() {
        let result = MockPlanner::new("Summary { broken").draft("x").await;
        assert!(result.is_err());
    }
}
