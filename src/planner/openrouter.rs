//! OpenRouter-backed planner

use crate::config::LlmConfig;
use crate::llm::{split_model_reply, ModelReply, OpenRouterClient};
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

pub struct OpenRouterPlanner {
    client: OpenRouterClient,
}

impl OpenRouterPlanner {
    pub fn new(config: LlmConfig) -> Result<Self> {
        Ok(Self {
            client: OpenRouterClient::new(config)?,
        })
    }
}

#[async_trait]
impl crate::planner::Planner for OpenRouterPlanner {
    async fn draft(&self, message: &str) -> Result<ModelReply> {
        let reply = self.client.complete(message).await?;
        debug!(reply_len = reply.len(), "Model reply received");

        split_model_reply(&reply)
    }
}
