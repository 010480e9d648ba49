use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Sends a single prompt and returns the raw text of the reply.
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}
