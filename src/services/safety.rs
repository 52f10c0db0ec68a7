use crate::services::llm::LlmClient;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SafetyChecker: Send + Sync {
    /// Returns whether the story idea is acceptable input. Errors are
    /// transport/service failures, not verdicts.
    async fn check_content_safety(&self, prompt: &str) -> Result<bool>;
}

pub struct LlmSafetyChecker {
    llm: Arc<dyn LlmClient>,
}

impl LlmSafetyChecker {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SafetyChecker for LlmSafetyChecker {
    async fn check_content_safety(&self, prompt: &str) -> Result<bool> {
        let question = format!(
            "Evaluate the following story idea for a family-friendly comic strip. \
            Is it free of hate speech, explicit violence, sexual content and self-harm? \
            Respond with exactly one word: SAFE or UNSAFE.\
            \n\nStory idea: {}",
            prompt
        );

        let verdict = self
            .llm
            .chat("You are a strict content moderator. Reply with a single word.", &question)
            .await?;

        // Anything other than a clean SAFE counts as rejected
        Ok(verdict.trim().eq_ignore_ascii_case("SAFE"))
    }
}
