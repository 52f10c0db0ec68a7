use crate::core::state::ComicData;
use crate::services::llm::LlmClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ScriptService: Send + Sync {
    /// Turns a story idea into characters plus an ordered panel script.
    async fn generate_comic_script(&self, prompt: &str) -> Result<ComicData>;
}

pub struct LlmScriptService {
    llm: Arc<dyn LlmClient>,
}

impl LlmScriptService {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    fn get_system_prompt(&self) -> String {
        "You are a comic strip writer. Respond only with valid JSON.".to_string()
    }

    fn build_prompt(&self, idea: &str) -> String {
        format!(
            "Write a 4-panel comic strip for the following story idea.\
            \n\nRules:\
            \n1. Invent the main characters. Give each a name and a short visual \
            description (species, build, clothing, colors) that an illustrator can follow.\
            \n2. Write exactly 4 panels numbered 1 to 4, in narrative order. Each panel \
            description is one or two sentences of visual action, no dialogue.\
            \n3. The last panel should land the punchline or resolution.\
            \n\nReturn only a JSON object of this shape:\
            {{ \"characters\": [ {{ \"name\": \"...\", \"description\": \"...\" }} ], \
            \"script\": [ {{ \"panel\": 1, \"description\": \"...\" }} ] }}\
            \n\nStory idea: {}",
            idea
        )
    }

    fn parse_response(&self, response: &str) -> Result<ComicData> {
        let clean_json = strip_code_blocks(response);
        let comic: ComicData = serde_json::from_str(&clean_json)
            .context(format!("Failed to parse comic script JSON: {}", clean_json))?;
        if comic.script.is_empty() {
            anyhow::bail!("Script contained no panels");
        }
        Ok(comic)
    }
}

#[async_trait]
impl ScriptService for LlmScriptService {
    async fn generate_comic_script(&self, prompt: &str) -> Result<ComicData> {
        let response = self
            .llm
            .chat(&self.get_system_prompt(), &self.build_prompt(prompt))
            .await?;
        self.parse_response(&response)
    }
}

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}
