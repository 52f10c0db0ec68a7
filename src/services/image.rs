use crate::core::config::Config;
use crate::core::state::Character;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_image_provider")]
    pub provider: String,
    pub gemini: Option<GeminiImageConfig>,
    pub openai: Option<OpenAiImageConfig>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: default_image_provider(),
            gemini: None,
            openai: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiImageConfig {
    pub api_key: String,
    #[serde(default = "default_imagen_model")]
    pub model: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAiImageConfig {
    pub api_key: String,
    #[serde(default = "default_openai_image_model")]
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    pub base_url: Option<String>,
}

fn default_image_provider() -> String {
    "gemini".to_string()
}
fn default_imagen_model() -> String {
    "imagen-3.0-generate-002".to_string()
}
fn default_aspect_ratio() -> String {
    "1:1".to_string()
}
fn default_openai_image_model() -> String {
    "dall-e-3".to_string()
}
fn default_image_size() -> String {
    "1024x1024".to_string()
}

/// Draws one panel. Returns an image reference, currently always a
/// `data:<mime>;base64,...` URL carrying the encoded image.
#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate_panel_image(
        &self,
        description: &str,
        characters: &[Character],
    ) -> Result<String>;
}

pub fn create_image_client(config: &Config) -> Result<Box<dyn ImageClient>> {
    info!("Initializing image client for provider: {}", config.image.provider);
    match config.image.provider.as_str() {
        "gemini" => {
            let cfg = config.image.gemini.clone().context("Gemini image config missing")?;
            Ok(Box::new(GeminiImageClient::new(cfg)))
        }
        "openai" => {
            let cfg = config.image.openai.clone().context("OpenAI image config missing")?;
            Ok(Box::new(OpenAiImageClient::new(cfg)))
        }
        _ => Err(anyhow!("Unknown image provider: {}", config.image.provider)),
    }
}

/// Builds the full illustration prompt for one panel: the scene, the
/// character roster (so characters stay visually consistent across panels)
/// and the style directives.
pub fn compose_panel_prompt(description: &str, characters: &[Character]) -> String {
    let mut prompt = format!(
        "A single comic book panel in a vibrant, colorful cartoon style. Scene: {}",
        description
    );
    if !characters.is_empty() {
        let roster = characters
            .iter()
            .map(|c| format!("{}: {}", c.name, c.description))
            .collect::<Vec<_>>()
            .join("; ");
        prompt.push_str(&format!(" Keep these characters consistent: {}.", roster));
    }
    prompt.push_str(" No text, captions or speech bubbles in the image.");
    prompt
}

// --- Gemini (Imagen) ---

pub struct GeminiImageClient {
    config: GeminiImageConfig,
    client: reqwest::Client,
}

impl GeminiImageClient {
    pub fn new(config: GeminiImageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Deserialize)]
struct ImagenPrediction {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: String,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

#[async_trait]
impl ImageClient for GeminiImageClient {
    async fn generate_panel_image(
        &self,
        description: &str,
        characters: &[Character],
    ) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:predict?key={}",
            self.config.model, self.config.api_key
        );

        let request_body = ImagenRequest {
            instances: vec![ImagenInstance {
                prompt: compose_panel_prompt(description, characters),
            }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: self.config.aspect_ratio.clone(),
            },
        };

        let resp = self.client.post(&url)
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Imagen API error: {}", error_text));
        }

        let result: ImagenResponse = resp.json().await?;
        let prediction = result.predictions.into_iter().next().ok_or_else(|| {
            anyhow!("Imagen returned no image. The panel may have been blocked by safety filters.")
        })?;

        let mime = prediction.mime_type.as_deref().unwrap_or("image/png");
        Ok(format!("data:{};base64,{}", mime, prediction.bytes_base64_encoded))
    }
}

// --- OpenAI ---

pub struct OpenAiImageClient {
    config: OpenAiImageConfig,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiImageClient {
    pub fn new(config: OpenAiImageConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1")
            .trim_end_matches('/')
            .to_string();
        Self {
            config,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    response_format: String,
}

#[derive(Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    b64_json: Option<String>,
}

#[async_trait]
impl ImageClient for OpenAiImageClient {
    async fn generate_panel_image(
        &self,
        description: &str,
        characters: &[Character],
    ) -> Result<String> {
        let url = format!("{}/images/generations", self.base_url);

        let request_body = OpenAiImageRequest {
            model: self.config.model.clone(),
            prompt: compose_panel_prompt(description, characters),
            n: 1,
            size: self.config.size.clone(),
            response_format: "b64_json".to_string(),
        };

        let resp = self.client.post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("OpenAI image API error: {}", error_text));
        }

        let result: OpenAiImageResponse = resp.json().await?;
        let b64 = result
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| anyhow!("OpenAI image response empty or missing b64_json"))?;

        Ok(format!("data:image/png;base64,{}", b64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imagen_response_parsing_success() {
        let json = r#"{
            "predictions": [
                {
                    "bytesBase64Encoded": "QUJD",
                    "mimeType": "image/png"
                }
            ]
        }"#;

        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.predictions.len(), 1);
        assert_eq!(result.predictions[0].bytes_base64_encoded, "QUJD");
        assert_eq!(result.predictions[0].mime_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_imagen_response_parsing_filtered() {
        // A fully filtered request comes back with no predictions at all
        let json = r#"{}"#;
        let result: ImagenResponse = serde_json::from_str(json).unwrap();
        assert!(result.predictions.is_empty());
    }

    #[test]
    fn test_openai_image_response_parsing() {
        let json = r#"{
            "created": 1700000000,
            "data": [
                { "b64_json": "QUJD" }
            ]
        }"#;

        let result: OpenAiImageResponse = serde_json::from_str(json).unwrap();
        assert_eq!(result.data[0].b64_json.as_deref(), Some("QUJD"));
    }

    #[test]
    fn test_compose_panel_prompt_includes_roster() {
        let characters = vec![
            Character {
                name: "Detective Whiskers".to_string(),
                description: "a grey tabby cat in a trench coat".to_string(),
            },
            Character {
                name: "Unit-7".to_string(),
                description: "a boxy yellow robot".to_string(),
            },
        ];
        let prompt = compose_panel_prompt("The cat inspects a clue.", &characters);

        assert!(prompt.contains("The cat inspects a clue."));
        assert!(prompt.contains("Detective Whiskers: a grey tabby cat in a trench coat"));
        assert!(prompt.contains("Unit-7: a boxy yellow robot"));
        assert!(prompt.contains("speech bubbles"));
    }

    #[test]
    fn test_compose_panel_prompt_without_characters() {
        let prompt = compose_panel_prompt("An empty alley.", &[]);
        assert!(prompt.contains("An empty alley."));
        assert!(!prompt.contains("consistent:"));
    }

    #[test]
    fn test_image_config_defaults() {
        let config = ImageConfig::default();
        assert_eq!(config.provider, "gemini");
        assert!(config.gemini.is_none());

        let yaml = r#"
provider: gemini
gemini:
  api_key: "key"
"#;
        let config: ImageConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.model, "imagen-3.0-generate-002");
        assert_eq!(gemini.aspect_ratio, "1:1");
    }
}
