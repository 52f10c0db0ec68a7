use crate::core::config::Config;
use crate::services::image::{GeminiImageConfig, OpenAiImageConfig};
use anyhow::Result;
use inquire::{Select, Text};

/// Fills in whatever the image section of the config is missing before the
/// first run, asking only for what cannot be derived from the llm section.
pub fn run_setup(config: &mut Config) -> Result<()> {
    if fill_image_config(config)? {
        config.save()?;
        println!("Configuration saved.");
    }
    Ok(())
}

fn fill_image_config(config: &mut Config) -> Result<bool> {
    let mut needs_save = false;

    if !matches!(config.image.provider.as_str(), "gemini" | "openai") {
        let choice = Select::new("Select an image provider:", vec!["gemini", "openai"]).prompt()?;
        config.image.provider = choice.to_string();
        needs_save = true;
    }

    match config.image.provider.as_str() {
        "gemini" => {
            if config.image.gemini.is_none() {
                let api_key = match config.llm.gemini.as_ref() {
                    Some(cfg) => {
                        println!("Reusing the Gemini API key from the llm section.");
                        cfg.api_key.clone()
                    }
                    None => Text::new("Gemini API key for image generation:").prompt()?,
                };
                config.image.gemini = Some(GeminiImageConfig {
                    api_key,
                    model: "imagen-3.0-generate-002".to_string(),
                    aspect_ratio: "1:1".to_string(),
                });
                needs_save = true;
            }
        }
        "openai" => {
            if config.image.openai.is_none() {
                let (api_key, base_url) = match config.llm.openai.as_ref() {
                    Some(cfg) => {
                        println!("Reusing the OpenAI API key from the llm section.");
                        (cfg.api_key.clone(), cfg.base_url.clone())
                    }
                    None => (Text::new("OpenAI API key for image generation:").prompt()?, None),
                };
                config.image.openai = Some(OpenAiImageConfig {
                    api_key,
                    model: "dall-e-3".to_string(),
                    size: "1024x1024".to_string(),
                    base_url,
                });
                needs_save = true;
            }
        }
        _ => {}
    }

    Ok(needs_save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::{GeminiConfig, LlmConfig, OpenAIConfig};

    fn base_config() -> Config {
        Config {
            output_folder: "comics".to_string(),
            llm: LlmConfig {
                provider: "gemini".to_string(),
                gemini: Some(GeminiConfig {
                    api_key: "gemini-key".to_string(),
                    model: "gemini-2.5-flash".to_string(),
                }),
                openai: None,
            },
            image: Default::default(),
        }
    }

    #[test]
    fn test_reuses_gemini_key_from_llm_section() {
        let mut config = base_config();
        let changed = fill_image_config(&mut config).unwrap();

        assert!(changed);
        let gemini = config.image.gemini.expect("Image config should be filled");
        assert_eq!(gemini.api_key, "gemini-key");
        assert_eq!(gemini.model, "imagen-3.0-generate-002");
    }

    #[test]
    fn test_reuses_openai_key_and_base_url() {
        let mut config = base_config();
        config.image.provider = "openai".to_string();
        config.llm.openai = Some(OpenAIConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: Some("https://proxy.example/v1".to_string()),
        });

        let changed = fill_image_config(&mut config).unwrap();

        assert!(changed);
        let openai = config.image.openai.expect("Image config should be filled");
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.base_url.as_deref(), Some("https://proxy.example/v1"));
    }

    #[test]
    fn test_complete_config_is_left_alone() {
        let mut config = base_config();
        config.image.gemini = Some(GeminiImageConfig {
            api_key: "already-set".to_string(),
            model: "imagen-3.0-generate-002".to_string(),
            aspect_ratio: "16:9".to_string(),
        });

        let changed = fill_image_config(&mut config).unwrap();

        assert!(!changed);
        assert_eq!(config.image.gemini.unwrap().aspect_ratio, "16:9");
    }
}
