use anyhow::Result;
use std::sync::Arc;
use story2comic::core::config::Config;
use story2comic::services::image::create_image_client;
use story2comic::services::llm::{create_llm, LlmClient};
use story2comic::services::safety::LlmSafetyChecker;
use story2comic::services::script::LlmScriptService;
use story2comic::services::setup;
use story2comic::services::workflow::ComicGenerator;
use story2comic::ui;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    // Without it we have no API keys, so there is nothing useful to do.
    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Interactive Setup (image provider details)
    setup::run_setup(&mut config)?;

    // 3. Initialize service clients
    let llm: Arc<dyn LlmClient> = create_llm(&config)?.into();
    let artist = create_image_client(&config)?;

    // 4. Wire the generator and run the shell
    let generator = Arc::new(ComicGenerator::new(
        Box::new(LlmSafetyChecker::new(llm.clone())),
        Box::new(LlmScriptService::new(llm)),
        artist,
    ));

    ui::run_shell(generator, &config.output_folder).await?;

    Ok(())
}
