use crate::core::error::GenerationError;
use crate::core::state::{ComicPanelData, ComicScript, GenerationState, StateHub};
use crate::services::image::ImageClient;
use crate::services::safety::SafetyChecker;
use crate::services::script::ScriptService;
use futures_util::future::try_join_all;
use log::{info, warn};
use tokio::sync::watch;

pub const STEP_SAFETY: &str = "Analyzing story idea for safety...";
pub const STEP_SCRIPT: &str = "Writing a dramatic script...";
pub const STEP_ART: &str = "Hiring an AI artist to draw the panels...";

/// Drives one story idea through safety moderation, script writing and
/// parallel panel illustration, publishing every intermediate state.
pub struct ComicGenerator {
    safety: Box<dyn SafetyChecker>,
    script: Box<dyn ScriptService>,
    artist: Box<dyn ImageClient>,
    state: StateHub,
}

impl ComicGenerator {
    pub fn new(
        safety: Box<dyn SafetyChecker>,
        script: Box<dyn ScriptService>,
        artist: Box<dyn ImageClient>,
    ) -> Self {
        Self {
            safety,
            script,
            artist,
            state: StateHub::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> GenerationState {
        self.state.snapshot()
    }

    /// Discards any in-flight attempt and restores the seeded initial state.
    pub fn reset(&self) {
        self.state.reset();
    }

    /// Runs one full generation attempt. All outcomes, success or failure,
    /// are reported through the published state.
    ///
    /// A later `generate` or `reset` supersedes this attempt: the pipeline
    /// keeps running but every publication it tries is refused.
    pub async fn generate(&self, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return;
        }

        let token = self.state.begin_attempt(prompt);
        info!("Starting comic generation: {}", prompt);

        match self.run_pipeline(token, prompt).await {
            Ok(script) => {
                info!("Comic generation complete ({} panels)", script.len());
                self.state.apply_if_current(token, |s| {
                    s.comic = Some(script);
                    s.in_progress = false;
                    s.step.clear();
                });
            }
            Err(err) => {
                warn!("Comic generation failed: {}", err);
                self.state.apply_if_current(token, |s| {
                    s.error = Some(err.to_string());
                    s.comic = None; // Clear partial results on error
                    s.in_progress = false;
                    s.step.clear();
                });
            }
        }
    }

    async fn run_pipeline(&self, token: u64, prompt: &str) -> Result<ComicScript, GenerationError> {
        self.state.apply_if_current(token, |s| s.step = STEP_SAFETY.to_string());
        let is_safe = self
            .safety
            .check_content_safety(prompt)
            .await
            .map_err(|e| GenerationError::Unknown(e.to_string()))?;
        if !is_safe {
            return Err(GenerationError::ContentRejected);
        }

        self.state.apply_if_current(token, |s| s.step = STEP_SCRIPT.to_string());
        let comic = self
            .script
            .generate_comic_script(prompt)
            .await
            .map_err(|e| GenerationError::ScriptGenerationFailed(e.to_string()))?;

        // Publish the placeholder panels immediately, before any artwork exists
        let script = comic.script;
        let characters = comic.characters;
        self.state.apply_if_current(token, |s| s.comic = Some(script.clone()));

        self.state.apply_if_current(token, |s| s.step = STEP_ART.to_string());

        // Illustrate all panels in parallel, failing fast on the first error
        // so the user sees a specific message.
        let image_futures = script
            .iter()
            .map(|panel| self.artist.generate_panel_image(&panel.description, &characters));
        let image_refs = try_join_all(image_futures)
            .await
            .map_err(|e| GenerationError::IllustrationFailed(e.to_string()))?;

        // try_join_all keeps input order, so refs line up with panels no
        // matter which finished first.
        let final_script: ComicScript = script
            .into_iter()
            .zip(image_refs)
            .map(|(panel, image_ref)| ComicPanelData {
                image_ref: Some(image_ref),
                ..panel
            })
            .collect();

        Ok(final_script)
    }
}
