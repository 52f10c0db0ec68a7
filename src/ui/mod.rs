use crate::core::state::{ComicScript, GenerationState};
use crate::services::workflow::ComicGenerator;
use crate::utils::image::decode_image_ref;
use anyhow::{anyhow, Context, Result};
use indicatif::ProgressBar;
use inquire::{Confirm, Text};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// What the terminal shows for a given state. Exactly one view is visible at
/// a time: an error wins over progress, progress over a finished comic, and
/// the input form shows otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Input { prompt: String },
    Progress { step: String, outline: Option<ComicScript> },
    Error { message: String },
    Comic { script: ComicScript },
}

impl View {
    pub fn from_state(state: &GenerationState) -> View {
        if let Some(message) = &state.error {
            View::Error { message: message.clone() }
        } else if state.in_progress {
            View::Progress {
                step: state.step.clone(),
                outline: state.comic.clone(),
            }
        } else if let Some(script) = &state.comic {
            View::Comic { script: script.clone() }
        } else {
            View::Input { prompt: state.prompt.clone() }
        }
    }
}

/// Interactive loop: prompt, watch the generation progress, show the comic
/// (or the error), repeat until the user quits.
pub async fn run_shell(generator: Arc<ComicGenerator>, output_folder: &str) -> Result<()> {
    println!("Comic Creator");
    println!("Turn your ideas into a 4-panel mini-comic with AI\n");

    let mut rx = generator.subscribe();

    loop {
        let state = rx.borrow_and_update().clone();
        match View::from_state(&state) {
            View::Input { prompt } => {
                let answer = Text::new("Story idea:").with_initial_value(&prompt).prompt();
                let idea = match answer {
                    Ok(text) => text,
                    Err(_) => {
                        println!("Stopping as requested.");
                        break;
                    }
                };
                if idea.trim().is_empty() {
                    println!("Please enter a story idea.");
                    continue;
                }

                tokio::spawn({
                    let generator = generator.clone();
                    async move { generator.generate(&idea).await }
                });

                // Wait for the attempt to register before re-rendering
                if rx.changed().await.is_err() {
                    break;
                }
            }
            View::Progress { step, outline } => {
                let pb = ProgressBar::new_spinner();
                pb.enable_steady_tick(Duration::from_millis(120));
                pb.set_message(step);

                let mut outline_shown = outline.is_some();
                if let Some(script) = &outline {
                    print_outline(&pb, script);
                }

                loop {
                    if rx.changed().await.is_err() {
                        break;
                    }
                    let state = rx.borrow_and_update().clone();
                    if state.error.is_some() || !state.in_progress {
                        break;
                    }
                    pb.set_message(state.step.clone());
                    if !outline_shown {
                        if let Some(script) = &state.comic {
                            print_outline(&pb, script);
                            outline_shown = true;
                        }
                    }
                }
                pb.finish_and_clear();
            }
            View::Error { message } => {
                eprintln!("\n{}\n", message);
                match Confirm::new("Try a different story?").with_default(true).prompt() {
                    Ok(true) => generator.reset(),
                    Ok(false) => {
                        println!("Stopping as requested.");
                        break;
                    }
                    Err(_) => {
                        println!("Error reading input, stopping.");
                        break;
                    }
                }
            }
            View::Comic { script } => {
                println!("\nYour comic is ready!\n");
                for panel in &script {
                    println!("Panel {}: {}", panel.panel, panel.description);
                }

                let dir = Path::new(output_folder).join(comic_slug(&state.prompt));
                match save_panels(&script, &dir).await {
                    Ok(paths) => {
                        println!();
                        for path in &paths {
                            println!("Saved {}", path.display());
                        }
                    }
                    Err(e) => eprintln!("Could not save panel images: {}", e),
                }

                println!();
                match Confirm::new("Create another comic?").with_default(true).prompt() {
                    Ok(true) => generator.reset(),
                    Ok(false) => {
                        println!("Stopping as requested.");
                        break;
                    }
                    Err(_) => {
                        println!("Error reading input, stopping.");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_outline(pb: &ProgressBar, script: &ComicScript) {
    pb.println("The script is in:");
    for panel in script {
        pb.println(format!("  Panel {}: {}", panel.panel, panel.description));
    }
}

/// Writes each panel's decoded image under `dir` as `panel_<n>.<ext>`.
pub async fn save_panels(script: &ComicScript, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {:?}", dir))?;

    let mut paths = Vec::with_capacity(script.len());
    for panel in script {
        let image_ref = panel
            .image_ref
            .as_deref()
            .ok_or_else(|| anyhow!("Panel {} has no image", panel.panel))?;
        let (bytes, ext) = decode_image_ref(image_ref)?;

        let path = dir.join(format!("panel_{}.{}", panel.panel, ext));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        paths.push(path);
    }
    Ok(paths)
}

/// Folder-name slug of a story prompt.
pub fn comic_slug(prompt: &str) -> String {
    let words: Vec<String> = prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect();

    let mut slug = words.join("-");
    slug.truncate(40);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "comic".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ComicPanelData;

    fn state() -> GenerationState {
        GenerationState {
            prompt: "a story".to_string(),
            in_progress: false,
            step: String::new(),
            error: None,
            comic: None,
        }
    }

    fn panels(with_images: bool) -> ComicScript {
        vec![
            ComicPanelData {
                panel: 1,
                description: "one".to_string(),
                image_ref: with_images.then(|| "data:image/png;base64,QUJD".to_string()),
            },
            ComicPanelData {
                panel: 2,
                description: "two".to_string(),
                image_ref: with_images.then(|| "data:image/jpeg;base64,REVG".to_string()),
            },
        ]
    }

    #[test]
    fn test_error_view_wins_over_everything() {
        let mut s = state();
        s.error = Some("boom".to_string());
        s.in_progress = true;
        s.comic = Some(panels(true));

        assert_eq!(View::from_state(&s), View::Error { message: "boom".to_string() });
    }

    #[test]
    fn test_progress_view_carries_the_outline() {
        let mut s = state();
        s.in_progress = true;
        s.step = "Drawing...".to_string();
        s.comic = Some(panels(false));

        match View::from_state(&s) {
            View::Progress { step, outline } => {
                assert_eq!(step, "Drawing...");
                assert_eq!(outline.unwrap().len(), 2);
            }
            other => panic!("Expected progress view, got {:?}", other),
        }
    }

    #[test]
    fn test_comic_view_only_when_idle() {
        let mut s = state();
        s.comic = Some(panels(true));

        match View::from_state(&s) {
            View::Comic { script } => assert_eq!(script.len(), 2),
            other => panic!("Expected comic view, got {:?}", other),
        }
    }

    #[test]
    fn test_input_view_carries_the_prompt() {
        let s = state();
        assert_eq!(View::from_state(&s), View::Input { prompt: "a story".to_string() });
    }

    #[test]
    fn test_comic_slug() {
        assert_eq!(comic_slug("A Detective Cat!"), "a-detective-cat");
        assert_eq!(comic_slug("  spaces   everywhere  "), "spaces-everywhere");
        assert_eq!(comic_slug("???"), "comic");
        assert_eq!(
            comic_slug("a very long prompt that keeps going and going and going"),
            "a-very-long-prompt-that-keeps-going-and"
        );
    }

    #[tokio::test]
    async fn test_save_panels_writes_decoded_files() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let dir = temp_dir.path().join("my-comic");

        let paths = save_panels(&panels(true), &dir).await?;

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], dir.join("panel_1.png"));
        assert_eq!(paths[1], dir.join("panel_2.jpg"));
        assert_eq!(std::fs::read(&paths[0])?, b"ABC");
        assert_eq!(std::fs::read(&paths[1])?, b"DEF");
        Ok(())
    }

    #[tokio::test]
    async fn test_save_panels_requires_images() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = save_panels(&panels(false), temp_dir.path()).await;
        assert!(result.is_err());
    }
}
