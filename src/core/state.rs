use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Example prompt the input form starts with.
pub const DEFAULT_PROMPT: &str =
    "A detective cat solves the mystery of the missing tuna in a city of robots.";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Character {
    pub name: String,
    pub description: String, // Visual description, fed to the image prompt
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ComicPanelData {
    pub panel: u32,
    pub description: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

pub type ComicScript = Vec<ComicPanelData>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ComicData {
    pub characters: Vec<Character>,
    pub script: ComicScript,
}

/// Everything the presentation layer needs to render, replaced wholesale on
/// each attempt and on reset.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationState {
    pub prompt: String,
    pub in_progress: bool,
    pub step: String,
    pub error: Option<String>,
    pub comic: Option<ComicScript>,
}

impl GenerationState {
    pub fn seeded() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            in_progress: false,
            step: String::new(),
            error: None,
            comic: None,
        }
    }
}

/// Single shared `GenerationState` plus the attempt epoch that fences out
/// stale writers.
///
/// The epoch is only read and bumped inside the watch sender's closures, so
/// an epoch check and the write it guards can never interleave with another
/// attempt's bump.
#[derive(Debug)]
pub struct StateHub {
    epoch: AtomicU64,
    tx: watch::Sender<GenerationState>,
}

impl StateHub {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU64::new(0),
            tx: watch::Sender::new(GenerationState::seeded()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> GenerationState {
        self.tx.borrow().clone()
    }

    /// Starts a new attempt: bumps the epoch and replaces the state with a
    /// fresh in-progress one. Returns the epoch token the attempt must pass
    /// to every later `apply_if_current`.
    pub fn begin_attempt(&self, prompt: &str) -> u64 {
        let mut token = 0;
        self.tx.send_modify(|state| {
            token = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            *state = GenerationState {
                prompt: prompt.to_string(),
                in_progress: true,
                step: String::new(),
                error: None,
                comic: None,
            };
        });
        token
    }

    /// Applies `f` to the state only if `token` is still the current epoch.
    /// Returns whether the write happened.
    pub fn apply_if_current<F>(&self, token: u64, f: F) -> bool
    where
        F: FnOnce(&mut GenerationState),
    {
        let mut applied = false;
        self.tx.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) == token {
                f(state);
                applied = true;
            }
            applied
        });
        applied
    }

    /// Bumps the epoch (invalidating any in-flight attempt) and restores the
    /// seeded initial state.
    pub fn reset(&self) {
        self.tx.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = GenerationState::seeded();
        });
    }
}

impl Default for StateHub {
    fn default() -> Self {
        Self::new()
    }
}
