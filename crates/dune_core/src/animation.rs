//! Character clip catalog and single-clip playback.
//!
//! The character asset is described by a small JSON file: a model scale and an
//! ordered list of looping clips. Behaviors refer to clips by index, so the
//! order in the file matters (Survey, Walk, Run for the fox).
//!
//! The asset loads off the frame loop. Until it arrives the animator has no
//! mixer and every call is a no-op; the behavior requested in the meantime is
//! remembered and applied when the catalog is attached.
//!
//! The JSON format stores `duration_ms` for readability; on load this is
//! converted to seconds.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::behavior::Behavior;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration_secs: f32,
}

/// Ordered clips for one character.
#[derive(Debug, Clone, Default)]
pub struct ClipCatalog {
    clips: Vec<AnimationClip>,
}

impl ClipCatalog {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self { clips }
    }

    pub fn get(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Everything the scene needs from the loaded character model.
#[derive(Debug, Clone)]
pub struct CharacterAsset {
    pub model_id: String,
    pub scale: f32,
    pub clips: ClipCatalog,
}

/// Playback state of one clip inside the mixer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipAction {
    pub time: f32,
    pub weight: f32,
    pub playing: bool,
}

impl ClipAction {
    fn stop(&mut self) {
        self.playing = false;
        self.weight = 0.0;
    }

    fn restart(&mut self) {
        self.time = 0.0;
        self.weight = 1.0;
        self.playing = true;
    }
}

/// One action per catalog clip; at most one is playing at a time.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    catalog: ClipCatalog,
    actions: Vec<ClipAction>,
}

impl AnimationMixer {
    pub fn new(catalog: ClipCatalog) -> Self {
        let actions = vec![ClipAction::default(); catalog.len()];
        Self { catalog, actions }
    }

    pub fn catalog(&self) -> &ClipCatalog {
        &self.catalog
    }

    pub fn action(&self, index: usize) -> Option<&ClipAction> {
        self.actions.get(index)
    }

    pub fn playing_count(&self) -> usize {
        self.actions.iter().filter(|a| a.playing).count()
    }

    /// Stop everything, then start `index` from its beginning at full weight.
    fn play_exclusive(&mut self, index: usize) {
        for action in &mut self.actions {
            action.stop();
        }
        self.actions[index].restart();
    }

    /// Advance every playing action by `dt`, wrapping at the clip's end.
    pub fn update(&mut self, dt: f32) {
        for (action, clip) in self.actions.iter_mut().zip(&self.catalog.clips) {
            if !action.playing {
                continue;
            }
            action.time += dt;
            if clip.duration_secs > 0.0 && action.time >= clip.duration_secs {
                action.time = action.time.rem_euclid(clip.duration_secs);
            }
        }
    }
}

/// What the renderer needs to pose the character this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterPose<'a> {
    pub clip_name: &'a str,
    /// Position within the clip in `[0, 1)`.
    pub phase: f32,
    pub scale: f32,
}

pub struct CharacterAnimator {
    model_scale: f32,
    mixer: Option<AnimationMixer>,
    active: Option<usize>,
    requested: Behavior,
}

impl CharacterAnimator {
    pub fn new(initial: Behavior) -> Self {
        Self {
            model_scale: 1.0,
            mixer: None,
            active: None,
            requested: initial,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.mixer.is_some()
    }

    pub fn active_clip(&self) -> Option<&AnimationClip> {
        let mixer = self.mixer.as_ref()?;
        mixer.catalog.get(self.active?)
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    /// Install a freshly loaded asset and start the clip for the behavior that
    /// was requested while it loaded.
    pub fn attach(&mut self, asset: CharacterAsset) -> Result<(), String> {
        log::info!(
            "Character '{}' ready with {} clips",
            asset.model_id,
            asset.clips.len()
        );
        self.model_scale = asset.scale;
        self.mixer = Some(AnimationMixer::new(asset.clips));
        self.active = None;
        self.set_behavior(self.requested).map(|_| ())
    }

    /// Switch to the clip mapped to `behavior`.
    ///
    /// Returns `Ok(true)` when a new clip started and `Ok(false)` when that
    /// clip was already playing. A missing catalog or clip is an error for the
    /// caller to report; the previous clip keeps playing either way.
    pub fn set_behavior(&mut self, behavior: Behavior) -> Result<bool, String> {
        self.requested = behavior;
        let index = behavior.clip_index();
        let Some(mixer) = self.mixer.as_mut() else {
            return Err(format!(
                "Character not loaded yet; '{}' clip will start once it is",
                behavior
            ));
        };
        if index >= mixer.catalog.len() {
            return Err(format!(
                "Character has no clip {} for behavior '{}' ({} clips loaded)",
                index,
                behavior,
                mixer.catalog.len()
            ));
        }
        if self.active == Some(index) {
            return Ok(false);
        }
        mixer.play_exclusive(index);
        self.active = Some(index);
        Ok(true)
    }

    pub fn update(&mut self, dt: f32) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.update(dt);
        }
    }

    pub fn pose(&self) -> Option<CharacterPose<'_>> {
        let mixer = self.mixer.as_ref()?;
        let index = self.active?;
        let clip = mixer.catalog.get(index)?;
        let action = mixer.actions.get(index)?;
        let phase = if clip.duration_secs > 0.0 {
            (action.time / clip.duration_secs).clamp(0.0, 1.0 - f32::EPSILON)
        } else {
            0.0
        };
        Some(CharacterPose {
            clip_name: &clip.name,
            phase,
            scale: self.model_scale,
        })
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct CharacterFileJson {
    version: String,
    model_id: String,
    #[serde(default = "default_scale")]
    scale: f32,
    clips: Vec<ClipJson>,
}

#[derive(Debug, Deserialize)]
struct ClipJson {
    name: String,
    duration_ms: u64,
}

/// Load a character descriptor from disk.
pub fn load_character_file(path: &Path) -> Result<CharacterAsset, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read character file {}: {e}", path.display()))?;
    let json: CharacterFileJson = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse character file {}: {e}", path.display()))?;
    validate_character_json(&json)?;

    let clips = json
        .clips
        .into_iter()
        .map(|c| AnimationClip {
            name: c.name,
            duration_secs: c.duration_ms as f32 / 1000.0,
        })
        .collect();

    Ok(CharacterAsset {
        model_id: json.model_id,
        scale: json.scale,
        clips: ClipCatalog::new(clips),
    })
}

fn validate_character_json(json: &CharacterFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Character validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.model_id.is_empty() {
        return Err("Character validation failed: model_id is empty".to_string());
    }
    if !(json.scale > 0.0) {
        return Err(format!(
            "Character validation failed: scale must be > 0 (got {})",
            json.scale
        ));
    }
    if json.clips.is_empty() {
        log::warn!(
            "Character '{}' has no clips. It will load but never animate.",
            json.model_id
        );
    }
    for (i, clip) in json.clips.iter().enumerate() {
        if clip.name.is_empty() {
            return Err(format!(
                "Character validation failed: clip {} has an empty name",
                i
            ));
        }
        if clip.duration_ms == 0 {
            return Err(format!(
                "Character validation failed: clip '{}' has zero duration",
                clip.name
            ));
        }
    }
    Ok(())
}

const fn default_scale() -> f32 {
    1.0
}
