//! Runtime parameters and the control events that mutate them.
//!
//! `SimConfig` is the startup configuration read from JSON. `ParamStore` wraps
//! it together with the two live selectors (behavior and time of day) and is
//! handed by reference to every subsystem that needs a value from it. Control
//! surfaces never write the store directly: they queue a `ControlEvent`, and
//! the simulation applies queued events at the start of the next frame.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::behavior::{Behavior, TimeOfDay};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub obstacle_count: usize,
    pub spawn_interval_ms: u64,
    /// Obstacles are never placed with `|x|` below this.
    pub band_radius: f32,
    /// Width of the band obstacles are drawn from, centred on x = 0.
    pub max_x: f32,
    pub spawn_z: f32,
    /// Obstacles whose z drops below this are recycled.
    pub recycle_z: f32,
    pub ground_clearance: f32,
    pub height_scale_min: f32,
    pub height_scale_max: f32,
    pub ground_size: f32,
    pub texture_repeat: f32,
    /// World units of travel per full texture-offset unit.
    pub tiling_scale: f32,
    pub behavior: Behavior,
    pub time_of_day: TimeOfDay,
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub day_color: [f32; 3],
    pub night_color: [f32; 3],
    pub character_path: String,
    /// Fixed RNG seed for reproducible placement. Random when absent.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            obstacle_count: 6,
            spawn_interval_ms: 1500,
            band_radius: 4.0,
            max_x: 10.0,
            spawn_z: 10.0,
            recycle_z: -9.0,
            ground_clearance: 0.6,
            height_scale_min: 0.75,
            height_scale_max: 1.75,
            ground_size: 20.0,
            texture_repeat: 7.0,
            tiling_scale: 20.0,
            behavior: Behavior::Walk,
            time_of_day: TimeOfDay::Day,
            ambient_intensity: 0.8,
            directional_intensity: 0.6,
            day_color: [0.529, 0.808, 0.922],
            night_color: [0.02, 0.03, 0.09],
            character_path: "assets/models/fox.json".to_string(),
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn spawn_interval_secs(&self) -> f64 {
        self.spawn_interval_ms as f64 / 1000.0
    }

    /// Reject configurations the simulation cannot run with. Placement uses
    /// rejection sampling, so a forbidden band covering the whole spawn width
    /// must be caught here rather than at the first recycle.
    pub fn validate(&self) -> Result<(), String> {
        let scalars = [
            ("band_radius", self.band_radius),
            ("max_x", self.max_x),
            ("spawn_z", self.spawn_z),
            ("recycle_z", self.recycle_z),
            ("ground_clearance", self.ground_clearance),
            ("height_scale_min", self.height_scale_min),
            ("height_scale_max", self.height_scale_max),
            ("ground_size", self.ground_size),
            ("texture_repeat", self.texture_repeat),
            ("tiling_scale", self.tiling_scale),
            ("ambient_intensity", self.ambient_intensity),
            ("directional_intensity", self.directional_intensity),
        ];
        // Out-of-range JSON numbers parse as infinity and slip past ordered comparisons.
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(format!(
                    "Config validation failed: {name} must be finite (got {value})"
                ));
            }
        }
        if !(self.max_x > 0.0) {
            return Err(format!(
                "Config validation failed: max_x must be > 0 (got {})",
                self.max_x
            ));
        }
        if !(self.band_radius >= 0.0) {
            return Err(format!(
                "Config validation failed: band_radius must be >= 0 (got {})",
                self.band_radius
            ));
        }
        if self.band_radius >= self.max_x / 2.0 {
            return Err(format!(
                "Config validation failed: band_radius {} leaves no room inside max_x {} \
                 (needs band_radius < max_x / 2)",
                self.band_radius, self.max_x
            ));
        }
        if !(self.height_scale_min > 0.0) || self.height_scale_min >= self.height_scale_max {
            return Err(format!(
                "Config validation failed: height scale range [{}, {}) is empty or non-positive",
                self.height_scale_min, self.height_scale_max
            ));
        }
        if self.spawn_z <= self.recycle_z {
            return Err(format!(
                "Config validation failed: spawn_z {} must lie beyond recycle_z {}",
                self.spawn_z, self.recycle_z
            ));
        }
        if !(self.tiling_scale > 0.0) {
            return Err(format!(
                "Config validation failed: tiling_scale must be > 0 (got {})",
                self.tiling_scale
            ));
        }
        if !(self.ground_size > 0.0) || !(self.texture_repeat > 0.0) {
            return Err(
                "Config validation failed: ground_size and texture_repeat must be > 0".to_string(),
            );
        }
        if !(self.ambient_intensity >= 0.0) || !(self.directional_intensity >= 0.0) {
            return Err("Config validation failed: light intensities must be >= 0".to_string());
        }
        for (name, color) in [("day_color", self.day_color), ("night_color", self.night_color)] {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(format!(
                    "Config validation failed: {name} channels must lie in [0, 1]"
                ));
            }
        }
        if self.obstacle_count == 0 {
            log::warn!("Config has obstacle_count = 0. The scene will have no obstacles.");
        }
        Ok(())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<SimConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: SimConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// A parameter change requested by a control surface (keyboard, panel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    SetBehavior(Behavior),
    SetTimeOfDay(TimeOfDay),
    ToggleTimeOfDay,
}

/// Live parameters for the running scene.
#[derive(Debug, Clone)]
pub struct ParamStore {
    pub config: SimConfig,
    behavior: Behavior,
    time_of_day: TimeOfDay,
}

impl ParamStore {
    pub fn new(config: SimConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            behavior: config.behavior,
            time_of_day: config.time_of_day,
            config,
        })
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    /// Scroll speed implied by the current behavior.
    pub fn speed(&self) -> f32 {
        self.behavior.speed()
    }

    /// Apply one event. Returns true when a selector actually changed.
    pub fn apply(&mut self, event: ControlEvent) -> bool {
        match event {
            ControlEvent::SetBehavior(behavior) => {
                let changed = self.behavior != behavior;
                self.behavior = behavior;
                changed
            }
            ControlEvent::SetTimeOfDay(mode) => {
                let changed = self.time_of_day != mode;
                self.time_of_day = mode;
                changed
            }
            ControlEvent::ToggleTimeOfDay => {
                self.time_of_day = self.time_of_day.toggled();
                true
            }
        }
    }
}
