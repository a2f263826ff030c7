//! Day/night environment state.
//!
//! Every derived value is recomputed from the base intensities and colors on
//! each mode change, so switching back and forth can never drift. The switch
//! is instantaneous; there is no blend between presets.

use crate::behavior::TimeOfDay;
use crate::params::SimConfig;

const NIGHT_AMBIENT_FACTOR: f32 = 0.3;
const NIGHT_DIRECTIONAL_FACTOR: f32 = 0.2;

/// Inputs the derived lighting is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingBase {
    pub ambient: f32,
    pub directional: f32,
    pub day_color: [f32; 3],
    pub night_color: [f32; 3],
}

impl LightingBase {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            ambient: config.ambient_intensity,
            directional: config.directional_intensity,
            day_color: config.day_color,
            night_color: config.night_color,
        }
    }
}

/// Lighting the renderer applies this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingState {
    pub mode: TimeOfDay,
    pub ambient: f32,
    pub directional: f32,
    pub background: [f32; 3],
    pub stars_visible: bool,
}

impl LightingState {
    pub fn derive(mode: TimeOfDay, base: &LightingBase) -> Self {
        match mode {
            TimeOfDay::Day => Self {
                mode,
                ambient: base.ambient,
                directional: base.directional,
                background: base.day_color,
                stars_visible: false,
            },
            TimeOfDay::Night => Self {
                mode,
                ambient: base.ambient * NIGHT_AMBIENT_FACTOR,
                directional: base.directional * NIGHT_DIRECTIONAL_FACTOR,
                background: base.night_color,
                stars_visible: true,
            },
        }
    }
}

pub struct LightingController {
    base: LightingBase,
    state: LightingState,
}

impl LightingController {
    pub fn new(base: LightingBase, mode: TimeOfDay) -> Self {
        Self {
            base,
            state: LightingState::derive(mode, &base),
        }
    }

    pub fn state(&self) -> &LightingState {
        &self.state
    }

    pub fn set_mode(&mut self, mode: TimeOfDay) {
        self.state = LightingState::derive(mode, &self.base);
        log::info!(
            "Lighting: {} (ambient {:.2}, directional {:.2})",
            mode,
            self.state.ambient,
            self.state.directional
        );
    }

    pub fn toggle(&mut self) {
        self.set_mode(self.state.mode.toggled());
    }
}
