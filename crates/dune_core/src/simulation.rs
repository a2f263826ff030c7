//! Per-frame orchestration of the scene.
//!
//! One call to `Simulation::frame` is one frame:
//!
//!   1. tick the clock for the wall-clock delta
//!   2. apply control events queued since the last frame
//!   3. advance the obstacle pool at the behavior's speed, then create any
//!      staggered spawns that have come due
//!   4. scroll the ground by the same speed
//!   5. advance the character's clip
//!   6. update the camera rig
//!   7. hand the finished state to the render surface
//!
//! Rescheduling is the host's job (the window event loop requests the next
//! redraw). Nothing in here blocks, and no data error stops the loop: a missing
//! clip or an unloaded character only degrades what is drawn.

use std::time::Instant;

use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::animation::{CharacterAnimator, CharacterAsset, CharacterPose};
use crate::behavior::Behavior;
use crate::lighting::{LightingBase, LightingController, LightingState};
use crate::obstacles::{Obstacle, ObstaclePool, PlacementRules};
use crate::params::{ControlEvent, ParamStore, SimConfig};
use crate::surface::SurfaceScroller;
use crate::time::Clock;

/// Camera parameters the renderer projects with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// Camera helper updated once per frame after the simulation step.
pub trait CameraRig {
    fn update(&mut self, dt: f32);
    fn state(&self) -> CameraState;
}

/// Receives the finished scene once per frame. Implementations draw it; the
/// simulation never rasterizes anything itself.
pub trait RenderSurface {
    fn render(&mut self, scene: &SceneState<'_>, camera: &CameraState);
}

/// Read-only view of everything drawable this frame.
#[derive(Debug, Clone, Copy)]
pub struct SceneState<'a> {
    pub obstacles: &'a [Obstacle],
    pub ground_offset: Vec2,
    pub ground_size: f32,
    pub texture_repeat: f32,
    pub character: Option<CharacterPose<'a>>,
    pub lighting: &'a LightingState,
    pub behavior: Behavior,
}

/// What happened during one frame, for logging and the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub dt: f64,
    pub events_applied: usize,
    pub spawned: usize,
    pub recycled: usize,
}

pub struct Simulation {
    params: ParamStore,
    clock: Clock,
    elapsed: f64,
    obstacles: ObstaclePool,
    ground: SurfaceScroller,
    character: CharacterAnimator,
    lighting: LightingController,
    queued: Vec<ControlEvent>,
}

impl Simulation {
    /// Build the scene from a configuration, rejecting invalid ones. The pool
    /// starts populating immediately; the first obstacle exists on return.
    pub fn new(config: SimConfig, start: Instant) -> Result<Self, String> {
        let params = ParamStore::new(config)?;
        let config = &params.config;
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Simulation seed: {}", seed);

        let mut obstacles =
            ObstaclePool::new(PlacementRules::from_config(config), StdRng::seed_from_u64(seed));
        obstacles.populate(config.obstacle_count, config.spawn_interval_secs(), 0.0);

        let ground = SurfaceScroller::new(config.tiling_scale);
        let character = CharacterAnimator::new(params.behavior());
        let lighting =
            LightingController::new(LightingBase::from_config(config), params.time_of_day());

        Ok(Self {
            clock: Clock::starting_at(start),
            elapsed: 0.0,
            obstacles,
            ground,
            character,
            lighting,
            queued: Vec::new(),
            params,
        })
    }

    pub fn params(&self) -> &ParamStore {
        &self.params
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Simulated seconds since construction: the sum of every `step` delta,
    /// whether driven by `frame` or called directly. Spawn times are measured
    /// against this. The clock only measures wall-clock deltas.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn obstacles(&self) -> &ObstaclePool {
        &self.obstacles
    }

    pub fn ground(&self) -> &SurfaceScroller {
        &self.ground
    }

    pub fn character(&self) -> &CharacterAnimator {
        &self.character
    }

    pub fn lighting(&self) -> &LightingState {
        self.lighting.state()
    }

    /// Queue a control event. It takes effect at the start of the next frame.
    pub fn submit(&mut self, event: ControlEvent) {
        self.queued.push(event);
    }

    /// Hand over the asynchronously loaded character.
    pub fn attach_character(&mut self, asset: CharacterAsset) {
        if let Err(err) = self.character.attach(asset) {
            log::warn!("{err}");
        }
    }

    /// Run one full frame against the clock, camera and render surface.
    pub fn frame(
        &mut self,
        now: Instant,
        camera: &mut dyn CameraRig,
        surface: &mut dyn RenderSurface,
    ) -> FrameReport {
        let dt = self.clock.tick_at(now);
        let report = self.step(dt);
        camera.update(dt as f32);
        let camera_state = camera.state();
        surface.render(&self.scene_state(), &camera_state);
        report
    }

    /// Advance every simulation component by `dt` seconds.
    pub fn step(&mut self, dt: f64) -> FrameReport {
        let dt = dt.max(0.0);
        let events_applied = self.apply_queued();

        self.elapsed += dt;
        let speed = self.params.speed();
        let dt_f32 = dt as f32;

        let recycled = self.obstacles.advance(speed, dt_f32);
        let spawned = self.obstacles.spawn_due(self.elapsed);
        self.ground.advance(speed, dt_f32);
        self.character.update(dt_f32);

        FrameReport {
            dt,
            events_applied,
            spawned,
            recycled,
        }
    }

    pub fn scene_state(&self) -> SceneState<'_> {
        SceneState {
            obstacles: self.obstacles.obstacles(),
            ground_offset: self.ground.offset,
            ground_size: self.params.config.ground_size,
            texture_repeat: self.params.config.texture_repeat,
            character: self.character.pose(),
            lighting: self.lighting.state(),
            behavior: self.params.behavior(),
        }
    }

    fn apply_queued(&mut self) -> usize {
        let events: Vec<ControlEvent> = self.queued.drain(..).collect();
        for &event in &events {
            let changed = self.params.apply(event);
            match event {
                ControlEvent::SetBehavior(behavior) => {
                    if changed {
                        log::info!("Behavior: {} (speed {})", behavior, behavior.speed());
                    }
                    if let Err(err) = self.character.set_behavior(behavior) {
                        log::warn!("{err}");
                    }
                }
                ControlEvent::SetTimeOfDay(mode) => {
                    if changed {
                        self.lighting.set_mode(mode);
                    }
                }
                ControlEvent::ToggleTimeOfDay => self.lighting.toggle(),
            }
        }
        events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, ClipCatalog};
    use crate::behavior::TimeOfDay;
    use std::time::Duration;

    fn config() -> SimConfig {
        SimConfig {
            obstacle_count: 8,
            spawn_interval_ms: 1500,
            seed: Some(1234),
            ..SimConfig::default()
        }
    }

    fn fox() -> CharacterAsset {
        CharacterAsset {
            model_id: "fox".to_string(),
            scale: 0.025,
            clips: ClipCatalog::new(
                ["Survey", "Walk", "Run"]
                    .iter()
                    .map(|n| AnimationClip {
                        name: n.to_string(),
                        duration_secs: 1.0,
                    })
                    .collect(),
            ),
        }
    }

    struct FixedCamera {
        updates: u32,
    }

    impl CameraRig for FixedCamera {
        fn update(&mut self, _dt: f32) {
            self.updates += 1;
        }

        fn state(&self) -> CameraState {
            CameraState {
                eye: Vec3::new(5.0, 3.0, 5.0),
                target: Vec3::new(0.0, 0.75, 0.0),
                fov_y_radians: 75f32.to_radians(),
                aspect: 16.0 / 9.0,
                near: 0.1,
                far: 100.0,
            }
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        frames: u32,
        last_obstacle_count: usize,
        last_clip: Option<String>,
        last_background: [f32; 3],
    }

    impl RenderSurface for RecordingSurface {
        fn render(&mut self, scene: &SceneState<'_>, _camera: &CameraState) {
            self.frames += 1;
            self.last_obstacle_count = scene.obstacles.len();
            self.last_clip = scene.character.map(|p| p.clip_name.to_string());
            self.last_background = scene.lighting.background;
        }
    }

    #[test]
    fn rejects_degenerate_band_at_startup() {
        let config = SimConfig {
            band_radius: 5.0,
            ..config()
        };
        assert!(Simulation::new(config, Instant::now()).is_err());
    }

    #[test]
    fn rejects_infinite_spawn_width_at_startup() {
        let config: SimConfig =
            serde_json::from_str(r#"{ "max_x": 1e39, "seed": 1, "spawn_interval_ms": 0 }"#)
                .expect("parse config");
        let err = Simulation::new(config, Instant::now())
            .err()
            .expect("infinite max_x must be rejected");
        assert!(err.contains("must be finite"), "{err}");
    }

    #[test]
    fn direct_steps_advance_elapsed() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        sim.step(0.25);
        sim.step(0.5);
        assert!((sim.elapsed() - 0.75).abs() < 1e-9);
        assert_eq!(sim.clock().frame_count, 0);
    }

    #[test]
    fn toggling_twice_returns_to_day() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        sim.submit(ControlEvent::ToggleTimeOfDay);
        sim.submit(ControlEvent::ToggleTimeOfDay);
        sim.step(0.0);
        assert_eq!(sim.lighting().mode, TimeOfDay::Day);
        assert_eq!(sim.params().time_of_day(), TimeOfDay::Day);
        assert!(!sim.lighting().stars_visible);
    }

    #[test]
    fn staggered_spawns_follow_elapsed_time() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        assert_eq!(sim.obstacles().live_count(), 1);

        // 10.4s in 0.1s frames: slots 0..=6 exist, slot 7 does not.
        for _ in 0..104 {
            sim.step(0.1);
        }
        assert_eq!(sim.obstacles().live_count(), 7);

        sim.step(0.2);
        assert_eq!(sim.obstacles().live_count(), 8);
    }

    #[test]
    fn run_moves_obstacles_and_ground_in_lockstep() {
        let config = SimConfig {
            spawn_interval_ms: 0,
            ..config()
        };
        let mut sim = Simulation::new(config, Instant::now()).expect("valid config");
        sim.submit(ControlEvent::SetBehavior(Behavior::Run));
        sim.step(0.0);

        let before: Vec<f32> = sim
            .obstacles()
            .obstacles()
            .iter()
            .map(|o| o.position.z)
            .collect();
        let offset_before = sim.ground().offset.y;
        sim.step(0.5);

        for (obstacle, z0) in sim.obstacles().obstacles().iter().zip(before) {
            assert!((z0 - obstacle.position.z - 2.0).abs() < 1e-6);
        }
        let expected = 4.0 * 0.5 / sim.ground().tiling_scale();
        assert!((sim.ground().offset.y - offset_before - expected).abs() < 1e-6);
    }

    #[test]
    fn idle_freezes_everything_but_spawning() {
        let config = SimConfig {
            behavior: Behavior::Idle,
            spawn_interval_ms: 0,
            ..config()
        };
        let mut sim = Simulation::new(config, Instant::now()).expect("valid config");
        let before: Vec<f32> = sim
            .obstacles()
            .obstacles()
            .iter()
            .map(|o| o.position.z)
            .collect();
        for _ in 0..100 {
            sim.step(0.25);
        }
        let after: Vec<f32> = sim
            .obstacles()
            .obstacles()
            .iter()
            .map(|o| o.position.z)
            .collect();
        assert_eq!(before, after);
        assert_eq!(sim.ground().offset.y, 0.0);
    }

    #[test]
    fn events_apply_at_next_frame_only() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        sim.submit(ControlEvent::ToggleTimeOfDay);
        assert_eq!(sim.lighting().mode, TimeOfDay::Day);

        let report = sim.step(0.016);
        assert_eq!(report.events_applied, 1);
        assert_eq!(sim.lighting().mode, TimeOfDay::Night);
        assert!(sim.lighting().stars_visible);
    }

    #[test]
    fn day_night_day_restores_lighting() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        let original = *sim.lighting();
        sim.submit(ControlEvent::SetTimeOfDay(TimeOfDay::Night));
        sim.step(0.0);
        sim.submit(ControlEvent::SetTimeOfDay(TimeOfDay::Day));
        sim.step(0.0);
        assert_eq!(*sim.lighting(), original);
    }

    #[test]
    fn behavior_chosen_before_load_plays_after_attach() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        sim.submit(ControlEvent::SetBehavior(Behavior::Run));
        sim.step(0.016);
        assert!(sim.character().pose().is_none());

        sim.attach_character(fox());
        assert_eq!(sim.character().pose().expect("pose").clip_name, "Run");
    }

    #[test]
    fn repeated_behavior_keeps_speed_and_clip() {
        let mut sim = Simulation::new(config(), Instant::now()).expect("valid config");
        sim.attach_character(fox());
        sim.submit(ControlEvent::SetBehavior(Behavior::Run));
        sim.step(0.1);
        let phase = sim.character().pose().expect("pose").phase;

        sim.submit(ControlEvent::SetBehavior(Behavior::Run));
        sim.step(0.0);
        assert_eq!(sim.params().speed(), 4.0);
        let pose = sim.character().pose().expect("pose");
        assert_eq!(pose.clip_name, "Run");
        assert_eq!(pose.phase, phase);
    }

    #[test]
    fn frame_drives_camera_and_render_surface() {
        let start = Instant::now();
        let mut sim = Simulation::new(config(), start).expect("valid config");
        sim.attach_character(fox());
        let mut camera = FixedCamera { updates: 0 };
        let mut surface = RecordingSurface::default();

        for i in 1..=3u64 {
            let report = sim.frame(
                start + Duration::from_millis(500 * i),
                &mut camera,
                &mut surface,
            );
            assert!((report.dt - 0.5).abs() < 1e-9);
        }
        assert_eq!(camera.updates, 3);
        assert_eq!(surface.frames, 3);
        assert_eq!(surface.last_obstacle_count, 2);
        assert_eq!(surface.last_clip.as_deref(), Some("Walk"));
        assert_eq!(surface.last_background, SimConfig::default().day_color);
        assert!((sim.elapsed() - 1.5).abs() < 1e-9);
    }
}
