//! Dune Runner -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. Every
//! `RedrawRequested` runs exactly one simulation frame against the wall clock:
//!
//!   1. Turn this frame's key presses and panel clicks into control events
//!   2. Hand over the character asset if the background load finished
//!   3. `Simulation::frame()` -- tick clock, step the scene, update the orbit
//!      camera and build the frame mesh
//!   4. Upload the mesh, draw it with depth, composite the egui panel
//!
//! The ground never moves. The sense of motion comes from scrolling the
//! ground pattern and sliding obstacles toward the camera at the speed of the
//! selected behavior.

mod assets;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::CharacterLoader;
use dune_core::behavior::Behavior;
use dune_core::input::{InputState, Key, MouseBtn};
use dune_core::params::{load_config_from_path, ControlEvent, SimConfig};
use dune_core::simulation::Simulation;
use dune_devtools::{DebugOverlay, OverlayActions, OverlayStats};
use dune_platform::window::PlatformConfig;
use dune_render::{GpuContext, OrbitCamera, SceneFrame, ScenePipeline};

const CONFIG_PATH: &str = "assets/config/dune.json";
const CAMERA_EYE: Vec3 = Vec3::new(5.0, 3.0, 5.0);
const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.75, 0.0);

/// All mutable engine state lives here. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface are available.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    input: InputState,
    camera: OrbitCamera,
    scene_pipeline: ScenePipeline,
    scene_frame: SceneFrame,
    debug_overlay: DebugOverlay,
    sim: Simulation,
    character_loader: CharacterLoader,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("GPU initialisation failed: {}", err));
        let scene_pipeline = ScenePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let config_path = PathBuf::from(CONFIG_PATH);
        let config = load_config(&config_path);
        let character_path = PathBuf::from(&config.character_path);
        let sim = Simulation::new(config, Instant::now()).unwrap_or_else(|err| {
            panic!(
                "Failed to start simulation from '{}': {}",
                config_path.display(),
                err
            );
        });
        let character_loader = CharacterLoader::spawn(character_path);

        let camera = OrbitCamera::new(CAMERA_EYE, CAMERA_TARGET, gpu.size.0, gpu.size.1);

        Self {
            window,
            gpu,
            input: InputState::new(),
            camera,
            scene_pipeline,
            scene_frame: SceneFrame::new(),
            debug_overlay,
            sim,
            character_loader,
        }
    }

    fn poll_character(&mut self) {
        match self.character_loader.poll() {
            Some(Ok(asset)) => self.sim.attach_character(asset),
            Some(Err(err)) => {
                log::error!("Character failed to load, continuing without it: {}", err);
            }
            None => {}
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let obstacles = self.sim.obstacles();
        let params = self.sim.params();
        OverlayStats {
            elapsed: self.sim.elapsed(),
            obstacles_live: obstacles.live_count() as u32,
            obstacles_total: obstacles.capacity() as u32,
            total_recycles: obstacles.total_recycles(),
            speed: params.speed(),
            surface_offset: self.sim.ground().offset.y,
            clip_label: self
                .sim
                .character()
                .active_clip()
                .map(|clip| clip.name.clone()),
            behavior: params.behavior(),
            time_of_day: params.time_of_day(),
        }
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match dune_platform::window::create_window(event_loop, &self.config) {
            Ok(window) => self.state = Some(EngineState::new(window)),
            Err(err) => {
                log::error!("{}", err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(engine_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(engine_key),
                            ElementState::Released => state.input.key_up(engine_key),
                        }
                    }
                }
            }

            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => {
                if let Some(btn) = map_mouse_button(button) {
                    match button_state {
                        ElementState::Pressed if !egui_consumed => state.input.mouse_down(btn),
                        ElementState::Released => state.input.mouse_up(btn),
                        _ => {}
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_moved(position.x, position.y);
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                if state.input.is_just_pressed(Key::Escape) {
                    event_loop.exit();
                    return;
                }
                if state.input.is_just_pressed(Key::F3) {
                    state.debug_overlay.toggle();
                }
                for event in key_events(&state.input) {
                    state.sim.submit(event);
                }
                if state.input.is_mouse_held(MouseBtn::Left) && !state.debug_overlay.wants_pointer()
                {
                    let (dx, dy) = state.input.mouse_delta();
                    state.camera.drag(dx as f32, dy as f32);
                }

                state.poll_character();

                let report = state.sim.frame(
                    Instant::now(),
                    &mut state.camera,
                    &mut state.scene_frame,
                );
                if report.spawned > 0 || report.recycled > 0 {
                    log::debug!(
                        "Frame {}: spawned {}, recycled {}",
                        state.sim.clock().frame_count,
                        report.spawned,
                        report.recycled
                    );
                }
                state
                    .scene_pipeline
                    .upload(&state.gpu.device, &state.gpu.queue, &state.scene_frame);

                let Some((output, view)) = state.gpu.begin_frame() else {
                    state.input.end_frame();
                    return;
                };

                let stats = state.overlay_stats();
                let (egui_primitives, egui_textures_delta, overlay_actions) = state
                    .debug_overlay
                    .prepare(&state.window, state.sim.clock(), &stats);
                // Panel clicks land in the queue and apply at the start of the next frame.
                for event in overlay_events(&overlay_actions) {
                    state.sim.submit(event);
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(state.scene_frame.clear_color_linear()),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &state.gpu.depth_view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        ..Default::default()
                    });
                    state.scene_pipeline.draw(&mut render_pass);
                }

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                state.input.end_frame();
            }

            _ => {}
        }
    }
}

/// Startup configuration. A missing file runs the scene on defaults; a file
/// that exists but does not parse or validate is fatal.
fn load_config(path: &Path) -> SimConfig {
    if !path.exists() {
        log::warn!(
            "Config '{}' was not found. Using built-in defaults.",
            path.display()
        );
        return SimConfig::default();
    }
    let config = load_config_from_path(path).unwrap_or_else(|err| {
        panic!("Failed to load config '{}': {}", path.display(), err);
    });
    log::info!(
        "Loaded config '{}': {} obstacles every {} ms",
        path.display(),
        config.obstacle_count,
        config.spawn_interval_ms
    );
    config
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::Digit1 | KeyCode::Numpad1 => Some(Key::Digit1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Some(Key::Digit2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Some(Key::Digit3),
        KeyCode::KeyN => Some(Key::N),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn map_mouse_button(button: MouseButton) -> Option<MouseBtn> {
    match button {
        MouseButton::Left => Some(MouseBtn::Left),
        MouseButton::Right => Some(MouseBtn::Right),
        MouseButton::Middle => Some(MouseBtn::Middle),
        _ => None,
    }
}

/// Control events for keys pressed this frame.
fn key_events(input: &InputState) -> Vec<ControlEvent> {
    let behavior_keys = [
        (Key::Digit1, Behavior::Idle),
        (Key::Digit2, Behavior::Walk),
        (Key::Digit3, Behavior::Run),
    ];

    let mut events: Vec<ControlEvent> = behavior_keys
        .iter()
        .filter(|(key, _)| input.is_just_pressed(*key))
        .map(|&(_, behavior)| ControlEvent::SetBehavior(behavior))
        .collect();
    if input.is_just_pressed(Key::N) {
        events.push(ControlEvent::ToggleTimeOfDay);
    }
    events
}

fn overlay_events(actions: &OverlayActions) -> Vec<ControlEvent> {
    let mut events = Vec::new();
    if let Some(behavior) = actions.set_behavior {
        events.push(ControlEvent::SetBehavior(behavior));
    }
    if actions.toggle_time_of_day {
        events.push(ControlEvent::ToggleTimeOfDay);
    }
    events
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Dune Runner starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
