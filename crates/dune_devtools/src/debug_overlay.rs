//! Control panel rendered via egui on top of the dune scene.
//!
//! Integration pattern: egui requires a split render because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! The panel is shown at startup and toggled with F3. Its buttons never touch
//! simulation state directly; they come back as `OverlayActions` which the
//! caller turns into control events.

use dune_core::behavior::{Behavior, TimeOfDay};
use dune_core::time::Clock;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    /// Simulated seconds since startup.
    pub elapsed: f64,
    pub obstacles_live: u32,
    pub obstacles_total: u32,
    pub total_recycles: u64,
    pub speed: f32,
    pub surface_offset: f32,
    /// Name of the playing clip, or `None` while the character is loading.
    pub clip_label: Option<String>,
    pub behavior: Behavior,
    pub time_of_day: TimeOfDay,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayActions {
    /// Behavior button clicked this frame.
    pub set_behavior: Option<Behavior>,
    pub toggle_time_of_day: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: true,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    /// Whether egui currently wants pointer input (cursor over the panel).
    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.wants_pointer_input()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Control panel: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &Clock,
        stats: &OverlayStats,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if self.visible {
                egui::Window::new("Dune")
                    .default_pos([10.0, 10.0])
                    .resizable(false)
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
                        ui.label(format!("Elapsed: {:.1} s", stats.elapsed));

                        ui.separator();
                        ui.label("Behavior");
                        ui.horizontal(|ui| {
                            for &behavior in Behavior::ALL {
                                let selected = stats.behavior == behavior;
                                if ui.selectable_label(selected, behavior.label()).clicked()
                                    && !selected
                                {
                                    actions.set_behavior = Some(behavior);
                                }
                            }
                        });
                        ui.label(format!("Speed: {:.1} u/s", stats.speed));
                        ui.label(match &stats.clip_label {
                            Some(clip) => format!("Clip: {clip}"),
                            None => "Clip: loading...".to_string(),
                        });

                        ui.separator();
                        ui.horizontal(|ui| {
                            ui.label(format!("Lighting: {}", stats.time_of_day));
                            let label = format!("Switch to {}", stats.time_of_day.toggled());
                            if ui.button(label).clicked() {
                                actions.toggle_time_of_day = true;
                            }
                        });

                        ui.separator();
                        ui.label(format!(
                            "Obstacles: {}/{}",
                            stats.obstacles_live, stats.obstacles_total
                        ));
                        ui.label(format!("Recycles: {}", stats.total_recycles));
                        ui.label(format!("Ground offset: {:.3}", stats.surface_offset));
                        ui.small("1/2/3 behavior, N day/night, F3 panel, drag to orbit");
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_actions_request_nothing() {
        let actions = OverlayActions::default();
        assert_eq!(actions.set_behavior, None);
        assert!(!actions.toggle_time_of_day);
    }

    #[test]
    fn default_stats_report_loading_character() {
        let stats = OverlayStats::default();
        assert!(stats.clip_label.is_none());
        assert_eq!(stats.behavior, Behavior::Walk);
        assert_eq!(stats.time_of_day, TimeOfDay::Day);
    }
}
