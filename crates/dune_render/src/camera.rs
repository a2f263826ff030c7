//! Orbit camera with damped rotation, the scene's camera-follow helper.
//!
//! Dragging adds to a pending rotation that is paid out a fraction at a time
//! in `update`, so the view keeps gliding briefly after the mouse stops. The
//! fraction is defined per 60 Hz frame and scaled by the real delta, giving
//! the same feel at any frame rate.

use std::f32::consts::{PI, TAU};

use dune_core::simulation::{CameraRig, CameraState};
use glam::{Mat4, Vec3};

const MAX_PITCH: f32 = PI / 2.0 - 0.01;

/// Projection-view matrix for a camera state (depth range 0..1, right handed).
pub fn view_projection(state: &CameraState) -> Mat4 {
    let proj = Mat4::perspective_rh(state.fov_y_radians, state.aspect, state.near, state.far);
    let view = Mat4::look_at_rh(state.eye, state.target, Vec3::Y);
    proj * view
}

pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Rotation about +Y, measured from +Z toward +X.
    pub yaw: f32,
    /// Elevation above the target's horizontal plane.
    pub pitch: f32,
    /// Share of the pending rotation applied per 60 Hz frame.
    pub damping: f32,
    pub rotate_speed: f32,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: (u32, u32),
    pending_yaw: f32,
    pending_pitch: f32,
}

impl OrbitCamera {
    pub fn new(eye: Vec3, target: Vec3, viewport_width: u32, viewport_height: u32) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(0.001);
        Self {
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            damping: 0.05,
            rotate_speed: 1.0,
            fov_y_radians: 75f32.to_radians(),
            near: 0.1,
            far: 100.0,
            viewport: (viewport_width, viewport_height),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0.max(1) as f32 / self.viewport.1.max(1) as f32
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn eye(&self) -> Vec3 {
        let horizontal = self.distance * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    /// Queue a rotation from a cursor drag in pixels. A drag across the full
    /// viewport height turns the camera once around.
    pub fn drag(&mut self, dx_px: f32, dy_px: f32) {
        let height = self.viewport.1.max(1) as f32;
        self.pending_yaw -= TAU * dx_px / height * self.rotate_speed;
        self.pending_pitch += TAU * dy_px / height * self.rotate_speed;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_yaw.abs() < 1e-5 && self.pending_pitch.abs() < 1e-5
    }
}

impl CameraRig for OrbitCamera {
    fn update(&mut self, dt: f32) {
        if self.is_settled() {
            return;
        }
        let frames = (dt * 60.0).max(0.0);
        let retained = (1.0 - self.damping).powf(frames);
        let applied = 1.0 - retained;

        self.yaw += self.pending_yaw * applied;
        self.pitch = (self.pitch + self.pending_pitch * applied).clamp(-MAX_PITCH, MAX_PITCH);
        self.pending_yaw *= retained;
        self.pending_pitch *= retained;
    }

    fn state(&self) -> CameraState {
        CameraState {
            eye: self.eye(),
            target: self.target,
            fov_y_radians: self.fov_y_radians,
            aspect: self.aspect(),
            near: self.near,
            far: self.far,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(Vec3::new(5.0, 3.0, 5.0), Vec3::new(0.0, 0.75, 0.0), 1280, 720)
    }

    #[test]
    fn eye_round_trips_from_constructor() {
        let camera = camera();
        assert!((camera.eye() - Vec3::new(5.0, 3.0, 5.0)).length() < 1e-4);
    }

    #[test]
    fn update_without_drag_keeps_position() {
        let mut camera = camera();
        let before = camera.eye();
        camera.update(1.0 / 60.0);
        assert_eq!(camera.eye(), before);
    }

    #[test]
    fn drag_is_paid_out_over_time_and_keeps_distance() {
        let mut camera = camera();
        let yaw0 = camera.yaw;
        camera.drag(-180.0, 0.0);
        let expected_total = TAU * 180.0 / 720.0;

        camera.update(1.0 / 60.0);
        let after_one = camera.yaw - yaw0;
        assert!(after_one > 0.0 && after_one < expected_total);

        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!((camera.yaw - yaw0 - expected_total).abs() < 1e-3);
        assert!(((camera.eye() - camera.target).length() - camera.distance).abs() < 1e-4);
    }

    #[test]
    fn damping_is_frame_rate_independent() {
        let mut fast = camera();
        let mut slow = camera();
        fast.drag(100.0, 40.0);
        slow.drag(100.0, 40.0);
        for _ in 0..4 {
            fast.update(1.0 / 120.0);
        }
        for _ in 0..2 {
            slow.update(1.0 / 60.0);
        }
        assert!((fast.yaw - slow.yaw).abs() < 1e-5);
        assert!((fast.pitch - slow.pitch).abs() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped_below_vertical() {
        let mut camera = camera();
        camera.drag(0.0, 10_000.0);
        for _ in 0..600 {
            camera.update(1.0 / 60.0);
        }
        assert!(camera.pitch <= MAX_PITCH);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut camera = camera();
        camera.resize(800, 800);
        assert_eq!(camera.state().aspect, 1.0);
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let camera = camera();
        let clip = view_projection(&camera.state()) * camera.target.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
