//! CPU-side frame building.
//!
//! `SceneFrame` is the render surface the simulation hands its state to. It
//! turns the scene into one flat-shaded triangle mesh plus a uniform block and
//! a clear color; `main` then streams those to the GPU. Geometry is rebuilt
//! from scratch every frame, which is cheap at this scene's size.

use std::f32::consts::TAU;

use dune_core::behavior::Behavior;
use dune_core::simulation::{CameraState, RenderSurface, SceneState};
use glam::{Mat3, Mat4, Quat, Vec3};

use crate::camera::view_projection;
use crate::vertex::MeshVertex;

const GROUND_Y: f32 = 0.1;
const GROUND_LIGHT: [f32; 4] = [0.78, 0.66, 0.44, 1.0];
const GROUND_DARK: [f32; 4] = [0.71, 0.59, 0.38, 1.0];
const OBSTACLE_HALF_EXTENTS: Vec3 = Vec3::new(0.25, 0.5, 0.25);
const OBSTACLE_COLOR: [f32; 4] = [0.26, 0.55, 0.27, 1.0];
const CHARACTER_COLOR: [f32; 4] = [0.86, 0.45, 0.16, 1.0];
const CHARACTER_TRIM: [f32; 4] = [0.95, 0.92, 0.86, 1.0];
/// Model-space height of the fox; multiplied by the asset scale gives world size.
const CHARACTER_MODEL_UNITS: f32 = 40.0;
const STAR_COUNT: usize = 160;
const STAR_DOME_RADIUS: f32 = 40.0;
const STAR_HALF_EXTENT: f32 = 0.08;
const STAR_COLOR: [f32; 4] = [1.0, 1.0, 0.95, 1.0];
/// Direction toward the key light, matching a light placed at (10, 10, 10).
const LIGHT_DIRECTION: Vec3 = Vec3::new(1.0, 1.0, 1.0);

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz: direction toward the directional light.
    pub light_dir: [f32; 4],
    /// x: ambient intensity, y: directional intensity.
    pub light: [f32; 4],
}

impl SceneUniform {
    pub fn new(view_proj: Mat4, ambient: f32, directional: f32) -> Self {
        let dir = LIGHT_DIRECTION.normalize();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: [dir.x, dir.y, dir.z, 0.0],
            light: [ambient, directional, 0.0, 0.0],
        }
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 1.0, 0.0)
    }
}

#[derive(Debug, Default, Clone)]
pub struct SceneMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl SceneMesh {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned box of `half_extents` placed by `transform`.
    pub fn push_box(&mut self, transform: Mat4, half_extents: Vec3, color: [f32; 4]) {
        self.push_box_faces(transform, half_extents, color, true);
    }

    /// Box that ignores lighting.
    pub fn push_unlit_box(&mut self, transform: Mat4, half_extents: Vec3, color: [f32; 4]) {
        self.push_box_faces(transform, half_extents, color, false);
    }

    fn push_box_faces(&mut self, transform: Mat4, half_extents: Vec3, color: [f32; 4], lit: bool) {
        // (normal, t1, t2) with t1 x t2 == normal so every face winds CCW from outside.
        const FACES: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];
        let linear = Mat3::from_mat4(transform);
        let normal_matrix = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };

        for (normal, t1, t2) in FACES {
            let base = self.vertices.len() as u32;
            let world_normal = if lit {
                (normal_matrix * normal).normalize_or_zero().to_array()
            } else {
                [0.0; 3]
            };
            for (s1, s2) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let local = (normal + t1 * s1 + t2 * s2) * half_extents;
                self.vertices.push(MeshVertex {
                    position: transform.transform_point3(local).to_array(),
                    normal: world_normal,
                    color,
                });
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    /// Upward-facing rectangle at height `y`.
    pub fn push_floor_quad(&mut self, x: (f32, f32), z: (f32, f32), y: f32, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        let normal = [0.0, 1.0, 0.0];
        for (px, pz) in [(x.0, z.1), (x.1, z.1), (x.1, z.0), (x.0, z.0)] {
            self.vertices.push(MeshVertex {
                position: [px, y, pz],
                normal,
                color,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Everything the GPU needs for one frame.
pub struct SceneFrame {
    pub mesh: SceneMesh,
    pub uniform: SceneUniform,
    pub clear_color: [f32; 3],
    pub obstacle_count: usize,
    stars: Vec<Vec3>,
}

impl SceneFrame {
    pub fn new() -> Self {
        Self {
            mesh: SceneMesh::default(),
            uniform: SceneUniform::default(),
            clear_color: [0.0; 3],
            obstacle_count: 0,
            stars: star_positions(STAR_COUNT, STAR_DOME_RADIUS),
        }
    }

    /// Clear color for the surface. Background colors are authored in sRGB;
    /// the swapchain expects linear values.
    pub fn clear_color_linear(&self) -> wgpu::Color {
        let [r, g, b] = self.clear_color.map(srgb_to_linear);
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

impl Default for SceneFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for SceneFrame {
    fn render(&mut self, scene: &SceneState<'_>, camera: &CameraState) {
        self.mesh.clear();

        push_ground(
            &mut self.mesh,
            scene.ground_size,
            scene.texture_repeat,
            scene.ground_offset.y,
        );

        for obstacle in scene.obstacles {
            let transform = Mat4::from_scale_rotation_translation(
                obstacle.scale,
                Quat::from_rotation_y(obstacle.rotation_y),
                obstacle.position,
            );
            self.mesh
                .push_box(transform, OBSTACLE_HALF_EXTENTS, OBSTACLE_COLOR);
        }

        if let Some(pose) = scene.character {
            push_character(&mut self.mesh, pose.scale, pose.phase, scene.behavior);
        }

        if scene.lighting.stars_visible {
            let half = Vec3::splat(STAR_HALF_EXTENT);
            for star in &self.stars {
                self.mesh
                    .push_unlit_box(Mat4::from_translation(*star), half, STAR_COLOR);
            }
        }

        self.obstacle_count = scene.obstacles.len();
        self.clear_color = scene.lighting.background;
        self.uniform = SceneUniform::new(
            view_projection(camera),
            scene.lighting.ambient,
            scene.lighting.directional,
        );
    }
}

/// Alternating sand stripes across the ground, shifted toward the viewer by
/// the scroll offset. One offset unit moves the pattern by one texture tile.
fn push_ground(mesh: &mut SceneMesh, size: f32, repeat: f32, offset_v: f32) {
    let half = size / 2.0;
    let tile = size / repeat;
    let stripe = tile / 2.0;
    let shift = offset_v.rem_euclid(1.0) * tile;

    let stripe_count = ((size + tile) / stripe).ceil() as usize + 1;
    for k in 0..stripe_count {
        let z0 = -half - shift + k as f32 * stripe;
        let z1 = z0 + stripe;
        let (lo, hi) = (z0.max(-half), z1.min(half));
        if hi <= lo {
            continue;
        }
        let color = if k % 2 == 0 { GROUND_LIGHT } else { GROUND_DARK };
        mesh.push_floor_quad((-half, half), (lo, hi), GROUND_Y, color);
    }
}

/// Blocky stand-in for the character: body, head and tail, bobbing with the
/// active clip. The bob height grows with the behavior's pace.
fn push_character(mesh: &mut SceneMesh, model_scale: f32, phase: f32, behavior: Behavior) {
    let size = model_scale * CHARACTER_MODEL_UNITS;
    let amplitude = match behavior {
        Behavior::Idle => 0.005,
        Behavior::Walk => 0.03,
        Behavior::Run => 0.06,
    };
    let bob = amplitude * (phase * TAU).sin().abs();
    let body_y = GROUND_Y + 0.3 * size + bob;

    mesh.push_box(
        Mat4::from_translation(Vec3::new(0.0, body_y, 0.0)),
        Vec3::new(0.12, 0.12, 0.3) * size,
        CHARACTER_COLOR,
    );
    mesh.push_box(
        Mat4::from_translation(Vec3::new(0.0, body_y + 0.12 * size, 0.38 * size)),
        Vec3::splat(0.1 * size),
        CHARACTER_COLOR,
    );
    mesh.push_box(
        Mat4::from_translation(Vec3::new(0.0, body_y + 0.05 * size, -0.4 * size)),
        Vec3::new(0.05, 0.05, 0.12) * size,
        CHARACTER_TRIM,
    );
}

/// Points spread over the upper half of a dome using the golden angle.
fn star_positions(count: usize, radius: f32) -> Vec<Vec3> {
    let golden_angle = std::f32::consts::PI * (3.0 - 5f32.sqrt());
    (0..count)
        .map(|i| {
            // Keep stars above the horizon: elevation in (0.1, 1].
            let t = (i as f32 + 0.5) / count as f32;
            let y = 0.1 + 0.9 * t;
            let r = (1.0 - y * y).sqrt();
            let theta = golden_angle * i as f32;
            Vec3::new(r * theta.cos(), y, r * theta.sin()) * radius
        })
        .collect()
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
