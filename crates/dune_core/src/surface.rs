use glam::Vec2;

/// Texture offset for the ground plane, advanced at the same speed as the
/// obstacles so the tiling pattern appears to travel with them.
///
/// The offset is never wrapped. Ground sampling repeats, so large offsets
/// look identical to small ones modulo one tile.
#[derive(Debug, Clone)]
pub struct SurfaceScroller {
    pub offset: Vec2,
    tiling_scale: f32,
}

impl SurfaceScroller {
    pub fn new(tiling_scale: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            tiling_scale,
        }
    }

    pub fn tiling_scale(&self) -> f32 {
        self.tiling_scale
    }

    /// Scroll along the texture's v axis by `speed * dt / tiling_scale`.
    pub fn advance(&mut self, speed: f32, dt: f32) {
        self.offset.y += speed * dt / self.tiling_scale;
    }
}
