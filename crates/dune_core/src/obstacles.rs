//! Fixed-size pool of scrolling obstacles.
//!
//! Obstacles are created once, optionally one at a time with a stagger
//! interval, and then recycled in place: when one passes the near plane it is
//! thrown back to the spawn distance with a fresh random lateral offset,
//! heading and height. Nothing is ever destroyed.
//!
//! Staggered creation is modelled as a list of pending `(fire_time, slot)`
//! entries compared against the caller's accumulated clock time once per
//! frame, so the whole pool stays single-threaded and deterministic for a
//! given RNG seed.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::params::SimConfig;

/// Upper bound on redraws of the lateral offset. With a validated config the
/// acceptance probability per draw is `1 - 2 * band_radius / max_x`, so this is
/// never reached in practice.
const MAX_PLACEMENT_ATTEMPTS: u32 = 64;

/// Renderer-side identity of an obstacle's visual. The pool stores it but
/// never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u32);

#[derive(Debug, Clone)]
pub struct Obstacle {
    pub slot: usize,
    pub position: Vec3,
    /// Heading about the vertical axis, radians.
    pub rotation_y: f32,
    pub scale: Vec3,
    pub visual: VisualHandle,
    /// Number of times this obstacle has been recycled after crossing the near plane.
    pub recycles: u32,
}

/// Placement constants copied out of `SimConfig` at construction.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRules {
    pub spawn_z: f32,
    pub recycle_z: f32,
    pub max_x: f32,
    pub band_radius: f32,
    pub ground_clearance: f32,
    pub height_scale_min: f32,
    pub height_scale_max: f32,
}

impl PlacementRules {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            spawn_z: config.spawn_z,
            recycle_z: config.recycle_z,
            max_x: config.max_x,
            band_radius: config.band_radius,
            ground_clearance: config.ground_clearance,
            height_scale_min: config.height_scale_min,
            height_scale_max: config.height_scale_max,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingSpawn {
    fire_at: f64,
    slot: usize,
}

pub struct ObstaclePool {
    rules: PlacementRules,
    rng: StdRng,
    obstacles: Vec<Obstacle>,
    pending: Vec<PendingSpawn>,
    capacity: usize,
}

impl ObstaclePool {
    pub fn new(rules: PlacementRules, rng: StdRng) -> Self {
        Self {
            rules,
            rng,
            obstacles: Vec::new(),
            pending: Vec::new(),
            capacity: 0,
        }
    }

    pub fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    /// Obstacles created so far, in slot order.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn live_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Number of obstacles the pool will hold once every pending spawn has fired.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn total_recycles(&self) -> u64 {
        self.obstacles.iter().map(|o| o.recycles as u64).sum()
    }

    /// Schedule `count` obstacles, slot `k` due at `now + k * stagger_secs`.
    /// Any existing obstacles and pending spawns are discarded. Slots already
    /// due at `now` are created immediately.
    pub fn populate(&mut self, count: usize, stagger_secs: f64, now: f64) {
        self.obstacles.clear();
        self.pending.clear();
        self.capacity = count;
        let stagger_secs = stagger_secs.max(0.0);
        for slot in 0..count {
            self.pending.push(PendingSpawn {
                fire_at: now + slot as f64 * stagger_secs,
                slot,
            });
        }
        log::info!(
            "Obstacle pool populating {} obstacles, {:.0}ms apart",
            count,
            stagger_secs * 1000.0
        );
        self.spawn_due(now);
    }

    /// Create every pending obstacle whose fire time is at or before `now`.
    /// Returns how many were created.
    pub fn spawn_due(&mut self, now: f64) -> usize {
        let mut spawned = 0;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].fire_at <= now {
                let spawn = self.pending.remove(i);
                let mut obstacle = Obstacle {
                    slot: spawn.slot,
                    position: Vec3::ZERO,
                    rotation_y: 0.0,
                    scale: Vec3::ONE,
                    visual: VisualHandle(spawn.slot as u32),
                    recycles: 0,
                };
                reset_placement(&mut obstacle, &self.rules, &mut self.rng);
                log::debug!(
                    "Spawned obstacle {} at x={:.2} z={:.2}",
                    obstacle.slot,
                    obstacle.position.x,
                    obstacle.position.z
                );
                let insert_at = self
                    .obstacles
                    .partition_point(|o| o.slot < obstacle.slot);
                self.obstacles.insert(insert_at, obstacle);
                spawned += 1;
            } else {
                i += 1;
            }
        }
        spawned
    }

    /// Move every live obstacle toward the viewer by `speed * dt` and recycle
    /// those that crossed the near plane. Returns the number recycled.
    pub fn advance(&mut self, speed: f32, dt: f32) -> usize {
        let distance = speed * dt;
        let mut recycled = 0;
        for obstacle in &mut self.obstacles {
            obstacle.position.z -= distance;
            if obstacle.position.z < self.rules.recycle_z {
                reset_placement(obstacle, &self.rules, &mut self.rng);
                obstacle.recycles += 1;
                recycled += 1;
                log::trace!(
                    "Recycled obstacle {} to x={:.2}",
                    obstacle.slot,
                    obstacle.position.x
                );
            }
        }
        recycled
    }
}

/// Throw `obstacle` back to the spawn distance with a random lateral offset
/// outside the forbidden central band, a random heading and a random height.
pub fn reset_placement(obstacle: &mut Obstacle, rules: &PlacementRules, rng: &mut impl Rng) {
    let half = rules.max_x / 2.0;
    let mut x = rng.gen_range(-half..half);
    let mut attempts = 1;
    while x.abs() < rules.band_radius && attempts < MAX_PLACEMENT_ATTEMPTS {
        x = rng.gen_range(-half..half);
        attempts += 1;
    }
    if x.abs() < rules.band_radius {
        log::warn!(
            "Obstacle {} placement exhausted {} attempts; snapping to band edge",
            obstacle.slot,
            MAX_PLACEMENT_ATTEMPTS
        );
        x = if x < 0.0 {
            -rules.band_radius
        } else {
            rules.band_radius
        };
    }

    obstacle.position = Vec3::new(x, rules.ground_clearance, rules.spawn_z);
    obstacle.rotation_y = rng.gen_range(0.0..TAU);
    obstacle.scale = Vec3::new(
        1.0,
        rng.gen_range(rules.height_scale_min..rules.height_scale_max),
        1.0,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rules() -> PlacementRules {
        PlacementRules::from_config(&SimConfig::default())
    }

    fn pool(seed: u64) -> ObstaclePool {
        ObstaclePool::new(rules(), StdRng::seed_from_u64(seed))
    }

    fn blank(slot: usize) -> Obstacle {
        Obstacle {
            slot,
            position: Vec3::ZERO,
            rotation_y: 0.0,
            scale: Vec3::ONE,
            visual: VisualHandle(slot as u32),
            recycles: 0,
        }
    }

    #[test]
    fn reset_placement_respects_band_and_spawn_distance() {
        let rules = rules();
        let mut rng = StdRng::seed_from_u64(11);
        let mut obstacle = blank(0);
        for _ in 0..2000 {
            reset_placement(&mut obstacle, &rules, &mut rng);
            assert!(obstacle.position.x.abs() >= rules.band_radius);
            assert!(obstacle.position.x >= -rules.max_x / 2.0);
            assert!(obstacle.position.x < rules.max_x / 2.0);
            assert_eq!(obstacle.position.z, rules.spawn_z);
            assert_eq!(obstacle.position.y, rules.ground_clearance);
        }
    }

    #[test]
    fn reset_placement_scales_height_only() {
        let rules = rules();
        let mut rng = StdRng::seed_from_u64(3);
        let mut obstacle = blank(0);
        for _ in 0..500 {
            reset_placement(&mut obstacle, &rules, &mut rng);
            assert_eq!(obstacle.scale.x, 1.0);
            assert_eq!(obstacle.scale.z, 1.0);
            assert!(obstacle.scale.y >= rules.height_scale_min);
            assert!(obstacle.scale.y < rules.height_scale_max);
            assert!(obstacle.rotation_y >= 0.0 && obstacle.rotation_y < TAU);
        }
    }

    #[test]
    fn zero_width_band_accepts_first_draw() {
        let rules = PlacementRules {
            band_radius: 0.0,
            ..rules()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut obstacle = blank(0);
        reset_placement(&mut obstacle, &rules, &mut rng);
        assert!(obstacle.position.x.abs() < rules.max_x / 2.0);
    }

    #[test]
    fn populate_staggers_creation() {
        let mut pool = pool(1);
        pool.populate(8, 1.5, 0.0);
        assert_eq!(pool.live_count(), 1);
        assert_eq!(pool.capacity(), 8);

        pool.spawn_due(10.4);
        assert_eq!(pool.live_count(), 7);
        assert!(pool.obstacles().iter().all(|o| o.slot != 7));

        // advance must cope with a partially populated pool.
        pool.advance(4.0, 0.016);

        pool.spawn_due(10.5);
        assert_eq!(pool.live_count(), 8);
        assert_eq!(pool.pending_count(), 0);
        let slots: Vec<usize> = pool.obstacles().iter().map(|o| o.slot).collect();
        assert_eq!(slots, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn zero_stagger_creates_everything_at_once() {
        let mut pool = pool(2);
        pool.populate(5, 0.0, 3.0);
        assert_eq!(pool.live_count(), 5);
        assert_eq!(pool.pending_count(), 0);
    }

    #[test]
    fn populate_again_replaces_previous_pool() {
        let mut pool = pool(2);
        pool.populate(5, 0.0, 0.0);
        pool.populate(3, 1.0, 10.0);
        assert_eq!(pool.live_count(), 1);
        assert_eq!(pool.capacity(), 3);
        pool.spawn_due(12.0);
        assert_eq!(pool.live_count(), 3);
    }

    #[test]
    fn zero_speed_freezes_the_field() {
        let mut pool = pool(4);
        pool.populate(6, 0.0, 0.0);
        let before: Vec<f32> = pool.obstacles().iter().map(|o| o.position.z).collect();
        for _ in 0..1000 {
            assert_eq!(pool.advance(0.0, 0.5), 0);
        }
        let after: Vec<f32> = pool.obstacles().iter().map(|o| o.position.z).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn run_speed_moves_every_obstacle_by_exact_distance() {
        let mut pool = pool(9);
        pool.populate(6, 0.0, 0.0);
        let before: Vec<f32> = pool.obstacles().iter().map(|o| o.position.z).collect();
        pool.advance(4.0, 0.5);
        for (obstacle, z0) in pool.obstacles().iter().zip(before) {
            assert!((z0 - obstacle.position.z - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn crossing_near_plane_recycles_exactly_once() {
        let mut pool = pool(6);
        pool.populate(1, 0.0, 0.0);
        let rules = *pool.rules();
        let travel = rules.spawn_z - rules.recycle_z;
        let dt = 0.1;
        let speed = 2.0;
        let steps_per_crossing = (travel / (speed * dt)).ceil() as usize + 1;

        let mut total = 0;
        for _ in 0..steps_per_crossing * 3 {
            total += pool.advance(speed, dt);
            let obstacle = &pool.obstacles()[0];
            assert!(obstacle.position.z >= rules.recycle_z);
            assert!(obstacle.position.x.abs() >= rules.band_radius);
        }
        assert_eq!(total as u32, pool.obstacles()[0].recycles);
        assert!(total >= 2);
        assert!(total <= 3);
    }

    #[test]
    fn huge_delta_recycles_once_and_lands_at_spawn() {
        let mut pool = pool(8);
        pool.populate(4, 0.0, 0.0);
        let recycled = pool.advance(4.0, 1000.0);
        assert_eq!(recycled, 4);
        let spawn_z = pool.rules().spawn_z;
        assert!(pool.obstacles().iter().all(|o| o.position.z == spawn_z));
        assert_eq!(pool.total_recycles(), 4);
    }

    #[test]
    fn same_seed_reproduces_placement() {
        let mut a = pool(42);
        let mut b = pool(42);
        a.populate(6, 0.0, 0.0);
        b.populate(6, 0.0, 0.0);
        for _ in 0..200 {
            a.advance(4.0, 0.25);
            b.advance(4.0, 0.25);
        }
        for (oa, ob) in a.obstacles().iter().zip(b.obstacles()) {
            assert_eq!(oa.position, ob.position);
            assert_eq!(oa.rotation_y, ob.rotation_y);
            assert_eq!(oa.scale, ob.scale);
        }
    }
}
