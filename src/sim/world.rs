//! World state and core simulation types
//!
//! Everything the two tick loops mutate lives in [`World`]. A restart throws
//! the whole value away and builds a fresh one.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::base::BaseHealth;
use crate::tuning::Tuning;

/// Screen geometry reported by the host (CSS pixels, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Play area size
    pub width: f32,
    pub height: f32,
    /// Slingshot pouch: drag vectors are measured from here and the resting
    /// projectile is centered on it
    pub anchor: Vec2,
    /// Horizontal extent of the slingshot frame
    pub slingshot_left: f32,
    pub slingshot_right: f32,
    /// Right edge of the defended base; enemies crossing it hit the base
    pub base_right: f32,
    /// Water band enemies spawn in
    pub sea_top: f32,
    pub sea_height: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            anchor: Vec2::new(180.0, 380.0),
            slingshot_left: 160.0,
            slingshot_right: 200.0,
            base_right: 120.0,
            sea_top: 350.0,
            sea_height: 250.0,
        }
    }
}

impl Layout {
    /// Height of the sink line (the water surface the projectile sinks through)
    pub fn sink_line(&self, offset: f32) -> f32 {
        self.height - offset
    }

    /// Top of the spawn band and its height. The lowest 100px of the sea stay clear.
    pub fn spawn_band(&self) -> (f32, f32) {
        let top = self.sea_top.max(0.0);
        let height = (self.sea_height - 100.0) + (self.sea_top - top);
        (top, height.max(0.0))
    }

    /// Top-left of the projectile while it rests in the pouch
    pub fn rest_position(&self, radius: f32) -> Vec2 {
        self.anchor - Vec2::splat(radius)
    }
}

/// Which way the projectile sprite faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Facing with hysteresis: the dead zone around zero keeps the previous facing
    pub fn from_velocity(vx: f32, previous: Facing) -> Facing {
        if vx == 0.0 || vx > 0.5 {
            Facing::Right
        } else if vx < -0.5 {
            Facing::Left
        } else {
            previous
        }
    }
}

/// Sub-state of a launched projectile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlightPhase {
    /// Integrating every tick
    Airborne,
    /// Came to rest on the ground; sliding down and fading before removal
    Settling { remaining_ms: f32 },
    /// Sunk and slow in the water; fading before removal
    Sinking { remaining_ms: f32 },
}

/// The launched penguin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    /// Top-left of the bounding square
    pub pos: Vec2,
    pub vel: Vec2,
    pub phase: FlightPhase,
    /// Simulated time since launch (pauses excluded)
    pub airtime_ms: f32,
    /// Below the sink line
    pub sunk: bool,
    /// Accumulated time spent under the slow-speed threshold
    pub slow_movement_ms: f32,
    pub facing: Facing,
    pub opacity: f32,
    /// Has been right of the slingshot at least once (arms the left wall)
    pub cleared_slingshot: bool,
}

impl Projectile {
    pub fn launch(origin: Vec2, vel: Vec2) -> Self {
        Self {
            pos: origin,
            vel,
            phase: FlightPhase::Airborne,
            airtime_ms: 0.0,
            sunk: false,
            slow_movement_ms: 0.0,
            facing: Facing::from_velocity(vel.x, Facing::Right),
            opacity: 1.0,
            cleared_slingshot: false,
        }
    }

    pub fn center(&self, radius: f32) -> Vec2 {
        self.pos + Vec2::splat(radius)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    CargoShip,
    Sailboat,
    Speedboat,
    Seal,
    Shark,
    Swimmer,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 6] = [
        EnemyKind::CargoShip,
        EnemyKind::Sailboat,
        EnemyKind::Speedboat,
        EnemyKind::Seal,
        EnemyKind::Shark,
        EnemyKind::Swimmer,
    ];

    pub fn emoji(&self) -> &'static str {
        match self {
            EnemyKind::CargoShip => "🚢",
            EnemyKind::Sailboat => "⛵",
            EnemyKind::Speedboat => "🛥️",
            EnemyKind::Seal => "🦭",
            EnemyKind::Shark => "🦈",
            EnemyKind::Swimmer => "🏊‍♂️",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::CargoShip => "cargo ship",
            EnemyKind::Sailboat => "sailboat",
            EnemyKind::Speedboat => "speedboat",
            EnemyKind::Seal => "seal",
            EnemyKind::Shark => "shark",
            EnemyKind::Swimmer => "swimmer",
        }
    }

    /// Score awarded for sinking one
    pub fn points(&self) -> u64 {
        match self {
            EnemyKind::CargoShip => 100,
            EnemyKind::Sailboat => 120,
            EnemyKind::Speedboat => 150,
            EnemyKind::Seal => 180,
            EnemyKind::Shark => 250,
            EnemyKind::Swimmer => 200,
        }
    }

    /// Size before per-spawn variation
    pub fn base_size(&self) -> f32 {
        match self {
            EnemyKind::CargoShip => 1.5,
            EnemyKind::Sailboat => 1.3,
            EnemyKind::Speedboat => 1.4,
            EnemyKind::Seal => 1.0,
            EnemyKind::Shark => 1.6,
            EnemyKind::Swimmer => 0.9,
        }
    }

    /// Relative spawn weight
    pub fn weight(&self) -> u32 {
        1
    }

    /// Weighted random pick
    pub fn pick<R: Rng>(rng: &mut R) -> EnemyKind {
        let total: u32 = Self::ALL.iter().map(EnemyKind::weight).sum();
        let mut roll = rng.random_range(0..total);
        for kind in Self::ALL {
            if roll < kind.weight() {
                return kind;
            }
            roll -= kind.weight();
        }
        EnemyKind::Seal
    }
}

/// An enemy advancing on the base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    /// Top-left of the sprite box
    pub pos: Vec2,
    pub speed: f32,
    /// Scale factor relative to a size-1 enemy
    pub size: f32,
    pub hit_points: u32,
    pub max_hit_points: u32,
    /// Logically gone: destroyed, reached the base or left the screen
    pub is_hit: bool,
    pub points: u64,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, speed: f32, size: f32) -> Self {
        let hit_points = (size * 2.0).ceil().max(1.0) as u32;
        Self {
            id,
            kind,
            pos,
            speed,
            size,
            hit_points,
            max_hit_points: hit_points,
            is_hit: false,
            points: kind.points(),
        }
    }

    /// Collision radius
    pub fn radius(&self, enemy_radius: f32) -> f32 {
        enemy_radius * self.size
    }

    pub fn center(&self, enemy_radius: f32) -> Vec2 {
        self.pos + Vec2::splat(self.radius(enemy_radius))
    }

    /// Subtract hit points; returns true when that leaves the enemy at zero
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        self.hit_points = self.hit_points.saturating_sub(damage);
        self.hit_points == 0
    }

    /// Mark as logically gone. Returns false if it already was.
    pub fn defeat(&mut self) -> bool {
        if self.is_hit {
            return false;
        }
        self.is_hit = true;
        true
    }

    /// Remaining health in [0, 1]
    pub fn health_fraction(&self) -> f32 {
        if self.max_hit_points == 0 {
            0.0
        } else {
            self.hit_points as f32 / self.max_hit_points as f32
        }
    }
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Base health reached zero
    BaseDestroyed,
    /// Projectile supply ran out with enemies still afloat
    OutOfProjectiles,
    /// Final configured wave completed
    AllWavesCleared,
}

impl GameOverReason {
    pub fn message(&self) -> &'static str {
        match self {
            GameOverReason::BaseDestroyed => "Base Destroyed!",
            GameOverReason::OutOfProjectiles => "Game Over!",
            GameOverReason::AllWavesCleared => "All Waves Cleared!",
        }
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    /// Defeat reached; physics keeps running for the fall animation
    Ending {
        reason: GameOverReason,
        remaining_ms: f32,
    },
    /// Both loops halted, terminal screen shown
    Over { reason: GameOverReason },
}

/// Complete mutable simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub layout: Layout,
    pub tuning: Tuning,
    /// The launched projectile; `None` means ready at the slingshot
    pub projectile: Option<Projectile>,
    /// Enemies of the current wave (defeated ones stay until the wave resets)
    pub enemies: Vec<Enemy>,
    pub score: u64,
    pub base: BaseHealth,
    /// Current wave number (1-based)
    pub current_wave: u32,
    pub enemies_in_wave: u32,
    pub wave_in_progress: bool,
    pub paused: bool,
    pub phase: SessionPhase,
    /// Projectiles left this wave; `None` = unlimited
    pub projectiles_left: Option<u32>,
    pub seed: u64,
    pub(crate) rng: Pcg32,
    next_id: u32,
}

impl World {
    pub fn new(layout: Layout, tuning: Tuning, seed: u64) -> Self {
        let enemies_in_wave = tuning.enemies_base_count;
        Self {
            layout,
            tuning,
            projectile: None,
            enemies: Vec::new(),
            score: 0,
            base: BaseHealth::new(),
            current_wave: 1,
            enemies_in_wave,
            wave_in_progress: false,
            paused: false,
            phase: SessionPhase::Playing,
            projectiles_left: None,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Discard everything and start over with the same geometry and tuning
    pub fn reset(&mut self, seed: u64) {
        *self = World::new(self.layout, self.tuning.clone(), seed);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Defeat reached (ending sequence or terminal screen)
    pub fn is_game_over(&self) -> bool {
        !matches!(self.phase, SessionPhase::Playing)
    }

    /// Inside the post-defeat grace period
    pub fn is_ending(&self) -> bool {
        matches!(self.phase, SessionPhase::Ending { .. })
    }

    pub fn all_enemies_defeated(&self) -> bool {
        self.enemies.iter().all(|e| e.is_hit)
    }

    pub fn rest_position(&self) -> Vec2 {
        self.layout.rest_position(self.tuning.projectile_radius)
    }
}
