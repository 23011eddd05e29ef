//! Penguin Defense - slingshot arcade defense
//!
//! Core modules:
//! - `sim`: Simulation core (drag input, projectile physics, collisions, waves, session)
//! - `tuning`: Data-driven game balance
//! - `presentation`: Sink the core reports transforms and effects to
//! - `audio`: Fire-and-forget sound cues

pub mod audio;
pub mod presentation;
pub mod sim;
pub mod tuning;

pub use audio::{AudioSink, SoundKind};
pub use presentation::Presentation;
pub use sim::{GameEvent, LoopControl, Session};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Physics tick normalization: deltas are expressed in 60fps-equivalent frames
    pub const FRAME_MS: f32 = 16.0;
    /// Largest frame delta fed to a tick (prevents teleporting after a stall)
    pub const MAX_FRAME_DELTA_MS: f32 = 100.0;

    /// Projectile physics
    pub const GRAVITY: f32 = 0.5;
    pub const BOUNCE_FACTOR: f32 = 0.7;
    pub const MIN_REBOUND_SPEED: f32 = 2.0;
    pub const FRICTION: f32 = 0.98;
    pub const PROJECTILE_RADIUS: f32 = 20.0;
    /// Gravity multiplier while the session is ending (dramatic fall)
    pub const ENDING_GRAVITY_SCALE: f32 = 1.5;

    /// Water: sink line sits this far above the bottom edge
    pub const SINK_LINE_OFFSET: f32 = 100.0;
    /// Depth (in projectile radii) over which a sunk projectile fades out
    pub const SINK_FADE_RADII: f32 = 4.0;

    /// Drag-to-launch
    pub const ELASTICITY: f32 = 15.0;
    pub const MAX_DRAG: f32 = 150.0;
    pub const MAX_DRAG_RIGHT: f32 = 50.0;
    pub const MIN_PULL: f32 = 5.0;
    pub const POWER_DIVISOR: f32 = 50.0;
    pub const MAX_POWER: f32 = 3.0;
    pub const MIN_LAUNCH_SPEED: f32 = 3.0;
    pub const STRETCH_SOUND_STEP: f32 = 10.0;
    pub const STRETCH_SOUND_INTERVAL_MS: f64 = 300.0;

    /// Projectile cleanup thresholds
    pub const RESET_IN_FROM_LAUNCH_MS: f32 = 1000.0;
    pub const MAX_SLOW_MOVEMENT_MS: f32 = 2000.0;
    pub const SLOW_SPEED: f32 = 1.5;
    pub const STATIC_SPEED: f32 = 0.2;
    pub const STOPPED_SPEED: f32 = 0.5;
    pub const SUNK_STOP_SPEED: f32 = 2.0;
    /// Duration of the settle / sink fade before the projectile is removed
    pub const FADE_OUT_MS: f32 = 1000.0;

    /// Enemies
    pub const ENEMY_RADIUS: f32 = 17.5;
    pub const MIN_EXPLOSION_SPEED: f32 = 8.0;
    pub const LOW_SPEED_BOUNCE: f32 = 3.0;
    pub const CONTACT_BOUNCE: f32 = 2.0;
    pub const ENEMY_EXIT_X: f32 = -50.0;

    /// Waves
    pub const ENEMIES_BASE_COUNT: u32 = 5;
    pub const ENEMIES_BASE_SPEED: f32 = 0.5;
    pub const ENEMY_SPEED_PER_WAVE: f32 = 0.12;
    pub const ENEMIES_BASE_SPAWN_DELAY_MS: f32 = 700.0;
    pub const ENEMIES_MIN_SPAWN_DELAY_MS: f32 = 200.0;
    pub const SPAWN_DELAY_STEP_MS: f32 = 50.0;
    pub const WAVE_INTERMISSION_MS: f32 = 3000.0;

    /// Base
    pub const BASE_MAX_HEALTH: u32 = 100;
    pub const BASE_DAMAGE_PER_ENEMY: u32 = 10;

    /// Grace period after defeat before both loops halt
    pub const GAME_OVER_GRACE_MS: f32 = 2500.0;
}
