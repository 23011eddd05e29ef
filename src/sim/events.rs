//! Events emitted by the simulation
//!
//! Ticks never touch the presentation layer directly. They push events into a
//! buffer that the session drains into the view and audio sinks.

use glam::Vec2;

use super::world::{EnemyKind, GameOverReason};

/// Why a projectile left play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Left the screen bounds
    OffScreen,
    /// Hovering nearly motionless a second after launch
    Idle,
    /// Slow for too long
    SlowTooLong,
    /// Came to rest on the ground and faded out
    Settled,
    /// Sank below the water and faded out
    Sank,
}

/// Something the view or audio should react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Drag length changed enough to replay the stretch cue
    Stretch,
    /// Projectile left the slingshot
    Launched { origin: Vec2, velocity: Vec2 },
    /// Release with too little pull; projectile snapped back
    LaunchCancelled,
    EnemySpawned {
        id: u32,
        kind: EnemyKind,
        pos: Vec2,
        size: f32,
    },
    /// Hit hard enough to sink (score already awarded)
    EnemyDestroyed { id: u32, pos: Vec2, points: u64 },
    /// Hit but still afloat; `remaining` is the health fraction left
    EnemyDamaged {
        id: u32,
        pos: Vec2,
        damage: u32,
        remaining: f32,
    },
    /// Glancing contact, projectile bounced off
    EnemyBounced { id: u32, size: f32 },
    /// Drifted off the left edge without reaching the base
    EnemyExpired { id: u32 },
    /// Enemy reached the base
    BaseImpact {
        id: u32,
        pos: Vec2,
        damage: u32,
        health: u32,
    },
    /// Projectile dropped below the sink line
    ProjectileSinking { pos: Vec2 },
    /// Falling projectile during the ending sequence
    FallingTrail { pos: Vec2 },
    /// Projectile gone; a fresh one waits at the slingshot
    ProjectileRemoved { reason: RemovalReason },
    ScoreChanged(u64),
    HealthChanged(u32),
    WaveStarted(u32),
    WaveCleared(u32),
    Paused,
    Resumed,
    GameOver {
        reason: GameOverReason,
        score: u64,
        wave: u32,
    },
    Restarted,
    MuteToggled(bool),
}
