//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the page:
//! - Variable frame deltas normalized to 60fps-equivalent frames
//! - Seeded RNG only
//! - Stable iteration order (enemy list order)
//! - Output goes through [`GameEvent`]s and the presentation sink

pub mod base;
pub mod collision;
pub mod events;
pub mod input;
pub mod physics;
pub mod session;
pub mod waves;
pub mod world;

pub use base::BaseHealth;
pub use collision::{CollisionResult, circle_collision, resolve_enemy_contacts};
pub use events::{GameEvent, RemovalReason};
pub use input::{InputController, Launch};
pub use physics::{StepOutcome, step};
pub use session::{FrameClock, LoopControl, Session};
pub use waves::{WaveOutcome, WavePhase, WaveScheduler};
pub use world::{
    Enemy, EnemyKind, Facing, FlightPhase, GameOverReason, Layout, Projectile, SessionPhase, World,
};
