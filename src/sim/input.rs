//! Drag-to-launch input
//!
//! Press on the resting projectile, drag away from the pouch, release to fire.
//! The drag vector is measured from the slingshot anchor and clamped so the
//! player cannot pull toward the enemies or stretch the bands indefinitely.

use glam::Vec2;

use super::events::GameEvent;
use super::world::World;
use crate::consts::{STRETCH_SOUND_INTERVAL_MS, STRETCH_SOUND_STEP};
use crate::tuning::Tuning;

/// A confirmed launch handed to the physics integrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    /// Top-left of the projectile at release
    pub origin: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    /// Clamped drag vector (pointer minus anchor)
    vector: Vec2,
    last_stretch_len: f32,
    last_stretch_at: f64,
}

/// Press/drag/release state machine
#[derive(Debug, Clone, Default)]
pub struct InputController {
    drag: Option<Drag>,
}

/// Clamp a raw drag vector: no more than `max_drag_right` toward the enemies,
/// no longer than `max_drag` overall
pub fn clamp_drag(raw: Vec2, tuning: &Tuning) -> Vec2 {
    let mut drag = raw;
    drag.x = drag.x.min(tuning.max_drag_right);
    drag.clamp_length_max(tuning.max_drag)
}

/// Launch velocity for a clamped drag vector, or `None` when the pull is too short
pub fn launch_velocity(drag: Vec2, tuning: &Tuning) -> Option<Vec2> {
    let pull = drag.length();
    if pull < tuning.min_pull {
        return None;
    }

    let power = (pull / tuning.power_divisor).min(tuning.max_power);
    let velocity = -drag / tuning.elasticity * power;

    let speed = velocity.length();
    if speed < tuning.min_launch_speed {
        // pull >= min_pull > 0 so the direction is well defined
        Some(velocity / speed * tuning.min_launch_speed)
    } else {
        Some(velocity)
    }
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current clamped drag vector while a drag is active
    pub fn aim(&self) -> Option<Vec2> {
        self.drag.map(|d| d.vector)
    }

    /// Begin a drag. Returns false when the press is rejected.
    pub fn press(&mut self, world: &World, pointer: Vec2) -> bool {
        if world.projectile.is_some() || world.is_game_over() || world.paused {
            return false;
        }
        if world.projectiles_left == Some(0) {
            return false;
        }
        if pointer.distance(world.layout.anchor) > world.tuning.grab_radius {
            return false;
        }

        self.drag = Some(Drag {
            vector: clamp_drag(pointer - world.layout.anchor, &world.tuning),
            last_stretch_len: 0.0,
            last_stretch_at: f64::NEG_INFINITY,
        });
        true
    }

    /// Update the drag; emits a stretch cue when the band length changed enough
    pub fn drag(&mut self, world: &World, pointer: Vec2, now: f64, out: &mut Vec<GameEvent>) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };

        let raw = pointer - world.layout.anchor;
        drag.vector = clamp_drag(raw, &world.tuning);

        // Unclamped, so pulling past the limit still creaks
        let len = raw.length();
        if (len - drag.last_stretch_len).abs() > STRETCH_SOUND_STEP
            && now - drag.last_stretch_at > STRETCH_SOUND_INTERVAL_MS
        {
            drag.last_stretch_len = len;
            drag.last_stretch_at = now;
            out.push(GameEvent::Stretch);
        }
    }

    /// Finish the drag. A release without an active drag is ignored.
    pub fn release(
        &mut self,
        world: &World,
        pointer: Vec2,
        out: &mut Vec<GameEvent>,
    ) -> Option<Launch> {
        self.drag.take()?;

        if world.projectile.is_some() || world.is_game_over() {
            return None;
        }

        let drag = clamp_drag(pointer - world.layout.anchor, &world.tuning);
        let Some(velocity) = launch_velocity(drag, &world.tuning) else {
            log::debug!("Launch cancelled, pull {:.1}", drag.length());
            out.push(GameEvent::LaunchCancelled);
            return None;
        };

        let origin = world.layout.anchor + drag - Vec2::splat(world.tuning.projectile_radius);
        out.push(GameEvent::Launched { origin, velocity });
        Some(Launch { origin, velocity })
    }

    /// Drop any active drag without launching
    pub fn cancel(&mut self) {
        self.drag = None;
    }
}
