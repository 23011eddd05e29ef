//! Projectile physics tick
//!
//! Integrates the launched projectile one variable frame at a time. Deltas are
//! normalized to 60fps-equivalent frames (`dt_ms / 16`) so the tuning constants
//! read as per-frame quantities.

use glam::Vec2;

use super::collision::resolve_enemy_contacts;
use super::events::{GameEvent, RemovalReason};
use super::world::{Facing, FlightPhase, Projectile, World};
use crate::consts::{FRAME_MS, SLOW_SPEED, STATIC_SPEED, STOPPED_SPEED, SUNK_STOP_SPEED};

/// Distance the projectile slides down while settling
const SETTLE_DROP: f32 = 30.0;

/// What the physics loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep ticking
    Continue,
    /// Nothing in flight
    Idle,
    /// The projectile left play this tick
    Removed(RemovalReason),
}

/// Advance the projectile by `dt_ms` milliseconds
pub fn step(world: &mut World, dt_ms: f32, out: &mut Vec<GameEvent>) -> StepOutcome {
    let ending = world.is_ending();
    let Some(projectile) = world.projectile.as_mut() else {
        return StepOutcome::Idle;
    };

    match projectile.phase {
        FlightPhase::Airborne => {}
        FlightPhase::Settling { remaining_ms } => {
            let fade = world.tuning.fade_out_ms;
            let left = remaining_ms - dt_ms;
            projectile.pos.y += SETTLE_DROP * (dt_ms.min(remaining_ms) / fade);
            projectile.opacity = (left / fade).clamp(0.0, 1.0);
            if left <= 0.0 {
                return remove(world, RemovalReason::Settled);
            }
            projectile.phase = FlightPhase::Settling { remaining_ms: left };
            return StepOutcome::Continue;
        }
        FlightPhase::Sinking { remaining_ms } => {
            let fade = world.tuning.fade_out_ms;
            let left = remaining_ms - dt_ms;
            projectile.opacity = projectile.opacity.min((left / fade).clamp(0.0, 1.0));
            if left <= 0.0 {
                return remove(world, RemovalReason::Sank);
            }
            projectile.phase = FlightPhase::Sinking { remaining_ms: left };
            return StepOutcome::Continue;
        }
    }

    let tuning = &world.tuning;
    let layout = &world.layout;
    let time_scale = dt_ms / FRAME_MS;
    let radius = tuning.projectile_radius;
    let diameter = tuning.projectile_diameter();

    projectile.airtime_ms += dt_ms;

    // Position
    let candidate = projectile.pos + projectile.vel * time_scale;

    if projectile.center(radius).x > layout.slingshot_right {
        projectile.cleared_slingshot = true;
    }

    if candidate.x < 0.0 && projectile.cleared_slingshot {
        projectile.vel.x = (-projectile.vel.x * tuning.bounce_factor).max(tuning.min_rebound_speed);
        projectile.pos.x = 0.0;
    } else if candidate.x + diameter > layout.width {
        projectile.vel.x = (-projectile.vel.x * tuning.bounce_factor).min(-tuning.min_rebound_speed);
        projectile.pos.x = layout.width - diameter;
    } else {
        projectile.pos.x = candidate.x;
    }
    projectile.pos.y = candidate.y;

    // Water
    let sink_line = layout.sink_line(tuning.sink_line_offset);
    let below_line = candidate.y + diameter > sink_line;
    if below_line && !ending {
        if !projectile.sunk {
            projectile.sunk = true;
            projectile.vel *= Vec2::new(0.7, 0.5);
            log::debug!("Projectile crossed the sink line at x={:.0}", projectile.pos.x);
        }
        projectile.vel *= Vec2::new(0.9, 0.95);

        let depth = projectile.pos.y + diameter - sink_line;
        let fade_depth = radius * tuning.sink_fade_radii;
        projectile.opacity = (1.0 - depth / fade_depth).clamp(0.0, 1.0);
    } else {
        if projectile.sunk && !below_line {
            projectile.sunk = false;
            projectile.opacity = 1.0;
        }
        let gravity = if ending {
            tuning.gravity * tuning.ending_gravity_scale
        } else {
            tuning.gravity
        };
        projectile.vel.y += gravity * time_scale;
    }

    projectile.vel.x *= tuning.friction;

    if ending {
        out.push(GameEvent::FallingTrail {
            pos: projectile.center(radius),
        });
    }

    projectile.facing = Facing::from_velocity(projectile.vel.x, projectile.facing);

    // Enemy contacts
    let scored = resolve_enemy_contacts(projectile, &mut world.enemies, &world.tuning, out);
    if scored > 0 {
        world.score += scored;
        out.push(GameEvent::ScoreChanged(world.score));
    }

    check_termination(world, dt_ms, out)
}

/// Termination checks in precedence order; the first match wins
fn check_termination(world: &mut World, dt_ms: f32, out: &mut Vec<GameEvent>) -> StepOutcome {
    let ending = world.is_ending();
    let tuning = &world.tuning;
    let layout = &world.layout;
    let Some(projectile) = world.projectile.as_mut() else {
        return StepOutcome::Idle;
    };

    let radius = tuning.projectile_radius;
    let diameter = tuning.projectile_diameter();
    let ground = layout.height;
    let pos = projectile.pos;

    let off_screen = pos.y < -radius * 4.0
        || pos.y > layout.height + radius * 2.0
        || pos.x < -radius * 4.0
        || pos.x > layout.width + radius * 4.0;
    if off_screen && !ending {
        return remove(world, RemovalReason::OffScreen);
    }

    let speed = projectile.speed();
    let on_ground = pos.y + diameter >= ground - 1.0;
    let stopped = speed < STOPPED_SPEED && projectile.vel.y.abs() < STOPPED_SPEED && on_ground;
    let sunk_stop = projectile.sunk
        && speed < SUNK_STOP_SPEED
        && pos.y > layout.sink_line(tuning.sink_line_offset) + radius;

    if speed < STATIC_SPEED && pos.y + diameter < ground - 5.0 {
        return remove(world, RemovalReason::Idle);
    }

    if speed < SLOW_SPEED && !(stopped || sunk_stop) {
        projectile.slow_movement_ms += dt_ms;
        if projectile.slow_movement_ms > tuning.max_slow_movement_ms {
            return remove(world, RemovalReason::SlowTooLong);
        }
    } else {
        projectile.slow_movement_ms = 0.0;
    }

    if projectile.airtime_ms > tuning.reset_in_from_launch_ms {
        return remove(world, RemovalReason::Idle);
    }

    if sunk_stop {
        projectile.phase = FlightPhase::Sinking {
            remaining_ms: tuning.fade_out_ms,
        };
        out.push(GameEvent::ProjectileSinking {
            pos: Vec2::new(pos.x + radius, pos.y),
        });
    } else if stopped {
        projectile.phase = FlightPhase::Settling {
            remaining_ms: tuning.fade_out_ms,
        };
    }

    StepOutcome::Continue
}

fn remove(world: &mut World, reason: RemovalReason) -> StepOutcome {
    match world.projectile.take() {
        Some(Projectile { pos, .. }) => {
            log::debug!("Projectile removed ({:?}) at ({:.0}, {:.0})", reason, pos.x, pos.y);
            StepOutcome::Removed(reason)
        }
        None => StepOutcome::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::{GameOverReason, Layout, SessionPhase};
    use crate::tuning::Tuning;

    fn world_with(pos: Vec2, vel: Vec2) -> World {
        let mut world = World::new(Layout::default(), Tuning::default(), 3);
        world.projectile = Some(Projectile::launch(pos, vel));
        world
    }

    fn projectile(world: &World) -> &Projectile {
        world.projectile.as_ref().unwrap()
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = world_with(Vec2::new(300.0, 100.0), Vec2::new(5.0, -5.0));
        let mut events = Vec::new();
        assert_eq!(step(&mut world, FRAME_MS, &mut events), StepOutcome::Continue);
        let p = projectile(&world);
        assert_eq!(p.pos, Vec2::new(305.0, 95.0));
        assert!((p.vel.y - -4.5).abs() < 1e-5);
        assert!((p.vel.x - 5.0 * 0.98).abs() < 1e-5);
    }

    #[test]
    fn test_right_wall_enforces_min_rebound() {
        let width = Layout::default().width;
        let mut world = world_with(Vec2::new(width - 41.0, 100.0), Vec2::new(2.0, 0.0));
        let mut events = Vec::new();
        step(&mut world, FRAME_MS, &mut events);
        let p = projectile(&world);
        assert_eq!(p.pos.x, width - 40.0);
        // -2 * 0.7 = -1.4, bumped to -2 then friction
        assert!((p.vel.x - -2.0 * 0.98).abs() < 1e-5);
        assert_eq!(p.facing, Facing::Left);
    }

    #[test]
    fn test_left_wall_ignored_until_slingshot_cleared() {
        let mut world = world_with(Vec2::new(2.0, 100.0), Vec2::new(-5.0, 0.0));
        let mut events = Vec::new();
        step(&mut world, FRAME_MS, &mut events);
        assert!(projectile(&world).pos.x < 0.0);

        let mut world = world_with(Vec2::new(2.0, 100.0), Vec2::new(-5.0, 0.0));
        world.projectile.as_mut().unwrap().cleared_slingshot = true;
        step(&mut world, FRAME_MS, &mut events);
        let p = projectile(&world);
        assert_eq!(p.pos.x, 0.0);
        assert!(p.vel.x > 0.0);
    }

    #[test]
    fn test_sink_line_damps_and_fades() {
        let layout = Layout::default();
        let sink_line = layout.sink_line(100.0);
        let mut world = world_with(Vec2::new(400.0, sink_line - 35.0), Vec2::new(4.0, 10.0));
        let mut events = Vec::new();
        step(&mut world, FRAME_MS, &mut events);
        let p = projectile(&world);
        assert!(p.sunk);
        // One-off damping then continuous damping, no gravity
        assert!((p.vel.y - 10.0 * 0.5 * 0.95).abs() < 1e-4);
        assert!((p.vel.x - 4.0 * 0.7 * 0.9 * 0.98).abs() < 1e-4);
        // 15px below the line over a fade depth of 80px
        assert!((p.opacity - (1.0 - 15.0 / 80.0)).abs() < 1e-4);
    }

    #[test]
    fn test_rising_above_line_clears_sunk() {
        let layout = Layout::default();
        let sink_line = layout.sink_line(100.0);
        let mut world = world_with(Vec2::new(400.0, sink_line - 30.0), Vec2::new(4.0, -20.0));
        {
            let p = world.projectile.as_mut().unwrap();
            p.sunk = true;
            p.opacity = 0.5;
        }
        let mut events = Vec::new();
        step(&mut world, FRAME_MS, &mut events);
        let p = projectile(&world);
        assert!(!p.sunk);
        assert_eq!(p.opacity, 1.0);
    }

    #[test]
    fn test_off_screen_removes() {
        let mut world = world_with(Vec2::new(300.0, -70.0), Vec2::new(0.0, -20.0));
        let mut events = Vec::new();
        assert_eq!(
            step(&mut world, FRAME_MS, &mut events),
            StepOutcome::Removed(RemovalReason::OffScreen)
        );
        assert!(world.projectile.is_none());
    }

    #[test]
    fn test_off_screen_ignored_while_ending() {
        let mut world = world_with(Vec2::new(300.0, -70.0), Vec2::new(0.0, -20.0));
        world.phase = SessionPhase::Ending {
            reason: GameOverReason::BaseDestroyed,
            remaining_ms: 2500.0,
        };
        let mut events = Vec::new();
        assert_eq!(step(&mut world, FRAME_MS, &mut events), StepOutcome::Continue);
        assert!(events.iter().any(|e| matches!(e, GameEvent::FallingTrail { .. })));
    }

    #[test]
    fn test_ending_gravity_is_stronger() {
        let mut world = world_with(Vec2::new(300.0, 100.0), Vec2::new(0.0, 1.0));
        world.phase = SessionPhase::Ending {
            reason: GameOverReason::BaseDestroyed,
            remaining_ms: 2500.0,
        };
        let mut events = Vec::new();
        step(&mut world, FRAME_MS, &mut events);
        let gravity = world.tuning.gravity * world.tuning.ending_gravity_scale;
        assert!((projectile(&world).vel.y - (1.0 + gravity)).abs() < 1e-5);

        // Half a frame scales the pull too
        let mut world = world_with(Vec2::new(300.0, 100.0), Vec2::new(0.0, 1.0));
        world.phase = SessionPhase::Ending {
            reason: GameOverReason::OutOfProjectiles,
            remaining_ms: 2500.0,
        };
        step(&mut world, FRAME_MS / 2.0, &mut events);
        assert!((projectile(&world).vel.y - (1.0 + gravity * 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_hovering_projectile_removed() {
        // Apex of a lob: almost no speed, well above the ground
        let mut world = world_with(Vec2::new(300.0, 100.0), Vec2::new(0.0, -0.4));
        let mut events = Vec::new();
        assert_eq!(
            step(&mut world, FRAME_MS, &mut events),
            StepOutcome::Removed(RemovalReason::Idle)
        );
    }

    #[test]
    fn test_removed_one_second_after_launch() {
        let mut world = world_with(Vec2::new(100.0, 50.0), Vec2::new(6.0, -12.0));
        let mut events = Vec::new();
        let mut outcome = StepOutcome::Continue;
        let mut elapsed = 0.0;
        while outcome == StepOutcome::Continue {
            outcome = step(&mut world, FRAME_MS, &mut events);
            elapsed += FRAME_MS;
        }
        assert!(matches!(outcome, StepOutcome::Removed(_)));
        assert!(elapsed <= 1000.0 + FRAME_MS);
    }

    #[test]
    fn test_slow_timer_resets_when_fast() {
        let mut world = world_with(Vec2::new(300.0, 100.0), Vec2::new(8.0, 0.0));
        world.projectile.as_mut().unwrap().slow_movement_ms = 1500.0;
        let mut events = Vec::new();
        step(&mut world, FRAME_MS, &mut events);
        assert_eq!(projectile(&world).slow_movement_ms, 0.0);
    }

    #[test]
    fn test_settling_counts_down_then_removes() {
        let height = Layout::default().height;
        // Resting on the ground edge
        let mut world = world_with(Vec2::new(300.0, height - 40.0), Vec2::new(0.0, -0.2));
        world.tuning.sink_line_offset = -1000.0;
        let mut events = Vec::new();
        assert_eq!(step(&mut world, FRAME_MS, &mut events), StepOutcome::Continue);
        assert!(matches!(
            projectile(&world).phase,
            FlightPhase::Settling { .. }
        ));

        let y = projectile(&world).pos.y;
        assert_eq!(step(&mut world, 500.0, &mut events), StepOutcome::Continue);
        let p = projectile(&world);
        assert!((p.pos.y - (y + 15.0)).abs() < 1e-3);
        assert!((p.opacity - 0.5).abs() < 1e-3);

        assert_eq!(
            step(&mut world, 500.0, &mut events),
            StepOutcome::Removed(RemovalReason::Settled)
        );
        assert!(world.projectile.is_none());
    }

    #[test]
    fn test_sunk_and_slow_starts_sinking() {
        let sink_line = Layout::default().sink_line(100.0);
        let mut world = world_with(Vec2::new(300.0, sink_line + 30.0), Vec2::new(0.5, 0.3));
        world.projectile.as_mut().unwrap().sunk = true;
        let mut events = Vec::new();
        assert_eq!(step(&mut world, FRAME_MS, &mut events), StepOutcome::Continue);
        assert!(matches!(projectile(&world).phase, FlightPhase::Sinking { .. }));
        assert!(events.iter().any(|e| matches!(e, GameEvent::ProjectileSinking { .. })));

        assert_eq!(
            step(&mut world, 1000.0, &mut events),
            StepOutcome::Removed(RemovalReason::Sank)
        );
    }

    #[test]
    fn test_step_without_projectile_is_idle() {
        let mut world = World::new(Layout::default(), Tuning::default(), 1);
        let mut events = Vec::new();
        assert_eq!(step(&mut world, FRAME_MS, &mut events), StepOutcome::Idle);
    }
}
