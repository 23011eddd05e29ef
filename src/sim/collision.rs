//! Collision detection and response between the projectile and enemies
//!
//! Both bodies are circles. A fast enough hit damages (or sinks) the enemy; a
//! slow one just shoves the projectile away. Every contact also adds a small
//! base bounce along the contact normal.

use glam::Vec2;

use super::events::GameEvent;
use super::world::{Enemy, Projectile};
use crate::tuning::Tuning;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the circles overlap
    pub hit: bool,
    /// Contact point on the second circle's surface
    pub point: Vec2,
    /// Unit normal pointing from the second circle toward the first
    pub normal: Vec2,
    /// Overlap depth
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Circle-circle overlap test
///
/// Coincident centers get an upward normal so the response stays finite.
pub fn circle_collision(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> CollisionResult {
    let delta = a - b;
    let distance = delta.length();
    let reach = a_radius + b_radius;

    if distance >= reach {
        return CollisionResult::miss();
    }

    let normal = if distance > f32::EPSILON {
        delta / distance
    } else {
        Vec2::NEG_Y
    };

    CollisionResult {
        hit: true,
        point: b + normal * b_radius,
        normal,
        penetration: reach - distance,
    }
}

/// Minimum impact speed that damages an enemy of the given size
pub fn required_speed(size: f32, tuning: &Tuning) -> f32 {
    tuning.min_explosion_speed * (size * 0.8)
}

/// Hit points removed by an impact at `speed`
pub fn impact_damage(speed: f32, required: f32) -> u32 {
    (speed / required).ceil().max(1.0) as u32
}

/// Resolve contacts between the projectile and every live enemy
///
/// Enemies are visited in list order and every overlap is applied, so touching
/// two enemies in one tick compounds their impulses. Returns points scored.
pub fn resolve_enemy_contacts(
    projectile: &mut Projectile,
    enemies: &mut [Enemy],
    tuning: &Tuning,
    out: &mut Vec<GameEvent>,
) -> u64 {
    let radius = tuning.projectile_radius;
    let mut scored = 0;

    for enemy in enemies.iter_mut().filter(|e| !e.is_hit) {
        let enemy_center = enemy.center(tuning.enemy_radius);
        let contact = circle_collision(
            projectile.center(radius),
            radius,
            enemy_center,
            enemy.radius(tuning.enemy_radius),
        );
        if !contact.hit {
            continue;
        }

        let speed = projectile.speed();
        let required = required_speed(enemy.size, tuning);

        if speed >= required {
            let damage = impact_damage(speed, required);
            if enemy.apply_damage(damage) {
                enemy.defeat();
                // Surfacing: a kill knocks the projectile out of the water state
                projectile.sunk = false;
                scored += enemy.points;
                log::debug!("Sank {} #{} for {} points", enemy.kind.name(), enemy.id, enemy.points);
                out.push(GameEvent::EnemyDestroyed {
                    id: enemy.id,
                    pos: enemy_center,
                    points: enemy.points,
                });
            } else {
                out.push(GameEvent::EnemyDamaged {
                    id: enemy.id,
                    pos: enemy_center,
                    damage,
                    remaining: enemy.health_fraction(),
                });
            }
        } else {
            projectile.vel += contact.normal * (tuning.low_speed_bounce * enemy.size);
            out.push(GameEvent::EnemyBounced {
                id: enemy.id,
                size: enemy.size,
            });
        }

        projectile.vel += contact.normal * tuning.contact_bounce;
    }

    scored
}
