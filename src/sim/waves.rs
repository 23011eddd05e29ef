//! Wave scheduling and enemy advance
//!
//! Each wave spawns a batch of enemies on a fixed cadence, marches them toward
//! the base, and once every one of them is gone waits out an intermission
//! before starting the next wave. All timers run on game-loop time, so a
//! paused session also pauses spawning.

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::world::{Enemy, EnemyKind, World};
use crate::consts::{ENEMY_EXIT_X, FRAME_MS};
use crate::tuning::Tuning;

/// Per-wave scheduler state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WavePhase {
    /// No wave running
    Idle,
    /// Emitting enemies on the spawn cadence
    Spawning { spawned: u32, since_last_ms: f32 },
    /// Everything spawned, some still afloat
    Active,
    /// Wave cleared; counting down the intermission
    Complete { remaining_ms: f32 },
}

/// What the session should react to after a game tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveOutcome {
    Continue,
    BaseDestroyed,
    /// The configured final wave was cleared
    AllWavesCleared,
}

/// Enemies in wave `n`
pub fn enemy_count(wave: u32, tuning: &Tuning) -> u32 {
    tuning.enemies_base_count + (wave as f32 / 1.5).floor() as u32
}

/// Milliseconds between spawns in wave `n`
pub fn spawn_delay_ms(wave: u32, tuning: &Tuning) -> f32 {
    (tuning.base_spawn_delay_ms - wave as f32 * tuning.spawn_delay_step_ms)
        .max(tuning.min_spawn_delay_ms)
}

/// Nominal enemy speed in wave `n` before per-enemy variation
pub fn enemy_speed(wave: u32, tuning: &Tuning) -> f32 {
    tuning.enemies_base_speed + wave as f32 * tuning.enemy_speed_per_wave
}

#[derive(Debug, Clone)]
pub struct WaveScheduler {
    phase: WavePhase,
}

impl Default for WaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveScheduler {
    pub fn new() -> Self {
        Self {
            phase: WavePhase::Idle,
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Still emitting enemies for the current wave
    pub fn is_spawning(&self) -> bool {
        matches!(self.phase, WavePhase::Spawning { .. })
    }

    /// Enemies still expected or afloat in the current wave
    pub fn enemies_remaining(&self, world: &World) -> bool {
        self.is_spawning() || !world.all_enemies_defeated()
    }

    /// Start `world.current_wave`. Ignored while a wave runs or after defeat.
    pub fn start_wave(&mut self, world: &mut World, out: &mut Vec<GameEvent>) -> bool {
        if world.wave_in_progress || world.is_game_over() {
            return false;
        }

        let wave = world.current_wave;
        world.enemies.clear();
        world.enemies_in_wave = enemy_count(wave, &world.tuning);
        world.wave_in_progress = true;
        if world.tuning.limited_supply {
            world.projectiles_left = Some(world.enemies_in_wave);
        }

        self.phase = WavePhase::Spawning {
            spawned: 0,
            since_last_ms: 0.0,
        };

        log::info!(
            "Wave {}: {} enemies every {}ms",
            wave,
            world.enemies_in_wave,
            spawn_delay_ms(wave, &world.tuning)
        );
        out.push(GameEvent::WaveStarted(wave));
        true
    }

    /// Advance enemies and wave timers by `dt_ms`
    pub fn tick(&mut self, world: &mut World, dt_ms: f32, out: &mut Vec<GameEvent>) -> WaveOutcome {
        if world.is_game_over() {
            return WaveOutcome::Continue;
        }

        if advance_enemies(world, dt_ms, out) {
            return WaveOutcome::BaseDestroyed;
        }

        match self.phase {
            WavePhase::Idle | WavePhase::Active => {}
            WavePhase::Spawning {
                mut spawned,
                mut since_last_ms,
            } => {
                let delay = spawn_delay_ms(world.current_wave, &world.tuning);
                since_last_ms += dt_ms;
                while since_last_ms >= delay && spawned < world.enemies_in_wave {
                    since_last_ms -= delay;
                    spawn_enemy(world, out);
                    spawned += 1;
                }
                self.phase = if spawned >= world.enemies_in_wave {
                    WavePhase::Active
                } else {
                    WavePhase::Spawning {
                        spawned,
                        since_last_ms,
                    }
                };
            }
            WavePhase::Complete { remaining_ms } => {
                let left = remaining_ms - dt_ms;
                if left > 0.0 {
                    self.phase = WavePhase::Complete { remaining_ms: left };
                } else {
                    self.phase = WavePhase::Idle;
                    world.current_wave += 1;
                    self.start_wave(world, out);
                }
                return WaveOutcome::Continue;
            }
        }

        self.check_complete(world, out)
    }

    fn check_complete(&mut self, world: &mut World, out: &mut Vec<GameEvent>) -> WaveOutcome {
        if !world.wave_in_progress || self.is_spawning() || !world.all_enemies_defeated() {
            return WaveOutcome::Continue;
        }

        world.wave_in_progress = false;
        let wave = world.current_wave;
        log::info!("Wave {} cleared, score {}", wave, world.score);
        out.push(GameEvent::WaveCleared(wave));

        if world.tuning.max_waves.is_some_and(|max| wave >= max) {
            self.phase = WavePhase::Idle;
            return WaveOutcome::AllWavesCleared;
        }

        self.phase = WavePhase::Complete {
            remaining_ms: world.tuning.wave_intermission_ms,
        };
        WaveOutcome::Continue
    }

    pub fn reset(&mut self) {
        self.phase = WavePhase::Idle;
    }
}

/// Move live enemies left; returns true when the base was destroyed
fn advance_enemies(world: &mut World, dt_ms: f32, out: &mut Vec<GameEvent>) -> bool {
    let time_scale = dt_ms / FRAME_MS;
    let base_right = world.layout.base_right;
    let damage = world.tuning.base_damage_per_enemy;

    for enemy in world.enemies.iter_mut().filter(|e| !e.is_hit) {
        enemy.pos.x -= enemy.speed * time_scale;

        if enemy.pos.x <= base_right {
            enemy.defeat();
            world.base.apply_damage(damage);
            log::debug!("{} #{} reached the base", enemy.kind.name(), enemy.id);
            out.push(GameEvent::BaseImpact {
                id: enemy.id,
                pos: Vec2::new(base_right, enemy.pos.y),
                damage,
                health: world.base.health(),
            });
            out.push(GameEvent::HealthChanged(world.base.percent()));
            if world.base.is_destroyed() {
                return true;
            }
        } else if enemy.pos.x < ENEMY_EXIT_X {
            enemy.defeat();
            out.push(GameEvent::EnemyExpired { id: enemy.id });
        }
    }

    false
}

fn spawn_enemy(world: &mut World, out: &mut Vec<GameEvent>) {
    let kind = EnemyKind::pick(&mut world.rng);
    let size = kind.base_size() * (0.5 + world.rng.random::<f32>());
    let (band_top, band_height) = world.layout.spawn_band();
    let y = band_top + world.rng.random::<f32>() * band_height;
    let speed = enemy_speed(world.current_wave, &world.tuning) * (0.7 + world.rng.random::<f32>() * 0.6);

    let id = world.next_entity_id();
    let pos = Vec2::new(world.layout.width, y);
    world.enemies.push(Enemy::new(id, kind, pos, speed, size));
    out.push(GameEvent::EnemySpawned { id, kind, pos, size });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::world::{GameOverReason, Layout, SessionPhase};

    fn started() -> (World, WaveScheduler, Vec<GameEvent>) {
        let mut world = World::new(Layout::default(), Tuning::default(), 11);
        let mut waves = WaveScheduler::new();
        let mut events = Vec::new();
        assert!(waves.start_wave(&mut world, &mut events));
        (world, waves, events)
    }

    fn defeat_all(world: &mut World) {
        for enemy in &mut world.enemies {
            enemy.defeat();
        }
    }

    #[test]
    fn test_wave_formulas() {
        let t = Tuning::default();
        assert_eq!(enemy_count(1, &t), 5);
        assert_eq!(enemy_count(2, &t), 6);
        assert_eq!(enemy_count(3, &t), 7);
        assert_eq!(spawn_delay_ms(1, &t), 650.0);
        assert_eq!(spawn_delay_ms(20, &t), 200.0);
        assert!((enemy_speed(1, &t) - 0.62).abs() < 1e-6);
    }

    #[test]
    fn test_wave_one_spawns_five_on_cadence() {
        let (mut world, mut waves, mut events) = started();
        events.clear();

        waves.tick(&mut world, 649.0, &mut events);
        assert!(world.enemies.is_empty());

        waves.tick(&mut world, 1.0, &mut events);
        assert_eq!(world.enemies.len(), 1);

        for _ in 0..3 {
            waves.tick(&mut world, 650.0, &mut events);
        }
        assert_eq!(world.enemies.len(), 4);
        assert!(waves.is_spawning());

        waves.tick(&mut world, 650.0, &mut events);
        assert_eq!(world.enemies.len(), 5);
        assert_eq!(waves.phase(), WavePhase::Active);

        // Nothing more spawns
        waves.tick(&mut world, 5000.0, &mut events);
        let spawned = events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemySpawned { .. }))
            .count();
        assert_eq!(spawned, 5);
    }

    #[test]
    fn test_spawned_enemy_stats() {
        let (mut world, mut waves, mut events) = started();
        waves.tick(&mut world, 650.0, &mut events);
        let enemy = &world.enemies[0];
        let (top, height) = world.layout.spawn_band();
        assert!(enemy.pos.y >= top && enemy.pos.y <= top + height);
        assert!(enemy.size >= enemy.kind.base_size() * 0.5);
        assert!(enemy.size <= enemy.kind.base_size() * 1.5);
        assert_eq!(enemy.hit_points, (enemy.size * 2.0).ceil() as u32);
        let nominal = enemy_speed(1, &world.tuning);
        assert!(enemy.speed >= nominal * 0.7 - 1e-5 && enemy.speed <= nominal * 1.3 + 1e-5);
    }

    #[test]
    fn test_base_impact_costs_ten_health() {
        let (mut world, mut waves, mut events) = started();
        world.enemies.push(Enemy::new(
            99,
            EnemyKind::Seal,
            Vec2::new(world.layout.base_right + 1.0, 400.0),
            2.0,
            1.0,
        ));

        waves.tick(&mut world, FRAME_MS, &mut events);

        assert_eq!(world.base.health(), 90);
        assert!(world.enemies[0].is_hit);
        assert!(events.contains(&GameEvent::HealthChanged(90)));
        assert_eq!(world.score, 0);
    }

    #[test]
    fn test_base_destroyed_outcome() {
        let (mut world, mut waves, mut events) = started();
        world.base.apply_damage(90);
        world.enemies.push(Enemy::new(
            99,
            EnemyKind::Seal,
            Vec2::new(world.layout.base_right, 400.0),
            1.0,
            1.0,
        ));
        assert_eq!(
            waves.tick(&mut world, FRAME_MS, &mut events),
            WaveOutcome::BaseDestroyed
        );
        assert_eq!(world.base.health(), 0);
    }

    #[test]
    fn test_exit_left_marks_without_score() {
        let (mut world, mut waves, mut events) = started();
        world.layout.base_right = -1000.0;
        world.enemies.push(Enemy::new(7, EnemyKind::Swimmer, Vec2::new(-49.0, 400.0), 2.0, 1.0));
        waves.tick(&mut world, FRAME_MS, &mut events);
        assert!(world.enemies[0].is_hit);
        assert!(events.contains(&GameEvent::EnemyExpired { id: 7 }));
        assert_eq!(world.score, 0);
        assert_eq!(world.base.health(), 100);
    }

    #[test]
    fn test_next_wave_waits_for_spawning_and_clearance() {
        let (mut world, mut waves, mut events) = started();

        // Defeating early spawns does not finish a wave that is still spawning
        waves.tick(&mut world, 650.0, &mut events);
        defeat_all(&mut world);
        waves.tick(&mut world, 1.0, &mut events);
        assert!(world.wave_in_progress);
        assert!(waves.is_spawning());

        for _ in 0..4 {
            waves.tick(&mut world, 650.0, &mut events);
        }
        assert_eq!(waves.phase(), WavePhase::Active);
        waves.tick(&mut world, 1.0, &mut events);
        assert!(world.wave_in_progress);

        defeat_all(&mut world);
        waves.tick(&mut world, 1.0, &mut events);
        assert!(!world.wave_in_progress);
        assert!(matches!(waves.phase(), WavePhase::Complete { .. }));
        assert_eq!(world.current_wave, 1);

        waves.tick(&mut world, 2999.0, &mut events);
        assert_eq!(world.current_wave, 1);
        waves.tick(&mut world, 1.0, &mut events);
        assert_eq!(world.current_wave, 2);
        assert!(world.wave_in_progress);
        assert_eq!(world.enemies_in_wave, 6);
        assert!(world.enemies.is_empty());
        assert!(events.contains(&GameEvent::WaveStarted(2)));
    }

    #[test]
    fn test_start_wave_guarded() {
        let (mut world, mut waves, mut events) = started();
        assert!(!waves.start_wave(&mut world, &mut events));

        world.wave_in_progress = false;
        world.phase = SessionPhase::Ending {
            reason: GameOverReason::BaseDestroyed,
            remaining_ms: 100.0,
        };
        assert!(!waves.start_wave(&mut world, &mut events));
    }

    #[test]
    fn test_final_wave_reports_cleared() {
        let mut world = World::new(Layout::default(), Tuning::default(), 5);
        world.tuning.max_waves = Some(1);
        let mut waves = WaveScheduler::new();
        let mut events = Vec::new();
        waves.start_wave(&mut world, &mut events);

        waves.tick(&mut world, 650.0 * 5.0, &mut events);
        defeat_all(&mut world);
        assert_eq!(
            waves.tick(&mut world, 1.0, &mut events),
            WaveOutcome::AllWavesCleared
        );
    }

    #[test]
    fn test_limited_supply_refills_per_wave() {
        let mut world = World::new(Layout::default(), Tuning::default(), 5);
        world.tuning.limited_supply = true;
        let mut waves = WaveScheduler::new();
        let mut events = Vec::new();
        waves.start_wave(&mut world, &mut events);
        assert_eq!(world.projectiles_left, Some(5));
    }
}
