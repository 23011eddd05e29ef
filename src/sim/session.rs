//! Session controller
//!
//! Owns the world and drives two independently clocked loops: projectile
//! physics (only while something is in flight) and the wave/enemy simulation.
//! The host calls `physics_frame` and `game_frame` from its frame scheduler
//! and keeps rescheduling each one while it returns [`LoopControl::Continue`].
//! Pausing keeps both loops scheduled but frozen.

use glam::Vec2;

use super::events::GameEvent;
use super::input::InputController;
use super::physics::{self, StepOutcome};
use super::waves::{WaveOutcome, WavePhase, WaveScheduler};
use super::world::{Facing, GameOverReason, Layout, Projectile, SessionPhase, World};
use crate::audio::AudioSink;
use crate::presentation::{Presentation, dispatch};
use crate::tuning::Tuning;

/// Whether a frame loop wants to be scheduled again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Reference timestamp for one loop
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    running: bool,
    last: f64,
}

impl FrameClock {
    pub fn start(&mut self, now: f64) {
        self.running = true;
        self.last = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Forget the time spent paused
    pub fn rebase(&mut self, now: f64) {
        if self.running {
            self.last = now;
        }
    }

    /// Milliseconds since the previous frame, clamped to `max_delta_ms`
    pub fn advance(&mut self, timestamp: f64, max_delta_ms: f32) -> f32 {
        let delta = (timestamp - self.last).max(0.0) as f32;
        self.last = timestamp;
        delta.min(max_delta_ms)
    }
}

pub struct Session {
    world: World,
    input: InputController,
    waves: WaveScheduler,
    physics_clock: FrameClock,
    game_clock: FrameClock,
    events: Vec<GameEvent>,
    muted: bool,
    disposed: bool,
}

impl Session {
    /// Create a session and start wave 1
    pub fn new(layout: Layout, tuning: Tuning, seed: u64, now: f64) -> Self {
        let mut session = Self {
            world: World::new(layout, tuning, seed),
            input: InputController::new(),
            waves: WaveScheduler::new(),
            physics_clock: FrameClock::default(),
            game_clock: FrameClock::default(),
            events: Vec::new(),
            muted: false,
            disposed: false,
        };
        log::info!("Session started (seed {})", seed);
        session.begin(now);
        session
    }

    fn begin(&mut self, now: f64) {
        self.events.push(GameEvent::ScoreChanged(self.world.score));
        self.events.push(GameEvent::HealthChanged(self.world.base.percent()));
        self.waves.start_wave(&mut self.world, &mut self.events);
        self.game_clock.start(now);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn wave_phase(&self) -> WavePhase {
        self.waves.phase()
    }

    pub fn is_paused(&self) -> bool {
        self.world.paused
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn physics_running(&self) -> bool {
        self.physics_clock.is_running()
    }

    pub fn game_running(&self) -> bool {
        self.game_clock.is_running()
    }

    /// Clamped drag vector while aiming
    pub fn aim(&self) -> Option<Vec2> {
        self.input.aim()
    }

    // === Input ===

    /// Pointer went down; returns true if a drag started
    pub fn press(&mut self, pointer: Vec2) -> bool {
        !self.disposed && self.input.press(&self.world, pointer)
    }

    pub fn drag(&mut self, pointer: Vec2, now: f64) {
        if self.disposed {
            return;
        }
        self.input.drag(&self.world, pointer, now, &mut self.events);
    }

    /// Pointer went up; returns true if the projectile was launched
    pub fn release(&mut self, pointer: Vec2, now: f64) -> bool {
        if self.disposed {
            return false;
        }
        let Some(launch) = self.input.release(&self.world, pointer, &mut self.events) else {
            return false;
        };

        self.world.projectile = Some(Projectile::launch(launch.origin, launch.velocity));
        if let Some(left) = self.world.projectiles_left.as_mut() {
            *left = left.saturating_sub(1);
        }
        self.physics_clock.start(now);
        log::info!(
            "Launched from ({:.1}, {:.1}) at ({:.1}, {:.1}), {} left",
            launch.origin.x,
            launch.origin.y,
            launch.velocity.x,
            launch.velocity.y,
            self.world
                .projectiles_left
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        );
        true
    }

    // === Frame loops ===

    /// One frame of projectile physics
    pub fn physics_frame(&mut self, timestamp: f64) -> LoopControl {
        if !self.physics_clock.is_running() {
            return LoopControl::Stop;
        }
        if self.world.paused {
            return LoopControl::Continue;
        }

        let dt = self
            .physics_clock
            .advance(timestamp, self.world.tuning.max_frame_delta_ms);
        match physics::step(&mut self.world, dt, &mut self.events) {
            StepOutcome::Continue => LoopControl::Continue,
            StepOutcome::Idle => {
                self.physics_clock.stop();
                LoopControl::Stop
            }
            StepOutcome::Removed(reason) => {
                self.physics_clock.stop();
                self.events.push(GameEvent::ProjectileRemoved { reason });
                self.next_projectile();
                LoopControl::Stop
            }
        }
    }

    /// One frame of the wave/enemy simulation
    pub fn game_frame(&mut self, timestamp: f64) -> LoopControl {
        if !self.game_clock.is_running() {
            return LoopControl::Stop;
        }
        if self.world.paused {
            return LoopControl::Continue;
        }

        let dt = self
            .game_clock
            .advance(timestamp, self.world.tuning.max_frame_delta_ms);
        match self.world.phase {
            SessionPhase::Playing => match self.waves.tick(&mut self.world, dt, &mut self.events) {
                WaveOutcome::Continue => {}
                WaveOutcome::BaseDestroyed => self.begin_ending(GameOverReason::BaseDestroyed),
                WaveOutcome::AllWavesCleared => self.begin_ending(GameOverReason::AllWavesCleared),
            },
            SessionPhase::Ending {
                reason,
                remaining_ms,
            } => {
                let left = remaining_ms - dt;
                if left <= 0.0 {
                    self.finish(reason);
                    return LoopControl::Stop;
                }
                self.world.phase = SessionPhase::Ending {
                    reason,
                    remaining_ms: left,
                };
            }
            SessionPhase::Over { .. } => {
                self.game_clock.stop();
                return LoopControl::Stop;
            }
        }
        LoopControl::Continue
    }

    /// Re-arm the slingshot after a removal. Safe to call repeatedly.
    fn next_projectile(&mut self) {
        if self.world.projectile.is_some() || self.world.is_game_over() {
            return;
        }
        if self.world.projectiles_left == Some(0) && self.waves.enemies_remaining(&self.world) {
            self.begin_ending(GameOverReason::OutOfProjectiles);
        }
    }

    fn begin_ending(&mut self, reason: GameOverReason) {
        if self.world.is_game_over() {
            return;
        }
        log::info!(
            "{} Wave {}, score {}",
            reason.message(),
            self.world.current_wave,
            self.world.score
        );
        self.world.phase = SessionPhase::Ending {
            reason,
            remaining_ms: self.world.tuning.game_over_grace_ms,
        };
        self.input.cancel();
    }

    fn finish(&mut self, reason: GameOverReason) {
        self.world.phase = SessionPhase::Over { reason };
        self.physics_clock.stop();
        self.game_clock.stop();
        self.events.push(GameEvent::GameOver {
            reason,
            score: self.world.score,
            wave: self.world.current_wave,
        });
    }

    // === Commands ===

    /// Freeze both loops. No-op once the game is over or already paused.
    pub fn pause(&mut self) {
        if self.world.paused || self.world.is_game_over() {
            return;
        }
        self.world.paused = true;
        self.input.cancel();
        self.events.push(GameEvent::Paused);
    }

    pub fn resume(&mut self, now: f64) {
        if !self.world.paused {
            return;
        }
        self.world.paused = false;
        self.physics_clock.rebase(now);
        self.game_clock.rebase(now);
        self.events.push(GameEvent::Resumed);
    }

    /// Throw the world away and start again from wave 1
    pub fn restart(&mut self, now: f64) {
        let seed = self
            .world
            .seed
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        self.world.reset(seed);
        self.input.cancel();
        self.waves.reset();
        self.physics_clock.stop();
        self.disposed = false;
        log::info!("Session restarted (seed {})", seed);
        self.events.push(GameEvent::Restarted);
        self.begin(now);
    }

    /// Flip mute; returns the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.events.push(GameEvent::MuteToggled(self.muted));
        self.muted
    }

    /// New screen geometry; simulation values are kept
    pub fn resize(&mut self, layout: Layout) {
        log::debug!("Resized to {}x{}", layout.width, layout.height);
        self.world.layout = layout;
    }

    /// Stop both loops for good
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.physics_clock.stop();
        self.game_clock.stop();
        self.input.cancel();
        self.events.clear();
    }

    // === Output ===

    /// Flush pending events and current transforms to the sinks
    pub fn present<P, A>(&mut self, view: &mut P, audio: &mut A)
    where
        P: Presentation + ?Sized,
        A: AudioSink + ?Sized,
    {
        for event in self.events.drain(..) {
            dispatch(&event, view, audio);
        }

        match &self.world.projectile {
            Some(p) => {
                view.set_projectile_transform(p.pos.x, p.pos.y, p.facing, p.opacity);
                view.set_slingshot_bands(None);
            }
            None => {
                let aim = self.input.aim();
                let pos = self.world.rest_position() + aim.unwrap_or(Vec2::ZERO);
                view.set_projectile_transform(pos.x, pos.y, Facing::Right, 1.0);
                view.set_slingshot_bands(aim.map(|a| self.world.layout.anchor + a));
            }
        }

        for enemy in self.world.enemies.iter().filter(|e| !e.is_hit) {
            view.set_enemy_transform(enemy.id, enemy.pos.x, enemy.pos.y);
        }
    }

    /// Events not yet presented
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::presentation::recording::{RecordingAudio, RecordingView};
    use crate::sim::world::{Enemy, EnemyKind};

    fn session() -> Session {
        Session::new(Layout::default(), Tuning::default(), 42, 0.0)
    }

    fn launch(session: &mut Session, now: f64) {
        let anchor = session.world.layout.anchor;
        assert!(session.press(anchor));
        assert!(session.release(anchor + Vec2::new(-100.0, 50.0), now));
    }

    /// Run the game loop in 100ms frames until it stops
    fn run_game_until_stop(session: &mut Session, mut t: f64) -> f64 {
        for _ in 0..1000 {
            t += 100.0;
            if session.game_frame(t) == LoopControl::Stop {
                break;
            }
        }
        t
    }

    #[test]
    fn test_clock_clamps_delta() {
        let mut clock = FrameClock::default();
        clock.start(0.0);
        assert_eq!(clock.advance(16.0, 100.0), 16.0);
        assert_eq!(clock.advance(5016.0, 100.0), 100.0);
        assert_eq!(clock.advance(5000.0, 100.0), 0.0);
    }

    #[test]
    fn test_new_session_starts_wave_one() {
        let session = session();
        assert_eq!(session.world.current_wave, 1);
        assert!(session.world.wave_in_progress);
        assert!(session.game_running());
        assert!(!session.physics_running());
        assert!(session.pending_events().contains(&GameEvent::WaveStarted(1)));
    }

    #[test]
    fn test_pause_twice_same_as_once() {
        let mut session = session();
        session.pause();
        session.pause();
        assert!(session.is_paused());
        let paused = session
            .pending_events()
            .iter()
            .filter(|e| **e == GameEvent::Paused)
            .count();
        assert_eq!(paused, 1);

        session.resume(10.0);
        session.resume(20.0);
        assert!(!session.is_paused());
    }

    #[test]
    fn test_paused_game_loop_does_not_advance() {
        let mut session = session();
        session.pause();
        assert_eq!(session.game_frame(5000.0), LoopControl::Continue);
        assert!(session.world.enemies.is_empty());

        session.resume(5000.0);
        session.game_frame(5000.0 + FRAME_MS as f64);
        // Only one frame elapsed since resume: nothing spawned yet
        assert!(session.world.enemies.is_empty());
    }

    #[test]
    fn test_resume_rebases_physics_clock() {
        let mut session = session();
        launch(&mut session, 0.0);
        let start = session.world.projectile.as_ref().unwrap().pos;

        session.pause();
        assert_eq!(session.physics_frame(50_000.0), LoopControl::Continue);
        assert_eq!(session.world.projectile.as_ref().unwrap().pos, start);

        session.resume(50_000.0);
        session.physics_frame(50_000.0 + FRAME_MS as f64);
        let p = session.world.projectile.as_ref().unwrap();
        // Exactly one normalized frame of motion
        assert!((p.pos.x - start.x).abs() < 20.0);
        assert!(p.airtime_ms <= FRAME_MS);
    }

    #[test]
    fn test_removal_rearms_slingshot() {
        let mut session = session();
        launch(&mut session, 0.0);
        assert!(session.physics_running());
        assert!(!session.press(session.world.layout.anchor));

        let mut stopped = false;
        for i in 1..200 {
            if session.physics_frame(i as f64 * FRAME_MS as f64) == LoopControl::Stop {
                stopped = true;
                break;
            }
        }
        assert!(stopped);
        assert!(session.world.projectile.is_none());
        assert!(!session.physics_running());
        assert!(session.press(session.world.layout.anchor));
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut session = session();
        session.world.score = 1234;
        session.world.current_wave = 3;
        session.world.base.apply_damage(40);
        session.pause();

        session.restart(100.0);

        assert_eq!(session.world.score, 0);
        assert_eq!(session.world.base.health(), 100);
        assert_eq!(session.world.current_wave, 1);
        assert!(session.world.wave_in_progress);
        assert!(!session.is_paused());
        assert!(session.game_running());
    }

    #[test]
    fn test_base_destroyed_ends_after_grace() {
        let mut session = session();
        session.world.base.apply_damage(90);
        let base_right = session.world.layout.base_right;
        session
            .world
            .enemies
            .push(Enemy::new(99, EnemyKind::Shark, Vec2::new(base_right + 1.0, 420.0), 2.0, 1.0));

        assert_eq!(session.game_frame(FRAME_MS as f64), LoopControl::Continue);
        assert!(session.world.is_ending());
        // Pausing is refused once defeat is reached
        session.pause();
        assert!(!session.is_paused());

        run_game_until_stop(&mut session, FRAME_MS as f64);
        assert!(matches!(
            session.world.phase,
            SessionPhase::Over {
                reason: GameOverReason::BaseDestroyed
            }
        ));
        assert!(!session.game_running());

        let mut view = RecordingView::default();
        let mut audio = RecordingAudio::default();
        session.present(&mut view, &mut audio);
        assert_eq!(view.health, Some(0));
        assert_eq!(
            view.game_over,
            Some(("Base Destroyed!".to_string(), 0, 1))
        );
    }

    #[test]
    fn test_running_out_of_projectiles_is_game_over() {
        let mut tuning = Tuning::default();
        tuning.limited_supply = true;
        let mut session = Session::new(Layout::default(), tuning, 7, 0.0);
        assert_eq!(session.world.projectiles_left, Some(5));
        session.world.projectiles_left = Some(1);

        launch(&mut session, 0.0);
        assert_eq!(session.world.projectiles_left, Some(0));
        for i in 1..200 {
            if session.physics_frame(i as f64 * FRAME_MS as f64) == LoopControl::Stop {
                break;
            }
        }
        assert!(session.world.is_ending());
        assert!(!session.press(session.world.layout.anchor));

        run_game_until_stop(&mut session, 0.0);
        let mut view = RecordingView::default();
        let mut audio = RecordingAudio::default();
        session.present(&mut view, &mut audio);
        assert_eq!(view.game_over.map(|g| g.0), Some("Game Over!".to_string()));
    }

    #[test]
    fn test_present_shows_aim() {
        let mut session = session();
        let anchor = session.world.layout.anchor;
        session.press(anchor);
        session.drag(anchor + Vec2::new(-60.0, 20.0), 500.0);

        let mut view = RecordingView::default();
        let mut audio = RecordingAudio::default();
        session.present(&mut view, &mut audio);

        assert_eq!(view.bands, Some(anchor + Vec2::new(-60.0, 20.0)));
        let (x, y, _, opacity) = view.projectile.unwrap();
        assert_eq!(Vec2::new(x, y), anchor + Vec2::new(-80.0, 0.0));
        assert_eq!(opacity, 1.0);
        assert_eq!(audio.played, vec![crate::audio::SoundKind::Stretch]);
        assert_eq!(view.wave, Some(1));
        assert!(session.pending_events().is_empty());
    }

    #[test]
    fn test_mute_toggle_and_dispose() {
        let mut session = session();
        assert!(session.toggle_mute());
        assert!(!session.toggle_mute());

        session.dispose();
        assert!(!session.game_running());
        assert_eq!(session.game_frame(1000.0), LoopControl::Stop);
        assert!(!session.press(session.world.layout.anchor));
    }

    #[test]
    fn test_resize_keeps_progress() {
        let mut session = session();
        session.world.score = 500;
        let layout = Layout {
            width: 1400.0,
            ..Layout::default()
        };
        session.resize(layout);
        assert_eq!(session.world.layout.width, 1400.0);
        assert_eq!(session.world.score, 500);
    }
}
