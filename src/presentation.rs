//! Presentation sink
//!
//! The simulation never touches the page. After each frame the session pushes
//! transforms and drained events through this trait; the browser build
//! implements it over the DOM, tests implement it with a recorder.

use glam::Vec2;

use crate::audio::{AudioSink, SoundKind};
use crate::sim::events::GameEvent;
use crate::sim::world::{EnemyKind, Facing};

/// View operations the core calls out to
pub trait Presentation {
    fn set_projectile_transform(&mut self, x: f32, y: f32, facing: Facing, opacity: f32);
    fn set_enemy_transform(&mut self, id: u32, x: f32, y: f32);
    fn show_explosion(&mut self, x: f32, y: f32);
    fn show_hit(&mut self, x: f32, y: f32, damage: u32);
    fn update_score_display(&mut self, score: u64);
    /// Health as a percentage
    fn update_health_bar(&mut self, pct: u32);
    fn update_wave_display(&mut self, wave: u32);
    fn show_game_over(&mut self, message: &str, score: u64, wave: u32);
    fn show_pause(&mut self);
    fn hide_pause(&mut self);

    // Optional flourishes

    fn spawn_enemy(&mut self, _id: u32, _kind: EnemyKind, _size: f32) {}
    fn hide_enemy(&mut self, _id: u32) {}
    /// `remaining` is the enemy's health fraction
    fn show_enemy_damage(&mut self, _id: u32, _remaining: f32) {}
    fn wobble_enemy(&mut self, _id: u32, _size: f32) {}
    fn show_sinking(&mut self, _x: f32, _y: f32) {}
    fn show_falling_trail(&mut self, _x: f32, _y: f32) {}
    fn show_base_damage(&mut self) {}
    fn clear_enemies(&mut self) {}
    /// Band endpoint while aiming; `None` returns the bands to rest
    fn set_slingshot_bands(&mut self, _pouch: Option<Vec2>) {}
    fn set_muted(&mut self, _muted: bool) {}
    fn hide_game_over(&mut self) {}
}

/// Route one simulation event to the view and audio sinks
pub fn dispatch<P, A>(event: &GameEvent, view: &mut P, audio: &mut A)
where
    P: Presentation + ?Sized,
    A: AudioSink + ?Sized,
{
    match *event {
        GameEvent::Stretch => audio.play(SoundKind::Stretch),
        GameEvent::Launched { .. } => audio.play(SoundKind::Launch),
        GameEvent::LaunchCancelled => {}
        GameEvent::EnemySpawned { id, kind, size, .. } => view.spawn_enemy(id, kind, size),
        GameEvent::EnemyDestroyed { id, pos, .. } => {
            view.show_explosion(pos.x, pos.y);
            view.hide_enemy(id);
            audio.play(SoundKind::Explosion);
        }
        GameEvent::EnemyDamaged {
            id,
            pos,
            damage,
            remaining,
        } => {
            view.show_hit(pos.x, pos.y, damage);
            view.show_enemy_damage(id, remaining);
            audio.play(SoundKind::Hit);
        }
        GameEvent::EnemyBounced { id, size } => view.wobble_enemy(id, size),
        GameEvent::EnemyExpired { id } => view.hide_enemy(id),
        GameEvent::BaseImpact { id, pos, .. } => {
            view.hide_enemy(id);
            view.show_explosion(pos.x, pos.y);
            view.show_base_damage();
            audio.play(SoundKind::Explosion);
        }
        GameEvent::ProjectileSinking { pos } => {
            view.show_sinking(pos.x, pos.y);
            audio.play(SoundKind::Sinking);
        }
        GameEvent::FallingTrail { pos } => view.show_falling_trail(pos.x, pos.y),
        GameEvent::ProjectileRemoved { .. } => {}
        GameEvent::ScoreChanged(score) => view.update_score_display(score),
        GameEvent::HealthChanged(health) => view.update_health_bar(health),
        GameEvent::WaveStarted(wave) => {
            view.clear_enemies();
            view.update_wave_display(wave);
        }
        GameEvent::WaveCleared(_) => {}
        GameEvent::Paused => view.show_pause(),
        GameEvent::Resumed => view.hide_pause(),
        GameEvent::GameOver {
            reason,
            score,
            wave,
        } => view.show_game_over(reason.message(), score, wave),
        GameEvent::Restarted => {
            view.hide_game_over();
            view.hide_pause();
            view.clear_enemies();
        }
        GameEvent::MuteToggled(muted) => {
            audio.set_muted(muted);
            view.set_muted(muted);
        }
    }
}
