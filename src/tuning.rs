//! Game balance and tuning
//!
//! Every gameplay constant the simulation reads lives here so a page can ship
//! a JSON document overriding any subset of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Why a tuning document was rejected
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`{field}` must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`{field}` must lie in [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("minimum spawn delay {min}ms exceeds base spawn delay {base}ms")]
    SpawnDelayOrder { min: f32, base: f32 },
    #[error("`max_waves` must be at least 1")]
    NoWaves,
}

/// Game tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Physics ===
    pub gravity: f32,
    pub bounce_factor: f32,
    pub min_rebound_speed: f32,
    pub friction: f32,
    pub projectile_radius: f32,
    pub ending_gravity_scale: f32,
    pub sink_line_offset: f32,
    pub sink_fade_radii: f32,
    pub max_frame_delta_ms: f32,

    // === Drag-to-launch ===
    pub elasticity: f32,
    pub max_drag: f32,
    pub max_drag_right: f32,
    pub min_pull: f32,
    pub power_divisor: f32,
    pub max_power: f32,
    pub min_launch_speed: f32,
    /// Press must land this close to the pouch to start a drag
    pub grab_radius: f32,

    // === Projectile cleanup ===
    pub reset_in_from_launch_ms: f32,
    pub max_slow_movement_ms: f32,
    pub fade_out_ms: f32,

    // === Enemies ===
    pub enemy_radius: f32,
    pub min_explosion_speed: f32,
    pub low_speed_bounce: f32,
    pub contact_bounce: f32,

    // === Waves ===
    pub enemies_base_count: u32,
    pub enemies_base_speed: f32,
    pub enemy_speed_per_wave: f32,
    pub base_spawn_delay_ms: f32,
    pub min_spawn_delay_ms: f32,
    pub spawn_delay_step_ms: f32,
    pub wave_intermission_ms: f32,
    /// Final wave; `None` keeps waves coming forever
    pub max_waves: Option<u32>,

    // === Session ===
    pub base_damage_per_enemy: u32,
    pub game_over_grace_ms: f32,
    /// One projectile per enemy each wave instead of an endless supply
    pub limited_supply: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            bounce_factor: BOUNCE_FACTOR,
            min_rebound_speed: MIN_REBOUND_SPEED,
            friction: FRICTION,
            projectile_radius: PROJECTILE_RADIUS,
            ending_gravity_scale: ENDING_GRAVITY_SCALE,
            sink_line_offset: SINK_LINE_OFFSET,
            sink_fade_radii: SINK_FADE_RADII,
            max_frame_delta_ms: MAX_FRAME_DELTA_MS,

            elasticity: ELASTICITY,
            max_drag: MAX_DRAG,
            max_drag_right: MAX_DRAG_RIGHT,
            min_pull: MIN_PULL,
            power_divisor: POWER_DIVISOR,
            max_power: MAX_POWER,
            min_launch_speed: MIN_LAUNCH_SPEED,
            grab_radius: PROJECTILE_RADIUS * 2.0,

            reset_in_from_launch_ms: RESET_IN_FROM_LAUNCH_MS,
            max_slow_movement_ms: MAX_SLOW_MOVEMENT_MS,
            fade_out_ms: FADE_OUT_MS,

            enemy_radius: ENEMY_RADIUS,
            min_explosion_speed: MIN_EXPLOSION_SPEED,
            low_speed_bounce: LOW_SPEED_BOUNCE,
            contact_bounce: CONTACT_BOUNCE,

            enemies_base_count: ENEMIES_BASE_COUNT,
            enemies_base_speed: ENEMIES_BASE_SPEED,
            enemy_speed_per_wave: ENEMY_SPEED_PER_WAVE,
            base_spawn_delay_ms: ENEMIES_BASE_SPAWN_DELAY_MS,
            min_spawn_delay_ms: ENEMIES_MIN_SPAWN_DELAY_MS,
            spawn_delay_step_ms: SPAWN_DELAY_STEP_MS,
            wave_intermission_ms: WAVE_INTERMISSION_MS,
            max_waves: None,

            base_damage_per_enemy: BASE_DAMAGE_PER_ENEMY,
            game_over_grace_ms: GAME_OVER_GRACE_MS,
            limited_supply: false,
        }
    }
}

impl Tuning {
    /// Parse a (partial) tuning document; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("projectile_radius", self.projectile_radius),
            ("enemy_radius", self.enemy_radius),
            ("elasticity", self.elasticity),
            ("power_divisor", self.power_divisor),
            ("max_drag", self.max_drag),
            ("min_launch_speed", self.min_launch_speed),
            ("min_explosion_speed", self.min_explosion_speed),
            ("min_spawn_delay_ms", self.min_spawn_delay_ms),
            ("max_frame_delta_ms", self.max_frame_delta_ms),
            ("fade_out_ms", self.fade_out_ms),
            ("sink_fade_radii", self.sink_fade_radii),
            ("grab_radius", self.grab_radius),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::NotPositive { field, value });
            }
        }

        let unit = [
            ("bounce_factor", self.bounce_factor),
            ("friction", self.friction),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::OutOfUnitRange { field, value });
            }
        }

        if self.min_spawn_delay_ms > self.base_spawn_delay_ms {
            return Err(TuningError::SpawnDelayOrder {
                min: self.min_spawn_delay_ms,
                base: self.base_spawn_delay_ms,
            });
        }

        if self.max_waves == Some(0) {
            return Err(TuningError::NoWaves);
        }

        Ok(())
    }

    /// Projectile diameter (size of its bounding square)
    pub fn projectile_diameter(&self) -> f32 {
        self.projectile_radius * 2.0
    }

    /// Load tuning from the game area's `data-tuning` attribute (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("game-area"))
            .and_then(|el| el.get_attribute("data-tuning"));

        match json {
            Some(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from page");
                    tuning
                }
                Err(e) => {
                    log::warn!("Ignoring tuning overrides: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
