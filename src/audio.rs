//! Sound cues
//!
//! The simulation only names a cue; playback is fire-and-forget. In the
//! browser each cue maps to a pair of `<audio>` elements on the page
//! (`{cue}-sound-1`, `{cue}-sound-2`) and one of them is picked at random.

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// Slingshot band stretching
    Stretch,
    /// Projectile released
    Launch,
    /// Enemy sunk or base hit
    Explosion,
    /// Enemy damaged
    Hit,
    /// Projectile sinking in the water
    Sinking,
}

impl SoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundKind::Stretch => "stretch",
            SoundKind::Launch => "launch",
            SoundKind::Explosion => "explosion",
            SoundKind::Hit => "hit",
            SoundKind::Sinking => "sinking",
        }
    }
}

/// Anything that can play cues
pub trait AudioSink {
    fn play(&mut self, kind: SoundKind);
    fn set_muted(&mut self, muted: bool);
}

/// Sink that only logs; used by the native build
#[derive(Debug, Default)]
pub struct LogAudio {
    muted: bool,
    pub played: usize,
}

impl AudioSink for LogAudio {
    fn play(&mut self, kind: SoundKind) {
        if self.muted {
            return;
        }
        self.played += 1;
        log::trace!("sound: {}", kind.as_str());
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, HtmlAudioElement};

    use super::{AudioSink, SoundKind};

    /// Number of recorded variants per cue
    const VARIANTS: u32 = 2;

    /// Plays cues through `<audio>` elements already present on the page
    pub struct AudioManager {
        document: Option<Document>,
        rng: Pcg32,
        volume: f32,
        muted: bool,
    }

    impl AudioManager {
        pub fn new(seed: u64) -> Self {
            let document = web_sys::window().and_then(|w| w.document());
            if document.is_none() {
                log::warn!("No document available - audio disabled");
            }
            Self {
                document,
                rng: Pcg32::seed_from_u64(seed),
                volume: 0.8,
                muted: false,
            }
        }

        /// Set volume (0.0 - 1.0)
        pub fn set_volume(&mut self, vol: f32) {
            self.volume = vol.clamp(0.0, 1.0);
        }

        fn element(&mut self, kind: SoundKind) -> Option<HtmlAudioElement> {
            let document = self.document.as_ref()?;
            let variant = self.rng.random_range(1..=VARIANTS);
            let id = format!("{}-sound-{}", kind.as_str(), variant);
            match document.get_element_by_id(&id) {
                Some(el) => el.dyn_into::<HtmlAudioElement>().ok(),
                None => {
                    log::warn!("Missing audio cue #{}", id);
                    None
                }
            }
        }
    }

    impl AudioSink for AudioManager {
        fn play(&mut self, kind: SoundKind) {
            if self.muted || self.volume <= 0.0 {
                return;
            }
            let Some(audio) = self.element(kind) else {
                return;
            };
            audio.set_volume(self.volume as f64);
            audio.set_current_time(0.0);
            // Rejected until the first user gesture
            let _ = audio.play();
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }
    }
}
