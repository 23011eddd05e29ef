//! Base health

use serde::{Deserialize, Serialize};

use crate::consts::BASE_MAX_HEALTH;

/// Health of the defended base, always within [0, max]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseHealth {
    current: u32,
    max: u32,
}

impl Default for BaseHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseHealth {
    pub fn new() -> Self {
        Self::with_max(BASE_MAX_HEALTH)
    }

    pub fn with_max(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn health(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Subtract damage, clamping at zero. Returns true once the base is destroyed.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.current = self.current.saturating_sub(amount);
        self.is_destroyed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.current == 0
    }

    /// Remaining health as a percentage for the health bar
    pub fn percent(&self) -> u32 {
        if self.max == 0 {
            return 0;
        }
        self.current * 100 / self.max
    }

    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_damage_reduces_health() {
        let mut base = BaseHealth::new();
        assert!(!base.apply_damage(10));
        assert_eq!(base.health(), 90);
        assert_eq!(base.percent(), 90);
    }

    #[test]
    fn test_overkill_clamps_at_zero() {
        let mut base = BaseHealth::new();
        base.apply_damage(95);
        assert!(base.apply_damage(10));
        assert_eq!(base.health(), 0);
        assert!(base.is_destroyed());
    }

    #[test]
    fn test_reset_restores_max() {
        let mut base = BaseHealth::with_max(50);
        base.apply_damage(50);
        base.reset();
        assert_eq!(base.health(), 50);
        assert_eq!(base.percent(), 100);
    }

    proptest! {
        #[test]
        fn health_stays_in_range_and_never_increases(hits in prop::collection::vec(0u32..200, 0..40)) {
            let mut base = BaseHealth::new();
            let mut last = base.health();
            for hit in hits {
                base.apply_damage(hit);
                prop_assert!(base.health() <= base.max());
                prop_assert!(base.health() <= last);
                last = base.health();
            }
        }
    }
}
