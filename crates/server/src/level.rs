//! Level tiers and the effective-radius rule.
//!
//! A tier is a `[min, max)` size range. When a player changes tier its
//! `level_entry_size` is reset to the size it had on arrival, which makes
//! every player enter a tier at exactly `base_radius`.

use serde::{Deserialize, Serialize};

/// Smallest effective radius a player can be drawn or collide at.
pub const MIN_EFFECTIVE_RADIUS: f32 = 4.0;

/// A half-open size range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SizeBand {
    pub min: f32,
    pub max: f32,
}

impl SizeBand {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, size: f32) -> bool {
        size >= self.min && size < self.max
    }

    pub fn overlaps(&self, other: &SizeBand) -> bool {
        self.min < other.max && other.min < self.max
    }
}

/// One configured level tier.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LevelBand {
    pub key: String,
    pub min: f32,
    pub max: f32,
}

impl LevelBand {
    pub fn band(&self) -> SizeBand {
        SizeBand::new(self.min, self.max)
    }
}

/// Tier table plus the sizing constants every component derives radii from.
#[derive(Debug, Clone)]
pub struct Tiers {
    bands: Vec<LevelBand>,
    /// Radius a player has on entering any tier.
    pub base_radius: f32,
    /// Floor applied to every size change.
    pub min_size: f32,
}

impl Tiers {
    /// Build a tier table. `bands` must be sorted and contiguous (checked by
    /// config validation).
    pub fn new(bands: Vec<LevelBand>, base_radius: f32, min_size: f32) -> Self {
        Self {
            bands,
            base_radius,
            min_size,
        }
    }

    /// Index of the tier containing `size`. Sizes past the last tier map to
    /// the last tier, sizes below the first map to the first.
    pub fn tier_of(&self, size: f32) -> usize {
        match self.bands.iter().position(|b| b.band().contains(size)) {
            Some(idx) => idx,
            None if self.bands.first().is_some_and(|b| size < b.min) => 0,
            None => self.bands.len().saturating_sub(1),
        }
    }

    /// Level key of a tier index (empty if the table is empty).
    pub fn key(&self, tier: usize) -> &str {
        self.bands.get(tier).map(|b| b.key.as_str()).unwrap_or("")
    }

    /// `base_radius + (size - level_entry_size)`, floored.
    #[inline]
    pub fn effective_radius(&self, size: f32, level_entry_size: f32) -> f32 {
        (self.base_radius + (size - level_entry_size)).max(MIN_EFFECTIVE_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Tiers {
        Tiers::new(
            vec![
                LevelBand { key: "asteroid".into(), min: 0.0, max: 40.0 },
                LevelBand { key: "planet".into(), min: 40.0, max: 100.0 },
                LevelBand { key: "star".into(), min: 100.0, max: f32::MAX },
            ],
            20.0,
            5.0,
        )
    }

    #[test]
    fn test_tier_lookup() {
        let t = tiers();
        assert_eq!(t.tier_of(39.9), 0);
        assert_eq!(t.tier_of(40.0), 1);
        assert_eq!(t.tier_of(250.0), 2);
        assert_eq!(t.key(1), "planet");
    }

    #[test]
    fn test_effective_radius() {
        let t = tiers();
        assert_eq!(t.effective_radius(20.0, 20.0), 20.0);
        assert_eq!(t.effective_radius(55.0, 40.5), 34.5);
        assert_eq!(t.effective_radius(10.0, 80.0), MIN_EFFECTIVE_RADIUS);
    }

    #[test]
    fn test_band_overlap() {
        let a = SizeBand::new(100.0, 250.0);
        assert!(a.contains(100.0));
        assert!(!a.contains(250.0));
        assert!(!a.overlaps(&SizeBand::new(250.0, 600.0)));
        assert!(a.overlaps(&SizeBand::new(200.0, 300.0)));
    }
}
