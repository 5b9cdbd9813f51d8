//! Pyramid structure tiers.

use serde::{Deserialize, Serialize};

/// Validation tier of a pyramid multiblock structure.
/// Higher tiers require larger structures and provide greater multipliers.
///
/// Structure, centered on the core, layers below:
///
/// ```text
/// Tier 3 (full): 9×9 + 7×7 + 5×5 casing, 3×3 gold, core
/// Tier 2:        7×7 + 5×5 casing, 3×3 gold, core
/// Tier 1:        5×5 casing, 3×3 gold, core
/// None:          structure incomplete
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PyramidTier {
    /// Structure incomplete; no boost.
    None,
    /// Minimum complete structure.
    Tier1,
    /// Two casing layers.
    Tier2,
    /// Full pyramid.
    Tier3,
}

impl PyramidTier {
    /// All tiers in ascending order of structural completeness.
    pub const ALL: [PyramidTier; 4] = [
        PyramidTier::None,
        PyramidTier::Tier1,
        PyramidTier::Tier2,
        PyramidTier::Tier3,
    ];

    /// Boost multiplier granted to machines in range.
    pub fn multiplier(self) -> f32 {
        match self {
            PyramidTier::None => 1.0,
            PyramidTier::Tier1 => 4.0,
            PyramidTier::Tier2 => 8.0,
            PyramidTier::Tier3 => 16.0,
        }
    }

    /// Block radius within which the boost is broadcast.
    pub fn boost_range(self) -> i32 {
        match self {
            PyramidTier::None => 0,
            PyramidTier::Tier1 => 32,
            PyramidTier::Tier2 => 48,
            PyramidTier::Tier3 => 64,
        }
    }
}
