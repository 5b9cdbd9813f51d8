//! Pyramid multiblock validation.
//!
//! A pyramid is a stack of square layers below a core block:
//!
//! ```text
//! Layer -1: 3×3 gold blocks
//! Layer -2: 5×5 pyramid casing  (Tier 1 minimum)
//! Layer -3: 7×7 pyramid casing  (Tier 2 minimum)
//! Layer -4: 9×9 pyramid casing  (Tier 3 minimum)
//! ```
//!
//! Validation is fail-fast on the first mismatched cell, never loads
//! terrain (unloaded cells count as absent), and touches at most
//! 3×3 + 5×5 + 7×7 + 9×9 = 164 cells. Callers are expected to validate on
//! structure-change events, never every tick.

use crate::block::{BlockMatcher, BLOCK_GOLD, CASING_BLOCKS};
use crate::tier::PyramidTier;
use crate::{BlockPos, WorldQuery};

/// One horizontal square of required blocks at a fixed offset below the core.
#[derive(Debug, Clone, Copy)]
pub struct LayerSpec {
    /// Vertical offset from the core (negative = below).
    pub y_offset: i32,
    /// Half-width of the square (1 = 3×3, 2 = 5×5, ...).
    pub radius: i32,
    /// Block identity every cell of the layer must satisfy.
    pub material: BlockMatcher,
}

/// The pyramid layers in check order: gold base first, then expanding casing.
pub const PYRAMID_LAYERS: [LayerSpec; 4] = [
    LayerSpec {
        y_offset: -1,
        radius: 1,
        material: BlockMatcher::Exact(BLOCK_GOLD),
    },
    LayerSpec {
        y_offset: -2,
        radius: 2,
        material: BlockMatcher::AnyOf(CASING_BLOCKS),
    },
    LayerSpec {
        y_offset: -3,
        radius: 3,
        material: BlockMatcher::AnyOf(CASING_BLOCKS),
    },
    LayerSpec {
        y_offset: -4,
        radius: 4,
        material: BlockMatcher::AnyOf(CASING_BLOCKS),
    },
];

/// Upper bound on cells a single validation can touch (3×3 + 5×5 + 7×7 + 9×9).
pub const MAX_SCAN_CELLS: usize = 164;

/// Validate the pyramid structure and return the highest achieved tier.
///
/// Checks layers bottom-up from the core: gold base first, then expanding
/// casing layers. The gold base alone grants nothing; the first casing layer
/// is required for the minimum tier. A `None` world (the host may ask before
/// any world is attached) yields [`PyramidTier::None`].
pub fn validate<W: WorldQuery>(world: Option<&W>, core_pos: BlockPos) -> PyramidTier {
    let Some(world) = world else {
        return PyramidTier::None;
    };

    // Gold base is always required (layer -1: 3×3).
    if !check_layer(world, core_pos, &PYRAMID_LAYERS[0]) {
        return PyramidTier::None;
    }

    // Tier 1: 5×5 casing at layer -2.
    if !check_layer(world, core_pos, &PYRAMID_LAYERS[1]) {
        return PyramidTier::None;
    }

    // Tier 2: 7×7 casing at layer -3.
    if !check_layer(world, core_pos, &PYRAMID_LAYERS[2]) {
        return PyramidTier::Tier1;
    }

    // Tier 3: 9×9 casing at layer -4.
    if !check_layer(world, core_pos, &PYRAMID_LAYERS[3]) {
        return PyramidTier::Tier2;
    }

    PyramidTier::Tier3
}

/// Check a square layer of blocks below the core.
///
/// Cells are visited row-major (x outer, z inner) so failures reproduce
/// deterministically. An unloaded cell fails the layer immediately; terrain
/// is never loaded on a validation's behalf.
fn check_layer<W: WorldQuery>(world: &W, center: BlockPos, spec: &LayerSpec) -> bool {
    for dx in -spec.radius..=spec.radius {
        for dz in -spec.radius..=spec.radius {
            let pos = center.offset(dx, spec.y_offset, dz);
            if !world.is_loaded(pos) {
                return false;
            }
            if !spec.material.matches(world.block_at(pos)) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{
        BlockId, BLOCK_AIR, BLOCK_CHISELED_PYRAMID_CASING, BLOCK_PYRAMID_CASING, BLOCK_STONE,
    };
    use std::collections::{BTreeMap, BTreeSet};

    /// Minimal in-memory grid: absent positions are loaded air.
    #[derive(Default)]
    struct FakeGrid {
        blocks: BTreeMap<BlockPos, BlockId>,
        unloaded: BTreeSet<BlockPos>,
    }

    impl FakeGrid {
        fn set(&mut self, pos: BlockPos, id: BlockId) {
            self.blocks.insert(pos, id);
        }

        fn fill_layer(&mut self, core: BlockPos, y_offset: i32, radius: i32, id: BlockId) {
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    self.set(core.offset(dx, y_offset, dz), id);
                }
            }
        }

        fn mark_unloaded(&mut self, pos: BlockPos) {
            self.unloaded.insert(pos);
        }
    }

    impl WorldQuery for FakeGrid {
        fn is_loaded(&self, pos: BlockPos) -> bool {
            !self.unloaded.contains(&pos)
        }

        fn block_at(&self, pos: BlockPos) -> BlockId {
            if self.unloaded.contains(&pos) {
                return BLOCK_AIR;
            }
            self.blocks.get(&pos).copied().unwrap_or(BLOCK_AIR)
        }
    }

    const CORE: BlockPos = BlockPos::new(0, 64, 0);

    fn pyramid_up_to(layers: usize) -> FakeGrid {
        let mut grid = FakeGrid::default();
        for (i, spec) in PYRAMID_LAYERS.iter().enumerate().take(layers) {
            let id = if i == 0 { BLOCK_GOLD } else { BLOCK_PYRAMID_CASING };
            grid.fill_layer(CORE, spec.y_offset, spec.radius, id);
        }
        grid
    }

    #[test]
    fn absent_world_yields_no_tier() {
        assert_eq!(validate::<FakeGrid>(None, CORE), PyramidTier::None);
    }

    #[test]
    fn empty_world_yields_no_tier() {
        let grid = FakeGrid::default();
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::None);
    }

    #[test]
    fn gold_base_alone_grants_nothing() {
        let grid = pyramid_up_to(1);
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::None);
    }

    #[test]
    fn complete_tiers_classify_in_order() {
        assert_eq!(validate(Some(&pyramid_up_to(2)), CORE), PyramidTier::Tier1);
        assert_eq!(validate(Some(&pyramid_up_to(3)), CORE), PyramidTier::Tier2);
        assert_eq!(validate(Some(&pyramid_up_to(4)), CORE), PyramidTier::Tier3);
    }

    #[test]
    fn one_wrong_block_in_seven_by_seven_caps_at_tier_one() {
        // Scenario: gold and 5×5 present, 7×7 broken by a single block.
        let mut grid = pyramid_up_to(4);
        grid.set(CORE.offset(3, -3, -2), BLOCK_STONE);
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::Tier1);
    }

    #[test]
    fn one_unloaded_cell_in_nine_by_nine_caps_at_tier_two() {
        let mut grid = pyramid_up_to(4);
        grid.mark_unloaded(CORE.offset(-4, -4, 4));
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::Tier2);
    }

    #[test]
    fn one_non_gold_block_in_base_yields_no_tier() {
        let mut grid = pyramid_up_to(4);
        grid.set(CORE.offset(0, -1, 1), BLOCK_PYRAMID_CASING);
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::None);
    }

    #[test]
    fn unloaded_gold_cell_yields_no_tier() {
        let mut grid = pyramid_up_to(4);
        grid.mark_unloaded(CORE.offset(1, -1, -1));
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::None);
    }

    #[test]
    fn broken_five_by_five_is_never_rescued_by_deeper_layers() {
        // 7×7 and 9×9 fully present, 5×5 broken: classification must be None.
        let mut grid = pyramid_up_to(4);
        grid.set(CORE.offset(-2, -2, 0), BLOCK_AIR);
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::None);
    }

    #[test]
    fn chiseled_casing_counts_as_casing() {
        let mut grid = pyramid_up_to(4);
        grid.set(CORE.offset(2, -2, 2), BLOCK_CHISELED_PYRAMID_CASING);
        grid.set(CORE.offset(-4, -4, 0), BLOCK_CHISELED_PYRAMID_CASING);
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::Tier3);
    }

    #[test]
    fn chiseled_gold_substitute_is_rejected() {
        // Variants are accepted in casing layers only, never in the gold base.
        let mut grid = pyramid_up_to(4);
        grid.set(CORE.offset(0, -1, 0), BLOCK_CHISELED_PYRAMID_CASING);
        assert_eq!(validate(Some(&grid), CORE), PyramidTier::None);
    }

    #[test]
    fn full_tier_three_carries_full_table_values() {
        let grid = pyramid_up_to(4);
        let tier = validate(Some(&grid), CORE);
        assert_eq!(tier, PyramidTier::Tier3);
        assert_eq!(tier.multiplier(), 16.0);
        assert_eq!(tier.boost_range(), 64);
    }

    #[test]
    fn layer_cell_counts_sum_to_scan_bound() {
        let total: usize = PYRAMID_LAYERS
            .iter()
            .map(|spec| {
                let side = (2 * spec.radius + 1) as usize;
                side * side
            })
            .sum();
        assert_eq!(total, MAX_SCAN_CELLS);
    }
}
