//! Pyramid core controller and the turbine boost sinks it feeds.
//!
//! The controller owns the cached tier for one core position. It re-validates
//! the structure on a throttled schedule (and on demand for structure-change
//! events), then broadcasts the tier's multiplier to turbines in range under
//! a highest-wins rule. It never generates or moves energy itself.

use std::collections::BTreeMap;

use tracing::{debug, info};

use ziggurat_core::{pyramid, BlockPos, PyramidTier, WorldQuery};

/// Lowest accepted boost multiplier (no boost).
pub const MIN_BOOST_MULTIPLIER: f32 = 1.0;
/// Highest accepted boost multiplier; values beyond this are clamped.
pub const MAX_BOOST_MULTIPLIER: f32 = 1000.0;
/// Ticks a delivered boost survives without refresh. Slightly longer than
/// the default scan interval so a healthy core re-applies before expiry.
pub const BOOST_EXPIRY_TICKS: u32 = 250;
/// Largest radius a broadcast will ever cover.
pub const MAX_BOOST_RANGE: i32 = 128;

/// Clamp a multiplier into [min, max]; non-finite input collapses to `min`.
fn clamp_multiplier(value: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        return min;
    }
    if value < min {
        return min;
    }
    if value > max {
        return max;
    }
    value
}

/// A machine that accepts pyramid boosts.
///
/// Boosts follow a highest-wins rule across cores: an application below the
/// current multiplier is ignored. Accepted boosts arm an expiry countdown so
/// a demolished pyramid stops paying out within [`BOOST_EXPIRY_TICKS`].
#[derive(Debug, Clone)]
pub struct Turbine {
    boost_multiplier: f32,
    boost_ticks_remaining: u32,
}

impl Default for Turbine {
    fn default() -> Self {
        Self::new()
    }
}

impl Turbine {
    /// A turbine with no boost applied.
    pub fn new() -> Self {
        Self {
            boost_multiplier: MIN_BOOST_MULTIPLIER,
            boost_ticks_remaining: 0,
        }
    }

    /// Current boost multiplier (always within [1.0, 1000.0]).
    pub fn boost_multiplier(&self) -> f32 {
        self.boost_multiplier
    }

    /// Offer a boost. Accepts and re-arms expiry iff the clamped value is at
    /// least the current multiplier; returns whether it was accepted.
    pub fn apply_boost(&mut self, multiplier: f32) -> bool {
        let multiplier = clamp_multiplier(multiplier, MIN_BOOST_MULTIPLIER, MAX_BOOST_MULTIPLIER);
        if multiplier >= self.boost_multiplier {
            self.boost_multiplier = multiplier;
            self.boost_ticks_remaining = BOOST_EXPIRY_TICKS;
            true
        } else {
            false
        }
    }

    /// Advance the expiry countdown; a stale boost falls back to 1.0.
    pub fn tick(&mut self) {
        if self.boost_ticks_remaining > 0 {
            self.boost_ticks_remaining -= 1;
        } else if self.boost_multiplier > MIN_BOOST_MULTIPLIER {
            self.boost_multiplier = MIN_BOOST_MULTIPLIER;
        }
    }

    /// Base output scaled by the current boost, saturating instead of
    /// overflowing.
    pub fn boosted_output(&self, base: u32) -> u64 {
        let boosted = f64::from(base) * f64::from(self.boost_multiplier.max(MIN_BOOST_MULTIPLIER));
        if boosted >= u64::MAX as f64 {
            u64::MAX
        } else {
            boosted as u64
        }
    }
}

/// Turbines keyed by position; BTreeMap so broadcasts visit them in
/// deterministic order.
pub type TurbineRegistry = BTreeMap<BlockPos, Turbine>;

/// Controller for one pyramid core block.
pub struct PyramidCore {
    core_pos: BlockPos,
    scan_interval: u32,
    cooldown: u32,
    tier: PyramidTier,
    boost_multiplier: f32,
    active: bool,
}

impl PyramidCore {
    /// Create a controller that validates on its first tick and every
    /// `scan_interval` ticks after.
    pub fn new(core_pos: BlockPos, scan_interval: u32) -> Self {
        Self {
            core_pos,
            scan_interval: scan_interval.max(1),
            cooldown: 0,
            tier: PyramidTier::None,
            boost_multiplier: MIN_BOOST_MULTIPLIER,
            active: false,
        }
    }

    /// Position of the core block this controller validates around.
    pub fn core_pos(&self) -> BlockPos {
        self.core_pos
    }

    /// Most recently validated tier.
    pub fn tier(&self) -> PyramidTier {
        self.tier
    }

    /// Multiplier currently broadcast to turbines.
    pub fn boost_multiplier(&self) -> f32 {
        self.boost_multiplier
    }

    /// Whether the core has been activated (requires a valid structure).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the last validation found any complete structure.
    pub fn structure_valid(&self) -> bool {
        self.tier != PyramidTier::None
    }

    /// Throttled update: counts down, then re-validates, syncs the active
    /// flag, and broadcasts the boost. Call once per simulation tick.
    pub fn tick<W: WorldQuery>(&mut self, world: Option<&W>, turbines: &mut TurbineRegistry) {
        let Some(world) = world else {
            return;
        };

        self.cooldown = self.cooldown.saturating_sub(1);
        if self.cooldown > 0 {
            return;
        }
        self.cooldown = self.scan_interval;

        self.revalidate(Some(world));

        // Deactivate if the structure fell apart.
        if !self.structure_valid() && self.active {
            self.active = false;
            info!(core = %self.core_pos, "pyramid deactivated, structure incomplete");
        }

        self.broadcast_boost(world, turbines);
    }

    /// Re-validate immediately (for structure-change events) and return the
    /// new tier.
    pub fn revalidate<W: WorldQuery>(&mut self, world: Option<&W>) -> PyramidTier {
        let tier = pyramid::validate(world, self.core_pos);
        if tier != self.tier {
            info!(core = %self.core_pos, old = ?self.tier, new = ?tier, "pyramid tier changed");
            self.tier = tier;
            self.boost_multiplier = tier.multiplier();
        }
        tier
    }

    /// Attempt to activate the core. Succeeds only when validation finds a
    /// complete structure.
    pub fn activate<W: WorldQuery>(&mut self, world: Option<&W>) -> bool {
        self.revalidate(world);
        if self.structure_valid() {
            self.active = true;
            true
        } else {
            false
        }
    }

    /// Deactivate the core.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Offer the current multiplier to every loaded turbine within the
    /// tier's range (Chebyshev distance). Registry order makes delivery
    /// deterministic.
    fn broadcast_boost<W: WorldQuery>(&self, world: &W, turbines: &mut TurbineRegistry) {
        if self.tier == PyramidTier::None {
            return;
        }

        let range = self.tier.boost_range();
        if range <= 0 || range > MAX_BOOST_RANGE {
            return;
        }
        if !(MIN_BOOST_MULTIPLIER..=MAX_BOOST_MULTIPLIER).contains(&self.boost_multiplier) {
            return;
        }

        for (pos, turbine) in turbines.iter_mut() {
            if self.core_pos.chebyshev_distance(*pos) > range {
                continue;
            }
            if !world.is_loaded(*pos) {
                continue;
            }
            if turbine.apply_boost(self.boost_multiplier) {
                debug!(
                    core = %self.core_pos,
                    turbine = %pos,
                    multiplier = self.boost_multiplier,
                    "applied pyramid boost"
                );
            }
        }
    }

    /// Clamp cached state back into valid ranges. A tierless core carries no
    /// boost and cannot stay active.
    pub fn validate_state(&mut self) {
        self.boost_multiplier =
            clamp_multiplier(self.boost_multiplier, MIN_BOOST_MULTIPLIER, MAX_BOOST_MULTIPLIER);
        if self.tier == PyramidTier::None {
            if self.boost_multiplier > MIN_BOOST_MULTIPLIER {
                debug!(core = %self.core_pos, "resetting boost multiplier, no tier");
                self.boost_multiplier = MIN_BOOST_MULTIPLIER;
            }
            self.active = false;
        }
    }
}
