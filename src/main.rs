//! ziggurat - a deterministic tiered-pyramid multiblock validation engine
//!
//! Headless demo: builds a pyramid under a core block, runs the amplifier
//! controller for a fixed number of ticks, then damages the structure and
//! reacts to the change event.

mod config;

use anyhow::Result;
use config::SimulationConfig;
use std::env;
use std::path::Path;
use tracing::info;
use ziggurat_core::block::{
    BLOCK_AIR, BLOCK_GOLD, BLOCK_PYRAMID_CASING, BLOCK_PYRAMID_CORE, BLOCK_TURBINE,
};
use ziggurat_core::{BlockPos, SimTick, PYRAMID_LAYERS};
use ziggurat_world::{ChunkWorld, PyramidCore, Turbine, TurbineRegistry};

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting ziggurat v{}", env!("CARGO_PKG_VERSION"));

    let config = match env::args().nth(1) {
        Some(path) => SimulationConfig::load_from_path(Path::new(&path)),
        None => SimulationConfig::load(),
    };
    config.validate()?;

    let mut world = ChunkWorld::new(config.chunk_capacity);
    let core_pos = BlockPos::new(0, 64, 0);
    build_pyramid(&mut world, core_pos, PYRAMID_LAYERS.len());
    world.set_block(core_pos, BLOCK_PYRAMID_CORE);

    let mut turbines = TurbineRegistry::new();
    for pos in [
        BlockPos::new(12, 64, 5),
        BlockPos::new(-30, 60, 18),
        // Outside even the full pyramid's broadcast range.
        BlockPos::new(70, 64, 0),
    ] {
        world.set_block(pos, BLOCK_TURBINE);
        turbines.insert(pos, Turbine::new());
    }

    // Setup edits are not change events for the run loop.
    world.drain_structure_dirty();

    let mut core = PyramidCore::new(core_pos, config.scan_interval_ticks);
    if core.activate(Some(&world)) {
        info!(
            tier = ?core.tier(),
            multiplier = core.boost_multiplier(),
            "pyramid activated"
        );
    }

    let mut tick = SimTick::ZERO;
    for _ in 0..config.demo_ticks {
        core.tick(Some(&world), &mut turbines);
        for turbine in turbines.values_mut() {
            turbine.tick();
        }
        tick = tick.advance(1);
    }
    info!(ticks = tick.0, "simulation finished");
    for (pos, turbine) in &turbines {
        info!(
            turbine = %pos,
            multiplier = turbine.boost_multiplier(),
            output = turbine.boosted_output(256),
            "turbine state"
        );
    }

    // Knock a casing block out of the 7×7 layer and react to the change.
    world.set_block(core_pos.offset(3, -3, 0), BLOCK_AIR);
    let changed = world.drain_structure_dirty();
    if !changed.is_empty() {
        let tier = core.revalidate(Some(&world));
        info!(?tier, "revalidated after structural change");
    }

    Ok(())
}

/// Stack the first `layers` pyramid layers below the core.
fn build_pyramid(world: &mut ChunkWorld, core_pos: BlockPos, layers: usize) {
    for (i, spec) in PYRAMID_LAYERS.iter().enumerate().take(layers) {
        let id = if i == 0 { BLOCK_GOLD } else { BLOCK_PYRAMID_CASING };
        for dx in -spec.radius..=spec.radius {
            for dz in -spec.radius..=spec.radius {
                world.set_block(core_pos.offset(dx, spec.y_offset, dz), id);
            }
        }
    }
}
