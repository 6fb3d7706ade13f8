use anyhow::Result;
use tracing::warn;

use crate::{
    catalog::{Catalog, ObjectKey, ResourceVector},
    engine::{System, SystemContext},
    ledger::Ledger,
    rng::SystemRng,
    world::{CycleCompleted, World},
};

/// Ledger events emitted per object per tick. Rollovers past this are still
/// counted by the timer but not reported.
pub const MAX_CYCLES_PER_TICK: u64 = 1024;

/// Advances every object's production timer and reports each completed
/// cycle to the ledger. Affordability is the ledger's concern: a cycle is
/// reported whether or not the stockpile can pay for it.
pub struct EconomySystem;

impl EconomySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EconomySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let catalog = &world.catalog;
        let start = world.events.cycles.len();
        for tile in world.grid.tiles_mut() {
            let index = tile.index();
            let Some(object) = tile.object_mut() else {
                continue;
            };
            let rollovers = object.timer.advance(ctx.dt_seconds);
            if rollovers == 0 {
                continue;
            }
            let (cost, output) = cycle_vectors(catalog, object.key, ctx.tick);
            if rollovers > MAX_CYCLES_PER_TICK {
                warn!(
                    tile = %index,
                    rollovers,
                    reported = MAX_CYCLES_PER_TICK,
                    "step too long for this cycle time; dropping extra cycles"
                );
            }
            for _ in 0..rollovers.min(MAX_CYCLES_PER_TICK) {
                world.events.cycles.push(CycleCompleted {
                    tile: index,
                    object: object.key,
                    cost,
                    output,
                });
            }
        }
        settle_cycles(&mut world.stockpile, &world.events.cycles[start..]);
        Ok(())
    }
}

/// Forwards completed cycles to a ledger, one call per cycle.
pub fn settle_cycles(ledger: &mut impl Ledger, cycles: &[CycleCompleted]) {
    for cycle in cycles {
        ledger.apply_cycle(cycle.object, &cycle.cost, &cycle.output);
    }
}

fn cycle_vectors(
    catalog: &Catalog,
    key: ObjectKey,
    tick: u64,
) -> (ResourceVector, ResourceVector) {
    match catalog.lookup(key) {
        Some(template) => (template.per_cycle_cost(), template.output),
        None => {
            warn!(object = %key, tick, "object missing from catalog; cycle has no effect");
            (ResourceVector::ZERO, ResourceVector::ZERO)
        }
    }
}
