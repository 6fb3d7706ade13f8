use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Cosmetic frame advancing; has no effect on gameplay state.
pub struct AnimationSystem;

impl AnimationSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AnimationSystem {
    fn name(&self) -> &str {
        "animation"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for tile in world.grid.tiles_mut() {
            if tile.advance_animations(ctx.dt_seconds) {
                world.events.effects_finished.push(tile.index());
            }
        }
        Ok(())
    }
}
