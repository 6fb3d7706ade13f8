use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    interaction::GestureContext,
    rng::SystemRng,
    world::World,
};

/// Resolves this frame's pointer samples on every tile, then folds the
/// outcomes into the grid's hover and selection.
pub struct InteractionSystem;

impl InteractionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InteractionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for InteractionSystem {
    fn name(&self) -> &str {
        "interaction"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let gesture = GestureContext {
            camera: ctx.camera,
            hud: ctx.hud,
            dt_seconds: ctx.dt_seconds,
        };

        let mut outcomes = Vec::new();
        for tile in world.grid.tiles_mut() {
            let outcome = tile.update_interaction(&ctx.input.touches, &gesture);
            if !outcome.is_empty() {
                outcomes.push((tile.index(), outcome));
            }
        }

        for (index, outcome) in outcomes {
            if outcome.pressed {
                world.events.pressed.push(index);
            }
            if outcome.clicked {
                world.events.clicked.push(index);
            }
            world.grid.apply_interaction(index, outcome);
        }

        // Per-frame flags were cleared above; re-apply this frame's overlays.
        world.grid.set_road_preview(&ctx.input.road_preview);
        world.grid.set_glowing(&ctx.input.glowing);
        Ok(())
    }
}
