use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Re-resolves the road piece of every road and road-preview tile.
///
/// All pieces are resolved against the grid as it stands at the start of
/// the pass and only then written back, so a tile never observes a
/// neighbor's half-updated state.
pub struct AutotileSystem;

impl AutotileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AutotileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AutotileSystem {
    fn name(&self) -> &str {
        "autotile"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let catalog = &world.catalog;
        let grid = &world.grid;
        let resolved: Vec<_> = grid
            .tiles()
            .filter(|tile| tile.carries_road(catalog))
            .map(|tile| (tile.index(), grid.resolve_road(tile.index(), catalog)))
            .collect();

        for (index, texture) in resolved {
            if let Some(tile) = world.grid.tile_mut(index) {
                if tile.apply_road_texture(texture, catalog) {
                    world.events.textures_changed.push(index);
                }
            }
        }
        Ok(())
    }
}
