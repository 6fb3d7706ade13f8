use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, ObjectKey, ResourceKind, ResourceVector};
use crate::grid::{Grid, GridError};
use crate::ledger::Stockpile;
use crate::tile::{TileIndex, TileObject};

/// One finished production cycle, as reported to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleCompleted {
    pub tile: TileIndex,
    pub object: ObjectKey,
    pub cost: ResourceVector,
    pub output: ResourceVector,
}

/// Everything observable that happened during the current tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickEvents {
    pub pressed: Vec<TileIndex>,
    pub clicked: Vec<TileIndex>,
    pub textures_changed: Vec<TileIndex>,
    pub cycles: Vec<CycleCompleted>,
    pub effects_finished: Vec<TileIndex>,
}

impl TickEvents {
    pub fn clear(&mut self) {
        self.pressed.clear();
        self.clicked.clear();
        self.textures_changed.clear();
        self.cycles.clear();
        self.effects_finished.clear();
    }
}

#[derive(Debug, Serialize)]
pub struct StockLine {
    pub resource: &'static str,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct WorldSummary {
    pub tick: u64,
    pub elapsed_seconds: f64,
    pub objects: usize,
    pub roads: usize,
    pub cycles_applied: u64,
    pub hovered: Option<TileIndex>,
    pub selected: Option<TileIndex>,
    pub stockpile: Vec<StockLine>,
}

#[derive(Debug)]
pub struct World {
    tick: u64,
    elapsed_seconds: f64,
    dt_seconds: f64,
    pub(crate) grid: Grid,
    pub(crate) stockpile: Stockpile,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) events: TickEvents,
}

impl World {
    pub fn new(grid: Grid, stockpile: Stockpile, catalog: Arc<Catalog>, dt_seconds: f64) -> Self {
        Self {
            tick: 0,
            elapsed_seconds: 0.0,
            dt_seconds,
            grid,
            stockpile,
            catalog,
            events: TickEvents::default(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt_seconds(&self) -> f64 {
        self.dt_seconds
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
        self.elapsed_seconds += self.dt_seconds;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn stockpile(&self) -> &Stockpile {
        &self.stockpile
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn events(&self) -> &TickEvents {
        &self.events
    }

    /// Places a catalog object by name, charging its upfront cost once.
    /// Nothing changes when the tile is unavailable or the cost unaffordable.
    pub fn place(&mut self, index: TileIndex, name: &str) -> Result<(), GridError> {
        let template = self
            .catalog
            .by_name(name)
            .ok_or_else(|| GridError::UnknownObject(name.to_string()))?;
        let tile = self.grid.tile(index).ok_or(GridError::OutOfBounds {
            x: i64::from(index.x),
            y: i64::from(index.y),
            width: self.grid.width(),
            height: self.grid.height(),
        })?;
        if tile.object().is_some() {
            return Err(GridError::Occupied(index));
        }
        let upfront = template.upfront_cost();
        self.stockpile.charge(&upfront)?;
        let object = TileObject::from_template(template);
        self.grid.place_object(index, object, &self.catalog)?;
        debug!(tile = %index, object = name, "object placed");
        Ok(())
    }

    pub fn demolish(&mut self, index: TileIndex) -> Result<TileObject, GridError> {
        let removed = self.grid.demolish(index)?;
        debug!(tile = %index, object = %removed.key, "object demolished");
        Ok(removed)
    }

    pub fn summary(&self) -> WorldSummary {
        let objects = self
            .grid
            .tiles()
            .filter(|tile| tile.object().is_some())
            .count();
        let roads = self
            .grid
            .tiles()
            .filter(|tile| tile.is_road(&self.catalog))
            .count();
        WorldSummary {
            tick: self.tick,
            elapsed_seconds: self.elapsed_seconds,
            objects,
            roads,
            cycles_applied: self.stockpile.cycles_applied(),
            hovered: self.grid.hovered(),
            selected: self.grid.selected(),
            stockpile: ResourceKind::ALL
                .iter()
                .map(|kind| StockLine {
                    resource: kind.name(),
                    amount: self.stockpile.get(*kind),
                })
                .collect(),
        }
    }
}
