//! Tile grid - storage, bounds and neighbor lookup

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::autotile::{self, RoadNeighbors, RoadTexture};
use crate::catalog::Catalog;
use crate::geometry::Point;
use crate::interaction::TileInteraction;
use crate::ledger::LedgerError;
use crate::tile::{Tile, TileData, TileIndex, TileObject};

/// World-space spacing of tiles and the draw/hitbox scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub tile_width: f32,
    pub tile_height: f32,
    pub scale: f32,
}

impl GridLayout {
    pub fn position_of(&self, index: TileIndex) -> Point {
        Point::new(
            index.x as f32 * self.tile_width,
            index.y as f32 * self.tile_height,
        )
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            tile_width: 32.0,
            tile_height: 24.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("tile ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("tile {0} already holds an object")]
    Occupied(TileIndex),
    #[error("tile {0} has no object")]
    Empty(TileIndex),
    #[error("unknown catalog object `{0}`")]
    UnknownObject(String),
    #[error("tile {0} defined more than once")]
    DuplicateTile(TileIndex),
    #[error("expected {expected} tiles, found {found}")]
    TileCount { expected: usize, found: usize },
    #[error("cannot afford placement: {0}")]
    Unaffordable(#[from] LedgerError),
}

/// Row-major grid of tiles plus the current hover/selection.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    layout: GridLayout,
    tiles: Vec<Tile>,
    hovered: Option<TileIndex>,
    selected: Option<TileIndex>,
}

impl Grid {
    /// Empty, fully visible grass grid.
    pub fn blank(width: u32, height: u32, layout: GridLayout, catalog: &Catalog) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let index = TileIndex::new(x, y);
                let mut data = TileData::new(index, layout.position_of(index));
                data.is_visible = true;
                tiles.push(Tile::from_data(data, layout.scale, catalog));
            }
        }
        Self {
            width,
            height,
            layout,
            tiles,
            hovered: None,
            selected: None,
        }
    }

    /// Rebuilds a grid from tile snapshots. Every cell must appear exactly once.
    pub fn from_tile_data(
        width: u32,
        height: u32,
        layout: GridLayout,
        data: Vec<TileData>,
        catalog: &Catalog,
    ) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(GridError::TileCount {
                expected,
                found: data.len(),
            });
        }
        let mut slots: Vec<Option<Tile>> = vec![None; expected];
        for entry in data {
            let slot = linear_index(width, height, entry.index).ok_or(GridError::OutOfBounds {
                x: i64::from(entry.index.x),
                y: i64::from(entry.index.y),
                width,
                height,
            })?;
            if slots[slot].is_some() {
                return Err(GridError::DuplicateTile(entry.index));
            }
            slots[slot] = Some(Tile::from_data(entry, layout.scale, catalog));
        }
        // Length matched and there were no duplicates, so every slot is filled.
        let tiles = slots.into_iter().flatten().collect();
        Ok(Self {
            width,
            height,
            layout,
            tiles,
            hovered: None,
            selected: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        linear_index(self.width, self.height, index).map(|slot| &self.tiles[slot])
    }

    pub fn tile_mut(&mut self, index: TileIndex) -> Option<&mut Tile> {
        let slot = linear_index(self.width, self.height, index)?;
        Some(&mut self.tiles[slot])
    }

    pub fn tile_at(&self, x: i64, y: i64) -> Result<&Tile, GridError> {
        if !self.contains(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        Ok(&self.tiles[(y as usize) * self.width as usize + x as usize])
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    pub fn hovered(&self) -> Option<TileIndex> {
        self.hovered
    }

    pub fn selected(&self) -> Option<TileIndex> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Neighbor at `(dx, dy)` from `index`, or `None` past the grid edge.
    pub fn neighbor(&self, index: TileIndex, dx: i64, dy: i64) -> Option<&Tile> {
        let x = i64::from(index.x) + dx;
        let y = i64::from(index.y) + dy;
        self.tile_at(x, y).ok()
    }

    /// Which cardinal neighbors of `index` carry road. Past the edge counts as
    /// a blank tile.
    pub fn road_neighbors(&self, index: TileIndex, catalog: &Catalog) -> RoadNeighbors {
        let is_road = |dx, dy| {
            self.neighbor(index, dx, dy)
                .is_some_and(|tile| tile.carries_road(catalog))
        };
        RoadNeighbors::new(is_road(-1, 0), is_road(1, 0), is_road(0, -1), is_road(0, 1))
    }

    /// Road piece a road at `index` would show. Pure: also used for previews
    /// of roads that are not placed yet.
    pub fn resolve_road(&self, index: TileIndex, catalog: &Catalog) -> RoadTexture {
        autotile::resolve(self.road_neighbors(index, catalog))
    }

    /// Marks tiles covered by a pending road placement for this frame.
    pub fn set_road_preview(&mut self, indices: &[TileIndex]) {
        for index in indices {
            if let Some(tile) = self.tile_mut(*index) {
                tile.is_previewing_road = true;
            }
        }
    }

    pub fn set_glowing(&mut self, indices: &[TileIndex]) {
        for index in indices {
            if let Some(tile) = self.tile_mut(*index) {
                tile.is_glowing = true;
            }
        }
    }

    /// Records a tile's gesture outcome in the grid-level hover/selection.
    pub fn apply_interaction(&mut self, index: TileIndex, outcome: TileInteraction) {
        if outcome.hovered && self.hovered != Some(index) {
            if let Some(previous) = self.hovered {
                if let Some(tile) = self.tile_mut(previous) {
                    tile.is_hovered = false;
                }
            }
            if let Some(tile) = self.tile_mut(index) {
                tile.is_hovered = true;
            }
            self.hovered = Some(index);
        }
        if outcome.selects() {
            self.selected = Some(index);
        }
    }

    pub fn place_object(
        &mut self,
        index: TileIndex,
        object: TileObject,
        catalog: &Catalog,
    ) -> Result<(), GridError> {
        let oob = self.out_of_bounds(i64::from(index.x), i64::from(index.y));
        let tile = self.tile_mut(index).ok_or(oob)?;
        if tile.object().is_some() {
            return Err(GridError::Occupied(index));
        }
        tile.place(object, catalog);
        Ok(())
    }

    pub fn demolish(&mut self, index: TileIndex) -> Result<TileObject, GridError> {
        let oob = self.out_of_bounds(i64::from(index.x), i64::from(index.y));
        let tile = self.tile_mut(index).ok_or(oob)?;
        tile.demolish().ok_or(GridError::Empty(index))
    }

    pub fn tile_data(&self) -> Vec<TileData> {
        self.tiles.iter().map(Tile::tile_data).collect()
    }

    fn out_of_bounds(&self, x: i64, y: i64) -> GridError {
        GridError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }
}

fn linear_index(width: u32, height: u32, index: TileIndex) -> Option<usize> {
    if index.x < width && index.y < height {
        Some(index.y as usize * width as usize + index.x as usize)
    } else {
        None
    }
}
