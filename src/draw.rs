//! Draw boundary
//!
//! Turns tiles into a flat list of sprite commands for whatever renderer sits
//! outside the simulation. Texture problems are reported per tile and never
//! touch simulation state: a tile that cannot be drawn is skipped for the
//! frame and everything else still updates.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::autotile::RoadTexture;
use crate::catalog::{Catalog, ObjectKind};
use crate::geometry::Point;
use crate::grid::Grid;
use crate::tile::{TerrainKind, Tile, TileIndex};

/// Paved base drawn under every building except roads.
pub const CONCRETE_TEXTURE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextureId {
    /// Single-frame tile sheet entry.
    Tile(u32),
    /// Sprite sheet of an animated object texture.
    Animated(u32),
    DestructionFx,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Tint {
    pub const WHITE: Tint = Tint::opaque(255, 255, 255);
    pub const ORANGE_RED: Tint = Tint::opaque(255, 69, 0);
    pub const DARK_GRAY: Tint = Tint::opaque(169, 169, 169);
    pub const GLOW: Tint = Tint {
        r: 255,
        g: 255,
        b: 0,
        alpha: 0.5,
    };

    const fn opaque(r: u8, g: u8, b: u8) -> Tint {
        Tint { r, g, b, alpha: 1.0 }
    }

    /// Glow wins over everything; hidden tiles are grayed even when hovered.
    pub fn for_tile(tile: &Tile) -> Tint {
        if tile.is_glowing {
            Tint::GLOW
        } else if !tile.is_visible {
            Tint::DARK_GRAY
        } else if tile.is_hovered {
            Tint::ORANGE_RED
        } else {
            Tint::WHITE
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteCommand {
    pub tile: TileIndex,
    pub texture: TextureId,
    pub frame: u32,
    pub position: Point,
    pub scale: f32,
    pub tint: Tint,
}

/// What the renderer has loaded: frame count per texture.
pub trait TextureAtlas {
    fn frame_count(&self, texture: TextureId) -> Option<u32>;
}

#[derive(Debug, Error, PartialEq)]
pub enum DrawError {
    #[error("tile {tile}: texture {texture:?} is not loaded")]
    MissingTexture { tile: TileIndex, texture: TextureId },
    #[error("tile {tile}: frame {frame} of {texture:?} is out of range ({frames} frames)")]
    MissingFrame {
        tile: TileIndex,
        texture: TextureId,
        frame: u32,
        frames: u32,
    },
}

/// In-memory atlas description.
#[derive(Debug, Clone, Default)]
pub struct AtlasManifest {
    frames: HashMap<TextureId, u32>,
}

impl AtlasManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, texture: TextureId, frames: u32) {
        self.frames.insert(texture, frames);
    }

    pub fn remove(&mut self, texture: TextureId) {
        self.frames.remove(&texture);
    }

    /// Every texture the catalog can ask for.
    pub fn for_catalog(catalog: &Catalog) -> Self {
        let mut manifest = Self::new();
        for terrain in [TerrainKind::Grass, TerrainKind::Dirt, TerrainKind::Water] {
            manifest.insert(TextureId::Tile(terrain.texture_index()), 1);
        }
        manifest.insert(TextureId::Tile(CONCRETE_TEXTURE), 1);
        for template in catalog.templates() {
            manifest.insert(TextureId::Tile(template.texture_index), 1);
        }
        for road in RoadTexture::ALL {
            manifest.insert(TextureId::Tile(road.texture_index()), 1);
        }
        for (texture, spec) in catalog.animations() {
            manifest.insert(TextureId::Animated(texture), spec.frame_count);
        }
        manifest.insert(
            TextureId::DestructionFx,
            catalog.destruction_effect().frame_count,
        );
        manifest
    }
}

impl TextureAtlas for AtlasManifest {
    fn frame_count(&self, texture: TextureId) -> Option<u32> {
        self.frames.get(&texture).copied()
    }
}

/// Sprites for one tile, bottom layer first.
pub fn tile_commands(
    tile: &Tile,
    catalog: &Catalog,
    atlas: &dyn TextureAtlas,
) -> Result<Vec<SpriteCommand>, DrawError> {
    let tint = Tint::for_tile(tile);
    let mut layers = vec![(TextureId::Tile(tile.terrain.texture_index()), 0)];

    match tile.object() {
        Some(object) => {
            let is_road = catalog.is_road(object.key);
            if object.key.kind == ObjectKind::Building && !is_road {
                layers.push((TextureId::Tile(CONCRETE_TEXTURE), 0));
            }
            if let Some(clock) = tile.animation() {
                layers.push((TextureId::Animated(object.texture_index), clock.frame()));
            } else if tile.is_previewing_road && !is_road {
                layers.push((preview_texture(tile), 0));
            } else {
                layers.push((TextureId::Tile(object.texture_index), 0));
            }
        }
        None if tile.is_previewing_road => layers.push((preview_texture(tile), 0)),
        None => {}
    }

    if tile.destruction().is_active() {
        layers.push((TextureId::DestructionFx, tile.destruction().frame()));
    }

    layers
        .into_iter()
        .map(|(texture, frame)| {
            let frames = atlas
                .frame_count(texture)
                .ok_or(DrawError::MissingTexture {
                    tile: tile.index(),
                    texture,
                })?;
            if frame >= frames {
                return Err(DrawError::MissingFrame {
                    tile: tile.index(),
                    texture,
                    frame,
                    frames,
                });
            }
            Ok(SpriteCommand {
                tile: tile.index(),
                texture,
                frame,
                position: tile.position(),
                scale: tile.scale(),
                tint,
            })
        })
        .collect()
}

fn preview_texture(tile: &Tile) -> TextureId {
    let piece = tile
        .last_resolved_road_texture()
        .unwrap_or(RoadTexture::Horizontal);
    TextureId::Tile(piece.texture_index())
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawList {
    pub commands: Vec<SpriteCommand>,
    pub skipped_tiles: Vec<TileIndex>,
}

/// Builds the frame's sprite list, logging and skipping tiles that fail.
pub fn draw_grid(grid: &Grid, catalog: &Catalog, atlas: &dyn TextureAtlas) -> DrawList {
    let mut list = DrawList::default();
    for tile in grid.tiles() {
        match tile_commands(tile, catalog, atlas) {
            Ok(commands) => list.commands.extend(commands),
            Err(err) => {
                warn!(error = %err, "skipping tile sprite");
                list.skipped_tiles.push(tile.index());
            }
        }
    }
    list
}
