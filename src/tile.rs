use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::{DestructionEffect, FrameClock};
use crate::autotile::RoadTexture;
use crate::catalog::{Catalog, ObjectKey, ObjectTemplate};
use crate::cycle::CycleTimer;
use crate::geometry::{Point, Rect};
use crate::input::TouchSample;
use crate::interaction::{GestureContext, GesturePhase, InteractionState, TileInteraction};

// Touch hitbox in tile-local units: covers the drawn base of the tile rather
// than its full sprite bounds.
const HITBOX_OFFSET_X: f32 = 16.0;
const HITBOX_OFFSET_Y: f32 = 83.0;
const HITBOX_WIDTH: f32 = 18.0;
const HITBOX_HEIGHT: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
}

impl TileIndex {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    #[default]
    Grass,
    Dirt,
    Water,
}

impl TerrainKind {
    pub fn id(self) -> u8 {
        match self {
            TerrainKind::Grass => 0,
            TerrainKind::Dirt => 1,
            TerrainKind::Water => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(TerrainKind::Grass),
            1 => Some(TerrainKind::Dirt),
            2 => Some(TerrainKind::Water),
            _ => None,
        }
    }

    pub fn texture_index(self) -> u32 {
        match self {
            TerrainKind::Grass => 1,
            TerrainKind::Dirt => 2,
            TerrainKind::Water => 4,
        }
    }
}

/// A catalog object placed on a tile, with its own production timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileObject {
    pub id: u32,
    pub key: ObjectKey,
    pub texture_index: u32,
    pub timer: CycleTimer,
}

impl TileObject {
    pub fn from_template(template: &ObjectTemplate) -> Self {
        Self {
            id: template.id,
            key: template.key,
            texture_index: template.texture_index,
            timer: CycleTimer::new(template.cycle_time),
        }
    }

    pub fn type_id(&self) -> u32 {
        self.key.kind.type_id()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.timer.cycles_completed()
    }

    pub fn elapsed_in_cycle(&self) -> f64 {
        self.timer.elapsed()
    }
}

/// Plain snapshot of a tile, used to generate, load and save maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileData {
    pub index: TileIndex,
    pub position: Point,
    pub terrain: TerrainKind,
    pub is_visible: bool,
    pub object: Option<TileObject>,
}

impl TileData {
    pub fn new(index: TileIndex, position: Point) -> Self {
        Self {
            index,
            position,
            terrain: TerrainKind::Grass,
            is_visible: false,
            object: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    index: TileIndex,
    position: Point,
    scale: f32,
    pub terrain: TerrainKind,
    object: Option<TileObject>,
    pub is_visible: bool,
    /// Follows visibility; clear it to lock a visible tile against gestures.
    pub is_interactable: bool,
    pub is_hovered: bool,
    pub is_glowing: bool,
    pub is_previewing_road: bool,
    last_resolved_road_texture: Option<RoadTexture>,
    interaction: InteractionState,
    animation: Option<FrameClock>,
    destruction: DestructionEffect,
}

impl Tile {
    pub fn from_data(data: TileData, scale: f32, catalog: &Catalog) -> Self {
        let mut tile = Self {
            index: data.index,
            position: data.position,
            scale,
            terrain: data.terrain,
            object: data.object,
            is_visible: data.is_visible,
            is_interactable: data.is_visible,
            is_hovered: false,
            is_glowing: false,
            is_previewing_road: false,
            last_resolved_road_texture: None,
            interaction: InteractionState::default(),
            animation: None,
            destruction: DestructionEffect::new(catalog.destruction_effect()),
        };
        tile.refresh_animation(catalog);
        tile
    }

    pub fn index(&self) -> TileIndex {
        self.index
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn object(&self) -> Option<&TileObject> {
        self.object.as_ref()
    }

    pub(crate) fn object_mut(&mut self) -> Option<&mut TileObject> {
        self.object.as_mut()
    }

    pub fn last_resolved_road_texture(&self) -> Option<RoadTexture> {
        self.last_resolved_road_texture
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn accepts_gestures(&self) -> bool {
        self.is_visible && self.is_interactable
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.interaction.phase(self.accepts_gestures())
    }

    pub fn animation(&self) -> Option<&FrameClock> {
        self.animation.as_ref()
    }

    pub fn destruction(&self) -> &DestructionEffect {
        &self.destruction
    }

    pub fn hitbox(&self) -> Rect {
        Rect::new(
            self.position.x + HITBOX_OFFSET_X,
            self.position.y + HITBOX_OFFSET_Y * self.scale,
            HITBOX_WIDTH * self.scale,
            HITBOX_HEIGHT * self.scale,
        )
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.is_visible = visible;
        self.is_interactable = visible;
    }

    pub fn is_road(&self, catalog: &Catalog) -> bool {
        self.object
            .is_some_and(|object| catalog.is_road(object.key))
    }

    /// Road for autotiling purposes: committed road or a road preview.
    pub fn carries_road(&self, catalog: &Catalog) -> bool {
        self.is_previewing_road || self.is_road(catalog)
    }

    /// Clears the per-frame flags and resolves this frame's pointer samples.
    pub fn update_interaction(
        &mut self,
        touches: &[TouchSample],
        ctx: &GestureContext<'_>,
    ) -> TileInteraction {
        self.is_glowing = false;
        self.is_previewing_road = false;

        let hitbox = self.hitbox();
        let active = self.accepts_gestures();
        let outcome = self.interaction.update(active, hitbox, touches, ctx);
        if outcome.pressed {
            debug!(tile = %self.index, "press registered");
        }
        if outcome.clicked {
            debug!(tile = %self.index, "press-release registered");
        }
        outcome
    }

    /// Stores a freshly resolved road piece. Committed road objects pick up
    /// the new texture index; returns `true` only when that index changed.
    pub fn apply_road_texture(&mut self, texture: RoadTexture, catalog: &Catalog) -> bool {
        self.last_resolved_road_texture = Some(texture);
        let changed = match self.object.as_mut() {
            Some(object) if catalog.is_road(object.key) => {
                let index = texture.texture_index();
                if object.texture_index != index {
                    object.texture_index = index;
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if changed {
            self.refresh_animation(catalog);
        }
        changed
    }

    pub fn place(&mut self, object: TileObject, catalog: &Catalog) {
        self.object = Some(object);
        self.last_resolved_road_texture = None;
        self.refresh_animation(catalog);
    }

    /// Removes the object and starts the destruction effect.
    pub fn demolish(&mut self) -> Option<TileObject> {
        let removed = self.object.take();
        if removed.is_some() {
            self.animation = None;
            self.last_resolved_road_texture = None;
            self.destruction.start();
        }
        removed
    }

    /// Returns `true` on the tick the destruction effect finishes.
    pub fn advance_animations(&mut self, dt: f64) -> bool {
        if let Some(clock) = self.animation.as_mut() {
            clock.advance(dt);
        }
        self.destruction.advance(dt)
    }

    pub fn tile_data(&self) -> TileData {
        TileData {
            index: self.index,
            position: self.position,
            terrain: self.terrain,
            is_visible: self.is_visible,
            object: self.object,
        }
    }

    fn refresh_animation(&mut self, catalog: &Catalog) {
        self.animation = self
            .object
            .and_then(|object| catalog.animation_for(object.texture_index))
            .map(FrameClock::new);
    }
}
