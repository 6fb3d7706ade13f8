//! Pointer input and the camera/HUD collaborators that gesture resolution
//! reads each frame.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::tile::TileIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchState {
    Pressed,
    Moved,
    Released,
}

/// One raw pointer sample in screen coordinates. `id` identifies the
/// finger/pointer across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchSample {
    pub id: u32,
    pub position: Point,
    pub state: TouchState,
}

impl TouchSample {
    pub fn new(id: u32, x: f32, y: f32, state: TouchState) -> Self {
        Self {
            id,
            position: Point::new(x, y),
            state,
        }
    }
}

/// Everything the outer input layer produces for one tick.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub touches: Vec<TouchSample>,
    /// Tiles a pending road placement would cover this frame.
    pub road_preview: Vec<TileIndex>,
    /// Tiles the outer UI highlights this frame, e.g. valid placement spots.
    pub glowing: Vec<TileIndex>,
}

impl FrameInput {
    pub fn touches(touches: Vec<TouchSample>) -> Self {
        Self {
            touches,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty() && self.road_preview.is_empty() && self.glowing.is_empty()
    }
}

pub trait Camera {
    fn screen_to_world(&self, screen: Point) -> Point;
}

/// Panning/zooming 2D camera. The default value maps screen space onto world
/// space unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCamera {
    pub offset: Point,
    pub zoom: f32,
}

impl ViewCamera {
    pub fn new(offset: Point, zoom: f32) -> Self {
        Self { offset, zoom }
    }
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self {
            offset: Point::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera for ViewCamera {
    fn screen_to_world(&self, screen: Point) -> Point {
        let zoom = if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        };
        Point::new(
            screen.x / zoom + self.offset.x,
            screen.y / zoom + self.offset.y,
        )
    }
}

pub trait Hud {
    /// Screen regions that consume pointer input before any tile sees it.
    fn hit_regions(&self) -> &[Rect];

    /// Whether a screen-space point lands on any HUD region.
    fn swallows(&self, screen: Point) -> bool {
        let probe = Rect::probe(screen);
        self.hit_regions()
            .iter()
            .any(|region| region.intersects(&probe))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HudLayout {
    pub regions: Vec<Rect>,
}

impl HudLayout {
    pub fn new(regions: Vec<Rect>) -> Self {
        Self { regions }
    }
}

impl Hud for HudLayout {
    fn hit_regions(&self) -> &[Rect] {
        &self.regions
    }
}
