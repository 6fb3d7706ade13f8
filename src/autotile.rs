//! Road autotiling
//!
//! A road tile picks its texture from which of its four cardinal neighbors
//! are also road (committed or previewed). Rules are grouped by how many
//! neighbors are set and evaluated in a fixed order; the first match wins.

use serde::{Deserialize, Serialize};

/// Which cardinal neighbors carry road. Out-of-bounds neighbors are `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RoadNeighbors {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl RoadNeighbors {
    pub fn new(left: bool, right: bool, top: bool, bottom: bool) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Bit 0 = left, 1 = right, 2 = top, 3 = bottom.
    pub fn bits(self) -> u8 {
        u8::from(self.left)
            | u8::from(self.right) << 1
            | u8::from(self.top) << 2
            | u8::from(self.bottom) << 3
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & 0b0001 != 0,
            right: bits & 0b0010 != 0,
            top: bits & 0b0100 != 0,
            bottom: bits & 0b1000 != 0,
        }
    }

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadTexture {
    Horizontal,
    Vertical,
    /// left + top
    CornerA,
    /// left + bottom
    CornerB,
    /// right + top
    CornerC,
    /// right + bottom
    CornerD,
    /// left + right + top
    Tee1,
    /// left + right + bottom
    Tee2,
    /// top + bottom + left
    Tee3,
    /// top + bottom + right
    Tee4,
    Cross,
}

impl RoadTexture {
    pub const ALL: [RoadTexture; 11] = [
        RoadTexture::Horizontal,
        RoadTexture::Vertical,
        RoadTexture::CornerA,
        RoadTexture::CornerB,
        RoadTexture::CornerC,
        RoadTexture::CornerD,
        RoadTexture::Tee1,
        RoadTexture::Tee2,
        RoadTexture::Tee3,
        RoadTexture::Tee4,
        RoadTexture::Cross,
    ];

    /// Texture atlas index of this road piece.
    pub fn texture_index(self) -> u32 {
        match self {
            RoadTexture::Horizontal => 26,
            RoadTexture::Vertical => 27,
            RoadTexture::Cross => 28,
            RoadTexture::Tee3 => 29,
            RoadTexture::Tee1 => 30,
            RoadTexture::Tee4 => 31,
            RoadTexture::Tee2 => 32,
            RoadTexture::CornerD => 33,
            RoadTexture::CornerC => 34,
            RoadTexture::CornerA => 35,
            RoadTexture::CornerB => 36,
        }
    }
}

pub fn resolve(n: RoadNeighbors) -> RoadTexture {
    let RoadNeighbors {
        left,
        right,
        top,
        bottom,
    } = n;
    match n.count() {
        1 => straight(n).unwrap_or(RoadTexture::Horizontal),
        2 => {
            if left && top {
                RoadTexture::CornerA
            } else if left && bottom {
                RoadTexture::CornerB
            } else if right && top {
                RoadTexture::CornerC
            } else if right && bottom {
                RoadTexture::CornerD
            } else {
                straight(n).unwrap_or(RoadTexture::Horizontal)
            }
        }
        3 => {
            if left && right && top {
                RoadTexture::Tee1
            } else if left && right && bottom {
                RoadTexture::Tee2
            } else if top && bottom && left {
                RoadTexture::Tee3
            } else {
                RoadTexture::Tee4
            }
        }
        4 => RoadTexture::Cross,
        // Isolated road.
        _ => RoadTexture::Horizontal,
    }
}

fn straight(n: RoadNeighbors) -> Option<RoadTexture> {
    if !(n.bottom || n.top) {
        Some(RoadTexture::Horizontal)
    } else if !(n.left || n.right) {
        Some(RoadTexture::Vertical)
    } else {
        None
    }
}
