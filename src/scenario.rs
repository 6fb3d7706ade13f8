use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use rand::distributions::{Distribution, WeightedIndex};
use serde::Deserialize;
use tracing::info;

use crate::{
    catalog::{Catalog, ResourceVector},
    geometry::Rect,
    grid::{Grid, GridLayout},
    input::{FrameInput, HudLayout, TouchSample, TouchState, ViewCamera},
    ledger::Stockpile,
    rng::{RngManager, TERRAIN_STREAM},
    tile::{TerrainKind, TileData, TileIndex},
    world::World,
};

/// Longest accepted step; one tick should never cover more than an hour.
pub const MAX_DT_SECONDS: f64 = 3600.0;

fn default_dt_seconds() -> f64 {
    1.0 / 60.0
}

fn default_ticks() -> u64 {
    600
}

fn default_tile_width() -> f32 {
    32.0
}

fn default_tile_height() -> f32 {
    24.0
}

fn default_scale() -> f32 {
    1.0
}

fn default_all_visible() -> bool {
    true
}

fn default_reveal_radius() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f64,
    #[serde(default)]
    pub ticks: Option<u64>,
    pub map: MapConfig,
    /// Starting amounts in resource order; omitted means empty.
    #[serde(default)]
    pub stockpile: Vec<i64>,
    /// Catalog YAML, relative to the scenario file. Built-in catalog when absent.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub hud: Vec<Rect>,
    #[serde(default)]
    pub camera: ViewCamera,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(skip)]
    source_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_tile_width")]
    pub tile_width: f32,
    #[serde(default = "default_tile_height")]
    pub tile_height: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub terrain: TerrainWeights,
    #[serde(default = "default_all_visible")]
    pub all_visible: bool,
    /// When not everything is visible, tiles within this many steps of a
    /// placement start revealed.
    #[serde(default = "default_reveal_radius")]
    pub reveal_radius: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerrainWeights {
    pub grass: u32,
    pub dirt: u32,
    pub water: u32,
}

impl Default for TerrainWeights {
    fn default() -> Self {
        Self {
            grass: 1,
            dirt: 0,
            water: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub object: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptConfig {
    #[serde(default)]
    pub touches: Vec<ScriptedTouch>,
    #[serde(default)]
    pub road_previews: Vec<ScriptedTile>,
    #[serde(default)]
    pub glowing: Vec<ScriptedTile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedTouch {
    pub tick: u64,
    #[serde(default)]
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub state: TouchState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedTile {
    pub tick: u64,
    pub x: u32,
    pub y: u32,
}

/// Per-tick frame input replayed from a scenario.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    frames: BTreeMap<u64, FrameInput>,
}

impl InputScript {
    pub fn frame(&self, tick: u64) -> FrameInput {
        self.frames.get(&tick).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.frames.keys().next_back().copied()
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario.source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());
        info!(scenario = %scenario.name, path = %path.display(), "scenario loaded");
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let mut scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.source_dir = PathBuf::from(".");
        Ok(scenario)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or_else(default_ticks)
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout {
            tile_width: self.map.tile_width,
            tile_height: self.map.tile_height,
            scale: self.map.scale,
        }
    }

    pub fn hud_layout(&self) -> HudLayout {
        HudLayout::new(self.hud.clone())
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let Some(relative) = &self.catalog else {
            return Ok(Catalog::builtin());
        };
        let path = self.source_dir.join(relative);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        Catalog::from_yaml_str(&text)
            .with_context(|| format!("Invalid catalog {}", path.display()))
    }

    pub fn build_world(&self) -> Result<World> {
        if !(self.dt_seconds.is_finite() && self.dt_seconds > 0.0) {
            bail!("dt_seconds must be positive, got {}", self.dt_seconds);
        }
        if self.dt_seconds > MAX_DT_SECONDS {
            bail!(
                "dt_seconds must be at most {MAX_DT_SECONDS}, got {}",
                self.dt_seconds
            );
        }
        let catalog = Arc::new(self.load_catalog()?);
        let layout = self.layout();
        let (width, height) = (self.map.width, self.map.height);

        let terrain = generate_terrain(width, height, &self.map.terrain, self.seed)?;
        let mut data = Vec::with_capacity(terrain.len());
        for y in 0..height {
            for x in 0..width {
                let index = TileIndex::new(x, y);
                let mut tile = TileData::new(index, layout.position_of(index));
                tile.terrain = terrain[y as usize * width as usize + x as usize];
                tile.is_visible = self.map.all_visible || self.revealed(index);
                data.push(tile);
            }
        }
        let grid = Grid::from_tile_data(width, height, layout, data, &catalog)
            .context("Failed to build grid")?;

        let initial = if self.stockpile.is_empty() {
            ResourceVector::ZERO
        } else {
            ResourceVector::from_config(&self.name, "stockpile", &self.stockpile)?
        };
        let mut world = World::new(grid, Stockpile::new(initial), catalog, self.dt_seconds);

        for placement in &self.placements {
            let index = TileIndex::new(placement.x, placement.y);
            world.place(index, &placement.object).with_context(|| {
                format!("Failed to place `{}` at {}", placement.object, index)
            })?;
        }
        info!(
            scenario = %self.name,
            width,
            height,
            placements = self.placements.len(),
            "world built"
        );
        Ok(world)
    }

    pub fn input_script(&self) -> InputScript {
        let mut frames: BTreeMap<u64, FrameInput> = BTreeMap::new();
        for touch in &self.script.touches {
            frames
                .entry(touch.tick)
                .or_default()
                .touches
                .push(TouchSample::new(touch.id, touch.x, touch.y, touch.state));
        }
        for tile in &self.script.road_previews {
            frames
                .entry(tile.tick)
                .or_default()
                .road_preview
                .push(TileIndex::new(tile.x, tile.y));
        }
        for tile in &self.script.glowing {
            frames
                .entry(tile.tick)
                .or_default()
                .glowing
                .push(TileIndex::new(tile.x, tile.y));
        }
        InputScript { frames }
    }

    fn revealed(&self, index: TileIndex) -> bool {
        let radius = self.map.reveal_radius;
        self.placements
            .iter()
            .any(|p| p.x.abs_diff(index.x) <= radius && p.y.abs_diff(index.y) <= radius)
    }
}

/// Picks every tile's terrain from the weights, row-major, using the
/// scenario's terrain stream.
pub fn generate_terrain(
    width: u32,
    height: u32,
    weights: &TerrainWeights,
    seed: u64,
) -> Result<Vec<TerrainKind>> {
    let kinds = [TerrainKind::Grass, TerrainKind::Dirt, TerrainKind::Water];
    let dist = WeightedIndex::new([weights.grass, weights.dirt, weights.water])
        .context("terrain weights must include at least one non-zero entry")?;
    let mut manager = RngManager::new(seed);
    let mut rng = manager.stream(TERRAIN_STREAM);
    Ok((0..width as usize * height as usize)
        .map(|_| kinds[dist.sample(&mut rng)])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResourceKind;

    const MINIMAL: &str = r#"
name: tiny
seed: 3
map:
  width: 4
  height: 3
"#;

    #[test]
    fn defaults_fill_in() {
        let scenario = Scenario::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(scenario.dt_seconds, 1.0 / 60.0);
        assert_eq!(scenario.ticks(None), 600);
        assert_eq!(scenario.ticks(Some(5)), 5);
        assert_eq!(scenario.layout(), GridLayout::default());
        assert!(scenario.map.all_visible);
        assert!(scenario.input_script().is_empty());

        let world = scenario.build_world().unwrap();
        assert_eq!(world.grid().bounds(), (4, 3));
        assert!(world
            .grid()
            .tiles()
            .all(|tile| tile.terrain == TerrainKind::Grass && tile.is_visible));
    }

    #[test]
    fn terrain_generation_is_seeded() {
        let weights = TerrainWeights {
            grass: 2,
            dirt: 1,
            water: 1,
        };
        let a = generate_terrain(8, 8, &weights, 42).unwrap();
        let b = generate_terrain(8, 8, &weights, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let zero = TerrainWeights {
            grass: 0,
            dirt: 0,
            water: 0,
        };
        assert!(generate_terrain(2, 2, &zero, 1).is_err());
    }

    #[test]
    fn hidden_maps_reveal_around_placements() {
        let text = r#"
name: fog
seed: 1
map:
  width: 10
  height: 10
  all_visible: false
  reveal_radius: 1
stockpile: [100, 0, 0, 0, 0, 0, 0, 0]
placements:
  - { x: 5, y: 5, object: road }
"#;
        let scenario = Scenario::from_yaml_str(text).unwrap();
        let world = scenario.build_world().unwrap();
        let visible = world.grid().tiles().filter(|t| t.is_visible).count();
        assert_eq!(visible, 9);
        assert!(world.grid().tile(TileIndex::new(4, 6)).unwrap().is_visible);
        assert!(!world.grid().tile(TileIndex::new(3, 5)).unwrap().is_visible);
        assert_eq!(world.stockpile().get(ResourceKind::Gold), 99);
    }

    #[test]
    fn bad_stockpile_and_placements_fail_to_build() {
        let short = format!("{MINIMAL}stockpile: [1, 2]\n");
        assert!(Scenario::from_yaml_str(&short)
            .unwrap()
            .build_world()
            .is_err());

        let broke = format!("{MINIMAL}placements:\n  - {{ x: 0, y: 0, object: log_cabin }}\n");
        let err = Scenario::from_yaml_str(&broke)
            .unwrap()
            .build_world()
            .unwrap_err();
        assert!(format!("{err:#}").contains("insufficient gold"));
    }

    #[test]
    fn built_terrain_follows_row_major_generation_order() {
        let text = format!("{MINIMAL}  terrain: {{ grass: 1, dirt: 1, water: 1 }}\n");
        let scenario = Scenario::from_yaml_str(&text).unwrap();
        let expected =
            generate_terrain(4, 3, &scenario.map.terrain, scenario.seed).unwrap();
        let world = scenario.build_world().unwrap();
        let built: Vec<_> = world.grid().tiles().map(|tile| tile.terrain).collect();
        assert_eq!(built, expected);
        assert_eq!(
            world.grid().tile(TileIndex::new(3, 2)).unwrap().terrain,
            expected[2 * 4 + 3]
        );
    }

    #[test]
    fn step_length_is_bounded() {
        for dt in ["0", "-1.0", ".nan", "1.0e20"] {
            let text = format!("{MINIMAL}dt_seconds: {dt}\n");
            let err = Scenario::from_yaml_str(&text)
                .unwrap()
                .build_world()
                .unwrap_err();
            assert!(format!("{err:#}").contains("dt_seconds"), "{dt}: {err:#}");
        }
        let hour = format!("{MINIMAL}dt_seconds: 3600.0\n");
        assert!(Scenario::from_yaml_str(&hour)
            .unwrap()
            .build_world()
            .is_ok());
    }

    #[test]
    fn script_groups_samples_by_tick() {
        let text = format!(
            "{MINIMAL}script:
  touches:
    - {{ tick: 2, x: 10, y: 20, state: pressed }}
    - {{ tick: 2, id: 1, x: 50, y: 20, state: moved }}
    - {{ tick: 4, x: 10, y: 20, state: released }}
  road_previews:
    - {{ tick: 4, x: 1, y: 1 }}
"
        );
        let script = Scenario::from_yaml_str(&text).unwrap().input_script();
        assert_eq!(script.len(), 2);
        assert_eq!(script.last_tick(), Some(4));
        assert_eq!(script.frame(2).touches.len(), 2);
        assert_eq!(script.frame(4).road_preview, vec![TileIndex::new(1, 1)]);
        assert!(script.frame(3).is_empty());
    }
}
