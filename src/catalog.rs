//! Building and resource catalog
//!
//! The catalog is loaded once at startup and treated as read-only afterwards.
//! Every malformed entry is rejected here so per-tick code never has to
//! re-validate vectors or cycle times.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const RESOURCE_COUNT: usize = 8;

const DEFAULT_TEXTURE_INDEX: u32 = 1;
const DEFAULT_CYCLE_TIME: f64 = 10.0;
const DEFAULT_FRAME_TIME: f64 = 0.25;
const DEFAULT_DESTRUCTION_FRAMES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    Wood,
    Coal,
    Iron,
    Stone,
    Workers,
    Energy,
    Food,
}

impl ResourceKind {
    /// Fixed vector order shared by every resource vector.
    pub const ALL: [ResourceKind; RESOURCE_COUNT] = [
        ResourceKind::Gold,
        ResourceKind::Wood,
        ResourceKind::Coal,
        ResourceKind::Iron,
        ResourceKind::Stone,
        ResourceKind::Workers,
        ResourceKind::Energy,
        ResourceKind::Food,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Gold => "gold",
            ResourceKind::Wood => "wood",
            ResourceKind::Coal => "coal",
            ResourceKind::Iron => "iron",
            ResourceKind::Stone => "stone",
            ResourceKind::Workers => "workers",
            ResourceKind::Energy => "energy",
            ResourceKind::Food => "food",
        }
    }
}

/// Eight non-negative amounts, one per [`ResourceKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceVector([u32; RESOURCE_COUNT]);

impl ResourceVector {
    pub const ZERO: ResourceVector = ResourceVector([0; RESOURCE_COUNT]);

    pub fn new(amounts: [u32; RESOURCE_COUNT]) -> Self {
        Self(amounts)
    }

    pub fn with(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.0[kind.index()] = amount;
        self
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.0[kind.index()]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|amount| *amount == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        ResourceKind::ALL
            .iter()
            .map(move |kind| (*kind, self.0[kind.index()]))
    }

    pub fn as_array(&self) -> &[u32; RESOURCE_COUNT] {
        &self.0
    }

    /// Validates a raw config vector: exactly eight components, none negative.
    pub fn from_config(
        object: &str,
        field: &'static str,
        raw: &[i64],
    ) -> Result<Self, CatalogError> {
        if raw.len() != RESOURCE_COUNT {
            return Err(CatalogError::VectorLength {
                object: object.to_string(),
                field,
                len: raw.len(),
            });
        }
        let mut amounts = [0_u32; RESOURCE_COUNT];
        for (index, value) in raw.iter().enumerate() {
            amounts[index] = u32::try_from(*value).map_err(|_| CatalogError::InvalidComponent {
                object: object.to_string(),
                field,
                resource: ResourceKind::ALL[index].name(),
                value: *value,
            })?;
        }
        Ok(Self(amounts))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Resource,
    Building,
}

impl ObjectKind {
    /// Numeric type id (0 is reserved for "no object").
    pub fn type_id(self) -> u32 {
        match self {
            ObjectKind::Resource => 1,
            ObjectKind::Building => 2,
        }
    }
}

/// Catalog key: object ids are unique within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub object_id: u32,
}

impl ObjectKey {
    pub fn building(object_id: u32) -> Self {
        Self {
            kind: ObjectKind::Building,
            object_id,
        }
    }

    pub fn resource(object_id: u32) -> Self {
        Self {
            kind: ObjectKind::Resource,
            object_id,
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.type_id(), self.object_id)
    }
}

/// Per-cycle upkeep and one-time placement cost. Only buildings carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingCosts {
    pub per_cycle: ResourceVector,
    pub upfront: ResourceVector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    pub id: u32,
    pub key: ObjectKey,
    pub name: String,
    pub texture_index: u32,
    pub cycle_time: f64,
    pub output: ResourceVector,
    pub costs: Option<BuildingCosts>,
}

impl ObjectTemplate {
    pub fn per_cycle_cost(&self) -> ResourceVector {
        self.costs.map(|c| c.per_cycle).unwrap_or(ResourceVector::ZERO)
    }

    pub fn upfront_cost(&self) -> ResourceVector {
        self.costs.map(|c| c.upfront).unwrap_or(ResourceVector::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationSpec {
    pub frame_count: u32,
    #[serde(default = "default_frame_time")]
    pub frame_time: f64,
}

fn default_frame_time() -> f64 {
    DEFAULT_FRAME_TIME
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{object}: `{field}` must have 8 components, found {len}")]
    VectorLength {
        object: String,
        field: &'static str,
        len: usize,
    },
    #[error("{object}: `{field}` {resource} component {value} is out of range")]
    InvalidComponent {
        object: String,
        field: &'static str,
        resource: &'static str,
        value: i64,
    },
    #[error("{object}: cycle time must be a positive finite number of seconds, got {value}")]
    InvalidCycleTime { object: String, value: f64 },
    #[error("{object}: resources cannot declare costs")]
    ResourceWithCosts { object: String },
    #[error("duplicate catalog key {0}")]
    DuplicateKey(ObjectKey),
    #[error("duplicate catalog name `{0}`")]
    DuplicateName(String),
    #[error("road entry `{0}` is not a building in this catalog")]
    InvalidRoad(String),
    #[error("animation for texture {texture} must have at least one frame and a positive frame time")]
    InvalidAnimation { texture: u32 },
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone)]
pub struct Catalog {
    templates: HashMap<ObjectKey, ObjectTemplate>,
    names: HashMap<String, ObjectKey>,
    road: ObjectKey,
    animations: HashMap<u32, AnimationSpec>,
    destruction: AnimationSpec,
}

impl Catalog {
    fn new(road: ObjectKey, destruction: AnimationSpec) -> Self {
        Self {
            templates: HashMap::new(),
            names: HashMap::new(),
            road,
            animations: HashMap::new(),
            destruction,
        }
    }

    /// Catalog shipped with the game.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::new(
            ObjectKey::building(3),
            AnimationSpec {
                frame_count: DEFAULT_DESTRUCTION_FRAMES,
                frame_time: DEFAULT_FRAME_TIME,
            },
        );
        let entries = [
            ObjectTemplate {
                id: 201,
                key: ObjectKey::building(1),
                name: "log_cabin".into(),
                texture_index: 12,
                cycle_time: 30.0,
                output: ResourceVector::ZERO.with(ResourceKind::Wood, 5),
                costs: Some(BuildingCosts {
                    per_cycle: ResourceVector::ZERO
                        .with(ResourceKind::Workers, 2)
                        .with(ResourceKind::Energy, 1),
                    upfront: ResourceVector::ZERO
                        .with(ResourceKind::Gold, 30)
                        .with(ResourceKind::Workers, 2)
                        .with(ResourceKind::Energy, 1),
                }),
            },
            ObjectTemplate {
                id: 202,
                key: ObjectKey::building(2),
                name: "low_house".into(),
                texture_index: 11,
                cycle_time: 30.0,
                output: ResourceVector::ZERO
                    .with(ResourceKind::Wood, 5)
                    .with(ResourceKind::Workers, 2),
                costs: Some(BuildingCosts {
                    per_cycle: ResourceVector::ZERO
                        .with(ResourceKind::Energy, 1)
                        .with(ResourceKind::Food, 2),
                    upfront: ResourceVector::ZERO
                        .with(ResourceKind::Energy, 1)
                        .with(ResourceKind::Food, 2),
                }),
            },
            ObjectTemplate {
                id: 203,
                key: ObjectKey::building(3),
                name: "road".into(),
                texture_index: 26,
                cycle_time: 30.0,
                output: ResourceVector::ZERO,
                costs: Some(BuildingCosts {
                    per_cycle: ResourceVector::ZERO,
                    upfront: ResourceVector::ZERO.with(ResourceKind::Gold, 1),
                }),
            },
            ObjectTemplate {
                id: 210,
                key: ObjectKey::building(10),
                name: "town_hall".into(),
                texture_index: 10,
                cycle_time: 30.0,
                output: ResourceVector::new([30, 10, 0, 0, 0, 10, 25, 10]),
                costs: Some(BuildingCosts::default()),
            },
            ObjectTemplate {
                id: 101,
                key: ObjectKey::resource(1),
                name: "tree".into(),
                texture_index: 5,
                cycle_time: DEFAULT_CYCLE_TIME,
                output: ResourceVector::ZERO.with(ResourceKind::Wood, 1),
                costs: None,
            },
            ObjectTemplate {
                id: 102,
                key: ObjectKey::resource(2),
                name: "ore".into(),
                texture_index: 6,
                cycle_time: DEFAULT_CYCLE_TIME,
                output: ResourceVector::ZERO
                    .with(ResourceKind::Stone, 1)
                    .with(ResourceKind::Iron, 1),
                costs: None,
            },
        ];
        for template in entries {
            catalog.names.insert(template.name.clone(), template.key);
            catalog.templates.insert(template.key, template);
        }
        catalog.animations.insert(
            10,
            AnimationSpec {
                frame_count: 4,
                frame_time: DEFAULT_FRAME_TIME,
            },
        );
        catalog
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(text)?;
        file.into_catalog()
    }

    pub fn lookup(&self, key: ObjectKey) -> Option<&ObjectTemplate> {
        self.templates.get(&key)
    }

    pub fn by_name(&self, name: &str) -> Option<&ObjectTemplate> {
        self.names.get(name).and_then(|key| self.templates.get(key))
    }

    pub fn road_key(&self) -> ObjectKey {
        self.road
    }

    pub fn is_road(&self, key: ObjectKey) -> bool {
        key == self.road
    }

    pub fn animation_for(&self, texture_index: u32) -> Option<AnimationSpec> {
        self.animations.get(&texture_index).copied()
    }

    pub fn destruction_effect(&self) -> AnimationSpec {
        self.destruction
    }

    pub fn templates(&self) -> impl Iterator<Item = &ObjectTemplate> {
        self.templates.values()
    }

    pub fn animations(&self) -> impl Iterator<Item = (u32, AnimationSpec)> + '_ {
        self.animations.iter().map(|(texture, spec)| (*texture, *spec))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    road: String,
    #[serde(default)]
    destruction: Option<AnimationSpec>,
    #[serde(default)]
    animations: Vec<AnimationEntry>,
    objects: Vec<ObjectEntry>,
}

#[derive(Debug, Deserialize)]
struct AnimationEntry {
    texture: u32,
    frame_count: u32,
    #[serde(default = "default_frame_time")]
    frame_time: f64,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
    #[serde(default)]
    id: u32,
    kind: ObjectKind,
    object_id: u32,
    #[serde(default = "default_texture_index")]
    texture: u32,
    #[serde(default = "default_cycle_time")]
    cycle_time: f64,
    output: Vec<i64>,
    #[serde(default)]
    cost: Option<Vec<i64>>,
    #[serde(default)]
    upfront: Option<Vec<i64>>,
}

fn default_texture_index() -> u32 {
    DEFAULT_TEXTURE_INDEX
}

fn default_cycle_time() -> f64 {
    DEFAULT_CYCLE_TIME
}

impl ObjectEntry {
    fn into_template(self) -> Result<ObjectTemplate, CatalogError> {
        if !(self.cycle_time.is_finite() && self.cycle_time > 0.0) {
            return Err(CatalogError::InvalidCycleTime {
                object: self.name,
                value: self.cycle_time,
            });
        }
        let output = ResourceVector::from_config(&self.name, "output", &self.output)?;
        let costs = match self.kind {
            ObjectKind::Resource => {
                if self.cost.is_some() || self.upfront.is_some() {
                    return Err(CatalogError::ResourceWithCosts { object: self.name });
                }
                None
            }
            ObjectKind::Building => {
                let per_cycle = match &self.cost {
                    Some(raw) => ResourceVector::from_config(&self.name, "cost", raw)?,
                    None => ResourceVector::ZERO,
                };
                let upfront = match &self.upfront {
                    Some(raw) => ResourceVector::from_config(&self.name, "upfront", raw)?,
                    None => ResourceVector::ZERO,
                };
                Some(BuildingCosts { per_cycle, upfront })
            }
        };
        Ok(ObjectTemplate {
            id: self.id,
            key: ObjectKey {
                kind: self.kind,
                object_id: self.object_id,
            },
            name: self.name,
            texture_index: self.texture,
            cycle_time: self.cycle_time,
            output,
            costs,
        })
    }
}

impl CatalogFile {
    fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let destruction = self.destruction.unwrap_or(AnimationSpec {
            frame_count: DEFAULT_DESTRUCTION_FRAMES,
            frame_time: DEFAULT_FRAME_TIME,
        });
        validate_animation(0, destruction)?;

        let mut templates = HashMap::new();
        let mut names = HashMap::new();
        for entry in self.objects {
            let template = entry.into_template()?;
            if names.contains_key(&template.name) {
                return Err(CatalogError::DuplicateName(template.name));
            }
            if templates.contains_key(&template.key) {
                return Err(CatalogError::DuplicateKey(template.key));
            }
            names.insert(template.name.clone(), template.key);
            templates.insert(template.key, template);
        }

        let road = match names.get(&self.road) {
            Some(key) if key.kind == ObjectKind::Building => *key,
            _ => return Err(CatalogError::InvalidRoad(self.road)),
        };

        let mut animations = HashMap::new();
        for entry in self.animations {
            let spec = AnimationSpec {
                frame_count: entry.frame_count,
                frame_time: entry.frame_time,
            };
            validate_animation(entry.texture, spec)?;
            animations.insert(entry.texture, spec);
        }

        Ok(Catalog {
            templates,
            names,
            road,
            animations,
            destruction,
        })
    }
}

fn validate_animation(texture: u32, spec: AnimationSpec) -> Result<(), CatalogError> {
    if spec.frame_count == 0 || !(spec.frame_time.is_finite() && spec.frame_time > 0.0) {
        return Err(CatalogError::InvalidAnimation { texture });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
road: street
destruction:
  frame_count: 3
animations:
  - texture: 40
    frame_count: 2
objects:
  - name: street
    kind: building
    object_id: 7
    texture: 26
    output: [0, 0, 0, 0, 0, 0, 0, 0]
  - name: quarry
    kind: building
    object_id: 8
    cycle_time: 20
    cost: [0, 0, 0, 0, 0, 3, 0, 0]
    output: [0, 0, 0, 0, 4, 0, 0, 0]
    upfront: [50, 0, 0, 0, 0, 0, 0, 0]
  - name: berries
    kind: resource
    object_id: 7
    output: [0, 0, 0, 0, 0, 0, 0, 1]
"#;

    #[test]
    fn builtin_catalog_has_road_and_town_hall() {
        let catalog = Catalog::builtin();
        let road = catalog.lookup(catalog.road_key()).expect("road entry");
        assert_eq!(road.texture_index, 26);
        let hall = catalog.by_name("town_hall").expect("town hall");
        assert_eq!(hall.output.get(ResourceKind::Energy), 25);
        assert!(hall.per_cycle_cost().is_zero());
        let cabin = catalog.by_name("log_cabin").unwrap();
        assert_eq!(cabin.upfront_cost().get(ResourceKind::Gold), 30);
    }

    #[test]
    fn parses_catalog_file() {
        let catalog = Catalog::from_yaml_str(CATALOG).expect("valid catalog");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.road_key(), ObjectKey::building(7));
        assert!(catalog.lookup(ObjectKey::resource(7)).is_some());
        let quarry = catalog.by_name("quarry").unwrap();
        assert_eq!(quarry.cycle_time, 20.0);
        assert_eq!(quarry.per_cycle_cost().get(ResourceKind::Workers), 3);
        assert_eq!(catalog.animation_for(40).map(|a| a.frame_count), Some(2));
        assert_eq!(catalog.destruction_effect().frame_count, 3);
        let berries = catalog.by_name("berries").unwrap();
        assert_eq!(berries.texture_index, DEFAULT_TEXTURE_INDEX);
        assert!(berries.costs.is_none());
    }

    #[test]
    fn rejects_short_vector() {
        let text = CATALOG.replace("[0, 0, 0, 0, 4, 0, 0, 0]", "[0, 0, 4]");
        let err = Catalog::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CatalogError::VectorLength { len: 3, .. }));
    }

    #[test]
    fn rejects_negative_component() {
        let text = CATALOG.replace("[50, 0, 0, 0, 0, 0, 0, 0]", "[-50, 0, 0, 0, 0, 0, 0, 0]");
        let err = Catalog::from_yaml_str(&text).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidComponent {
                resource: "gold",
                value: -50,
                ..
            }
        ));
    }

    #[test]
    fn rejects_zero_cycle_time() {
        let text = CATALOG.replace("cycle_time: 20", "cycle_time: 0");
        let err = Catalog::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCycleTime { .. }));
    }

    #[test]
    fn rejects_resource_with_costs() {
        let text = CATALOG.replace(
            "output: [0, 0, 0, 0, 0, 0, 0, 1]",
            "output: [0, 0, 0, 0, 0, 0, 0, 1]\n    upfront: [1, 0, 0, 0, 0, 0, 0, 0]",
        );
        let err = Catalog::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CatalogError::ResourceWithCosts { .. }));
    }

    #[test]
    fn rejects_resource_as_road() {
        let text = CATALOG.replace("road: street", "road: berries");
        let err = Catalog::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRoad(name) if name == "berries"));
    }

    #[test]
    fn rejects_duplicate_keys() {
        let text = CATALOG.replace("object_id: 8", "object_id: 7");
        let err = Catalog::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey(_)));
    }
}
