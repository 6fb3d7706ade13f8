pub mod animation;
pub mod autotile;
pub mod catalog;
pub mod cycle;
pub mod draw;
pub mod engine;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod interaction;
pub mod ledger;
pub mod rng;
pub mod scenario;
pub mod systems;
pub mod tile;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, TickReport};
pub use scenario::{Scenario, ScenarioLoader};
pub use world::World;
