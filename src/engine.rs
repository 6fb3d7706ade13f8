use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    input::{Camera, FrameInput, Hud, HudLayout, ViewCamera},
    rng::{RngManager, SystemRng},
    systems::{AnimationSystem, AutotileSystem, EconomySystem, InteractionSystem},
    tile::TileIndex,
    world::{TickEvents, World},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
    camera: ViewCamera,
    hud: HudLayout,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
            camera: ViewCamera::default(),
            hud: HudLayout::default(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Input, autotiling, economy, then animation: the per-tick order.
    pub fn with_default_systems(self) -> Self {
        self.with_system(InteractionSystem::new())
            .with_system(AutotileSystem::new())
            .with_system(EconomySystem::new())
            .with_system(AnimationSystem::new())
    }

    pub fn with_camera(mut self, camera: ViewCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_hud(mut self, hud: HudLayout) -> Self {
        self.hud = hud;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            camera: self.camera,
            hud: self.hud,
            settings: self.settings,
        }
    }
}

/// What one tick produced, handed to run hooks.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub events: TickEvents,
    pub hovered: Option<TileIndex>,
    pub selected: Option<TileIndex>,
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    camera: ViewCamera,
    hud: HudLayout,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn camera_mut(&mut self) -> &mut ViewCamera {
        &mut self.camera
    }

    pub fn hud_mut(&mut self) -> &mut HudLayout {
        &mut self.hud
    }

    /// Runs every system once against this frame's input.
    pub fn step(&mut self, world: &mut World, input: &FrameInput) -> Result<TickReport> {
        let current_tick = world.tick();
        world.events.clear();
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: current_tick,
                dt_seconds: world.dt_seconds(),
                scenario_name: &self.settings.scenario_name,
                input,
                camera: &self.camera,
                hud: &self.hud,
            };
            system.run(&ctx, world, &mut rng_stream)?;
        }
        world.advance_time();

        let report = TickReport {
            tick: current_tick,
            events: world.events.clone(),
            hovered: world.grid.hovered(),
            selected: world.grid.selected(),
        };
        if !report.events.clicked.is_empty() {
            debug!(tick = current_tick, clicked = ?report.events.clicked, "tiles clicked");
        }
        Ok(report)
    }

    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        self.run_with_hook(world, ticks, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, hook: F) -> Result<()>
    where
        F: FnMut(&TickReport),
    {
        self.run_with_input(world, ticks, |_| FrameInput::default(), hook)
    }

    /// Runs `ticks` ticks, asking `input` for each tick's frame input.
    pub fn run_with_input<I, F>(
        &mut self,
        world: &mut World,
        ticks: u64,
        mut input: I,
        mut hook: F,
    ) -> Result<()>
    where
        I: FnMut(u64) -> FrameInput,
        F: FnMut(&TickReport),
    {
        info!(
            scenario = %self.settings.scenario_name,
            seed = self.settings.seed,
            ticks,
            "simulation started"
        );
        for _ in 0..ticks {
            let frame = input(world.tick());
            let report = self.step(world, &frame)?;
            hook(&report);
        }
        info!(
            scenario = %self.settings.scenario_name,
            tick = world.tick(),
            cycles = world.stockpile().cycles_applied(),
            "simulation finished"
        );
        Ok(())
    }
}

pub struct SystemContext<'a> {
    pub tick: u64,
    pub dt_seconds: f64,
    pub scenario_name: &'a str,
    pub input: &'a FrameInput,
    pub camera: &'a dyn Camera,
    pub hud: &'a dyn Hud,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
