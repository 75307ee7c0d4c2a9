//! Simulation engine.
//!
//! ## Tick protocol
//!
//! Every tick runs in two phases:
//!
//! ```text
//! 1. networks  <- OR of member pin outputs       (snapshot of the last tick)
//! 2. circuits  <- variant.tick(inputs from 1)    (in id order)
//! ```
//!
//! Circuits only ever see the network snapshot taken in phase 1, so a value
//! written by one circuit reaches the next one on the following tick. Each
//! hop through the link graph costs exactly one tick.

mod network;
mod scheduler;
mod simulation;

pub use network::{Network, NetworkManager};
pub use scheduler::{Controller, TickScheduler};
pub use simulation::Simulation;

use std::time::Duration;

use crate::circuit::{Circuit, CircuitId};

/// Default world width.
pub const DEFAULT_WORLD_WIDTH: f64 = 1000.0;

/// Default world height.
pub const DEFAULT_WORLD_HEIGHT: f64 = 1000.0;

/// Read-only view handed to circuits while they tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Network levels evaluated at the start of this tick
    pub networks: &'a NetworkManager,
    /// Number of the tick being run
    pub tick: u64,
}

impl<'a> TickContext<'a> {
    pub fn new(networks: &'a NetworkManager, tick: u64) -> Self {
        Self { networks, tick }
    }
}

/// Configuration for a simulation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// World width (presentation bound only).
    pub world_width: f64,
    /// World height (presentation bound only).
    pub world_height: f64,
    /// Automatic tick interval, `None` to tick only on demand.
    pub tick_interval: Option<Duration>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world_width: DEFAULT_WORLD_WIDTH,
            world_height: DEFAULT_WORLD_HEIGHT,
            tick_interval: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the world size.
    pub fn with_world_size(mut self, width: f64, height: f64) -> Self {
        self.world_width = width;
        self.world_height = height;
        self
    }

    /// Set the automatic tick interval.
    ///
    /// A zero interval disables automatic ticking.
    pub fn with_tick_interval(mut self, interval: Option<Duration>) -> Self {
        self.tick_interval = interval.filter(|i| !i.is_zero());
        self
    }
}

/// Presentation layer hooks.
///
/// The simulation calls these as circuits come and go and as their visible
/// state changes. It never waits on them and works without any sink.
pub trait DrawSink {
    /// A circuit was added or loaded.
    fn attach(&mut self, circuit: &Circuit);

    /// A circuit was removed.
    fn detach(&mut self, id: CircuitId);

    /// A circuit's visible state changed.
    fn refresh(&mut self, _circuit: &Circuit) {}

    /// Networks were rebuilt after a wiring change.
    fn links_changed(&mut self, _networks: &NetworkManager) {}

    /// Circuits were renumbered; pairs are `(old, new)`.
    fn renumbered(&mut self, _mapping: &[(CircuitId, CircuitId)]) {}
}
