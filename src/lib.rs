//! # Tickwire Core
//!
//! A tick-based digital logic circuit simulator.
//!
//! This library provides:
//! - Circuits with named pins joined by symmetric links
//! - Networks of linked pins evaluated as a wired OR
//! - Switches, clocks, logic gates, latches, flip-flops, LEDs and 7-segment parts
//! - A JSON save format with optional lz-string compression
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Circuit container, pins, links and link validation
//! - [`components`] - Circuit variant models and the type registry
//! - [`sim`] - Networks, the simulation container and the tick scheduler
//! - [`save`] - Persisted document types and the save codec
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! tickwire adder.json --ticks 20 --output adder-after.json --include-state
//! ```
//!
//! ### Library
//!
//! ```
//! use tickwire_core::{PinRef, Simulation};
//!
//! let mut sim = Simulation::new();
//! let switch = sim.add_new("switch").unwrap();
//! let led = sim.add_new("led").unwrap();
//! sim.connect(&PinRef::new(switch, "Q"), &PinRef::new(led, "I"), None).unwrap();
//!
//! sim.set_switch(switch, true).unwrap();
//! sim.tick();
//! assert_eq!(sim.circuit(led).unwrap().is_on(), Some(true));
//! ```
//!
//! ## Simulation Method
//!
//! Time advances in discrete ticks. On every tick:
//!
//! 1. Each network becomes active if any member pin drives it high
//! 2. Every circuit, in id order, reads its inputs and writes its outputs
//!
//! Outputs written in step 2 are only seen by the next tick's step 1, so a
//! signal takes one tick per circuit it passes through.

pub mod circuit;
pub mod components;
pub mod error;
pub mod save;
pub mod sim;

// Re-export main types for convenience
pub use circuit::{Circuit, CircuitId, PinRef};
pub use components::{create_circuit, CircuitKind, CircuitType};
pub use error::{Result, SimError};
pub use save::{SaveOptions, SaveSimulation, SAVE_VERSION};
pub use sim::{Controller, DrawSink, Simulation, SimulationConfig};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmSimulation;
