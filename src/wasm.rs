//! WASM bindings for Tickwire Core.
//!
//! This module provides JavaScript-friendly bindings for running a
//! simulation in a web page.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmSimulation } from 'tickwire_core';
//!
//! await init();
//!
//! const sim = new WasmSimulation(1000, 1000);
//! const sw = sim.add_circuit('switch');
//! const led = sim.add_circuit('led');
//! sim.connect(sw, 'Q', led, 'I');
//! sim.set_tick_interval_ms(100, performance.now());
//!
//! function frame(now) {
//!   sim.poll(now);
//!   requestAnimationFrame(frame);
//! }
//! requestAnimationFrame(frame);
//! ```

use std::time::Duration;

use wasm_bindgen::prelude::*;

use crate::circuit::{CircuitId, PinRef};
use crate::save::SaveOptions;
use crate::sim::{Controller, SimulationConfig};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(err: crate::error::SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_secs_f64(ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// WASM-compatible logic simulation.
///
/// Wraps a [`Controller`]; time arguments are milliseconds as returned by
/// `performance.now()`.
#[wasm_bindgen]
pub struct WasmSimulation {
    controller: Controller,
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Create an empty simulation with the given world size.
    #[wasm_bindgen(constructor)]
    pub fn new(world_width: f64, world_height: f64) -> WasmSimulation {
        let config = SimulationConfig::new().with_world_size(world_width, world_height);
        WasmSimulation {
            controller: Controller::new(&config),
        }
    }

    /// Replace the simulation with a save (plain JSON or compressed).
    #[wasm_bindgen]
    pub fn load(&mut self, text: &str) -> Result<(), JsValue> {
        self.controller.load_str(text).map_err(to_js)
    }

    /// Export the simulation.
    #[wasm_bindgen]
    pub fn save(&mut self, include_state: bool, compress: bool) -> Result<String, JsValue> {
        let options = SaveOptions::new()
            .with_state(include_state)
            .with_compression(compress);
        self.controller.save_string(&options).map_err(to_js)
    }

    /// Run a single tick.
    #[wasm_bindgen]
    pub fn tick(&mut self) {
        self.controller.step();
    }

    #[wasm_bindgen(getter)]
    pub fn current_tick(&self) -> f64 {
        self.controller.simulation().current_tick() as f64
    }

    #[wasm_bindgen(getter)]
    pub fn circuit_count(&self) -> usize {
        self.controller.simulation().circuit_count()
    }

    /// Add a circuit by type name, returning its id.
    #[wasm_bindgen]
    pub fn add_circuit(&mut self, type_name: &str) -> Result<u32, JsValue> {
        self.controller
            .simulation_mut()
            .add_new(type_name)
            .map(|id| id.0)
            .map_err(to_js)
    }

    /// Toggle the link between two pins. Returns whether they are now linked.
    #[wasm_bindgen]
    pub fn connect(
        &mut self,
        a_id: u32,
        a_pin: &str,
        b_id: u32,
        b_pin: &str,
    ) -> Result<bool, JsValue> {
        let a = PinRef::new(CircuitId(a_id), a_pin);
        let b = PinRef::new(CircuitId(b_id), b_pin);
        self.controller
            .simulation_mut()
            .connect(&a, &b, None)
            .map_err(to_js)
    }

    /// Set a switch on or off.
    #[wasm_bindgen]
    pub fn set_switch(&mut self, id: u32, on: bool) -> Result<(), JsValue> {
        self.controller
            .simulation_mut()
            .set_switch(CircuitId(id), on)
            .map_err(to_js)
    }

    /// Pointer down on a switch: flips a toggle switch, holds a momentary one.
    #[wasm_bindgen]
    pub fn press_switch(&mut self, id: u32) -> Result<(), JsValue> {
        let sim = self.controller.simulation_mut();
        let id = CircuitId(id);
        let toggle = match sim.circuit(id).map(|c| c.kind()) {
            Some(crate::components::CircuitKind::Switch(switch)) => switch.is_toggle(),
            _ => false,
        };
        if toggle {
            sim.toggle_switch(id).map(|_| ()).map_err(to_js)
        } else {
            sim.press_switch(id).map_err(to_js)
        }
    }

    /// Pointer up on a switch. Only momentary switches react.
    #[wasm_bindgen]
    pub fn release_switch(&mut self, id: u32) -> Result<(), JsValue> {
        let sim = self.controller.simulation_mut();
        let id = CircuitId(id);
        let toggle = matches!(
            sim.circuit(id).map(|c| c.kind()),
            Some(crate::components::CircuitKind::Switch(switch)) if switch.is_toggle()
        );
        if toggle {
            return Ok(());
        }
        sim.release_switch(id).map_err(to_js)
    }

    /// Start automatic ticking, or stop it with an interval of 0.
    #[wasm_bindgen]
    pub fn set_tick_interval_ms(&mut self, interval_ms: f64, now_ms: f64) {
        let interval = Some(millis(interval_ms));
        self.controller.set_tick_interval(interval, millis(now_ms));
    }

    /// Run a tick if one is due. Returns whether a tick ran.
    #[wasm_bindgen]
    pub fn poll(&mut self, now_ms: f64) -> bool {
        self.controller.poll(millis(now_ms))
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Save format version written by this build.
#[wasm_bindgen]
pub fn save_version() -> u32 {
    crate::save::SAVE_VERSION
}
