//! The simulation: circuits, wiring, networks and the tick counter.

use std::collections::BTreeMap;
use std::fmt;

use super::{DrawSink, NetworkManager, SimulationConfig, TickContext};
use crate::circuit::{
    self, remap_ids, rename_links, unlink_circuit, validate_links, Circuit, CircuitId, CircuitMap,
    PinRef,
};
use crate::components::CircuitType;
use crate::error::{Result, SimError};
use crate::save::{SaveSimulation, SAVE_VERSION};

/// A tick-based logic simulation.
///
/// The simulation is the sole owner of its circuits. Pins, links and
/// networks refer to circuits by id only.
pub struct Simulation {
    circuits: CircuitMap,
    next_id: u32,
    networks: NetworkManager,
    world_width: f64,
    world_height: f64,
    current_tick: u64,
    sink: Option<Box<dyn DrawSink>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("circuits", &self.circuits.len())
            .field("next_id", &self.next_id)
            .field("networks", &self.networks.len())
            .field("world_width", &self.world_width)
            .field("world_height", &self.world_height)
            .field("current_tick", &self.current_tick)
            .finish_non_exhaustive()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create an empty simulation with default configuration.
    pub fn new() -> Self {
        Self::with_config(&SimulationConfig::default())
    }

    /// Create an empty simulation with custom configuration.
    pub fn with_config(config: &SimulationConfig) -> Self {
        Self {
            circuits: CircuitMap::new(),
            next_id: 1,
            networks: NetworkManager::new(),
            world_width: config.world_width,
            world_height: config.world_height,
            current_tick: 0,
            sink: None,
        }
    }

    /// Install a presentation sink. Circuits already present are attached.
    pub fn set_draw_sink(&mut self, mut sink: Box<dyn DrawSink>) {
        for circuit in self.circuits.values() {
            sink.attach(circuit);
        }
        sink.links_changed(&self.networks);
        self.sink = Some(sink);
    }

    /// Remove the presentation sink.
    pub fn take_draw_sink(&mut self) -> Option<Box<dyn DrawSink>> {
        self.sink.take()
    }

    pub fn circuits(&self) -> &CircuitMap {
        &self.circuits
    }

    pub fn circuit(&self, id: CircuitId) -> Option<&Circuit> {
        self.circuits.get(&id)
    }

    /// Mutable access to a circuit.
    ///
    /// Wiring is not reachable through [`Circuit`]; use [`Simulation::connect`].
    pub fn circuit_mut(&mut self, id: CircuitId) -> Result<&mut Circuit> {
        self.circuits
            .get_mut(&id)
            .ok_or(SimError::CircuitNotFound { id })
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    pub fn networks(&self) -> &NetworkManager {
        &self.networks
    }

    /// Number of ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn world_size(&self) -> (f64, f64) {
        (self.world_width, self.world_height)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.world_width = width;
        self.world_height = height;
    }

    /// Add a circuit, returning its new id.
    ///
    /// Links the circuit carries (for example on a clone of an attached
    /// circuit) are dropped; the new circuit starts unwired.
    pub fn add_circuit(&mut self, mut circuit: Circuit) -> Result<CircuitId> {
        let mut dropped = 0;
        for pin in circuit.pins_mut().iter_mut() {
            dropped += pin.links.len();
            pin.links.clear();
            pin.network = None;
        }
        if dropped > 0 {
            log::warn!("Dropped {dropped} links carried by an added circuit");
        }

        let id = CircuitId(self.next_id);
        self.next_id += 1;
        circuit.set_id(id);
        if let Some(sink) = &mut self.sink {
            sink.attach(&circuit);
        }
        self.circuits.insert(id, circuit);
        log::debug!("Added circuit #{id}");
        self.rebuild_networks()?;
        Ok(id)
    }

    /// Create a circuit from the registry and add it.
    pub fn add_new(&mut self, type_name: &str) -> Result<CircuitId> {
        let circuit_type =
            CircuitType::from_type_name(type_name).ok_or_else(|| SimError::UnknownCircuitType {
                type_name: type_name.to_string(),
            })?;
        self.add_circuit(Circuit::new(circuit_type.instantiate()))
    }

    /// Remove a circuit, unlinking all of its pins.
    ///
    /// Removing an id that is not attached is an error.
    pub fn remove_circuit(&mut self, id: CircuitId) -> Result<Circuit> {
        if !self.circuits.contains_key(&id) {
            return Err(SimError::CircuitNotFound { id });
        }
        unlink_circuit(&mut self.circuits, id);
        let mut circuit = self
            .circuits
            .remove(&id)
            .ok_or(SimError::CircuitNotFound { id })?;
        circuit.set_id(CircuitId::DETACHED);
        if let Some(sink) = &mut self.sink {
            sink.detach(id);
        }
        log::debug!("Removed circuit #{id}");
        self.rebuild_networks()?;
        Ok(circuit)
    }

    /// Remove every circuit.
    pub fn clear(&mut self) {
        if let Some(sink) = &mut self.sink {
            for id in self.circuits.keys() {
                sink.detach(*id);
            }
        }
        self.circuits.clear();
        self.networks.clear();
        self.next_id = 1;
    }

    /// Renumber circuits to `1..=N`, keeping their order.
    pub fn compact_ids(&mut self) {
        let mapping: BTreeMap<CircuitId, CircuitId> = self
            .circuits
            .keys()
            .zip(1..)
            .map(|(old, new)| (*old, CircuitId(new)))
            .collect();
        self.next_id = self.circuits.len() as u32 + 1;

        let moved: Vec<(CircuitId, CircuitId)> = mapping
            .iter()
            .filter(|(old, new)| old != new)
            .map(|(old, new)| (*old, *new))
            .collect();
        if moved.is_empty() {
            return;
        }

        let circuits = std::mem::take(&mut self.circuits);
        self.circuits = remap_ids(circuits, &mapping);
        self.networks.remap(&mapping);
        log::debug!("Compacted ids, {} circuits renumbered", moved.len());
        if let Some(sink) = &mut self.sink {
            sink.renumbered(&moved);
        }
    }

    /// Link, unlink or toggle the link between two pins.
    ///
    /// `desired` of `Some(true)` only links, `Some(false)` only unlinks and
    /// `None` toggles. Pins on the same circuit are never linked. Networks are
    /// rebuilt when the wiring changes.
    ///
    /// Returns whether the wiring changed.
    pub fn connect(&mut self, a: &PinRef, b: &PinRef, desired: Option<bool>) -> Result<bool> {
        let changed = circuit::connect(&mut self.circuits, a, b, desired)?;
        if changed {
            log::debug!("Toggled link {a} <-> {b}");
            self.rebuild_networks()?;
        }
        Ok(changed)
    }

    /// Rebuild all networks from the current links.
    pub fn rebuild_networks(&mut self) -> Result<()> {
        self.networks.recreate(&mut self.circuits)?;
        if let Some(sink) = &mut self.sink {
            sink.links_changed(&self.networks);
        }
        Ok(())
    }

    /// Check that every link is symmetric and points at an existing pin.
    pub fn validate(&self) -> Result<()> {
        validate_links(&self.circuits)
    }

    /// Run one tick.
    pub fn tick(&mut self) {
        self.current_tick += 1;
        self.networks.evaluate(&self.circuits);
        let ctx = TickContext::new(&self.networks, self.current_tick);
        for circuit in self.circuits.values_mut() {
            circuit.tick(&ctx);
        }
        self.update(false);
    }

    /// Run `count` ticks.
    pub fn run(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Send dirty circuits (or every circuit, when forced) to the draw sink
    /// and clear their dirty flags.
    pub fn update(&mut self, force: bool) {
        for circuit in self.circuits.values_mut() {
            if circuit.take_update(force) {
                if let Some(sink) = &mut self.sink {
                    sink.refresh(circuit);
                }
            }
        }
    }

    /// Set a switch. Its outputs change now and reach the networks on the
    /// next tick.
    pub fn set_switch(&mut self, id: CircuitId, on: bool) -> Result<()> {
        self.circuit_mut(id)?.set_switch(on)
    }

    /// Flip a toggle switch, returning its new state.
    pub fn toggle_switch(&mut self, id: CircuitId) -> Result<bool> {
        self.circuit_mut(id)?.toggle_switch()
    }

    /// Press a momentary switch. It stays on until released.
    pub fn press_switch(&mut self, id: CircuitId) -> Result<()> {
        self.circuit_mut(id)?.press_switch()
    }

    /// Release a momentary switch.
    pub fn release_switch(&mut self, id: CircuitId) -> Result<()> {
        self.circuit_mut(id)?.release_switch()
    }

    /// Resize a logic gate's inputs and fix up the links of renamed pins.
    pub fn set_logic_pin_count(&mut self, id: CircuitId, count: usize) -> Result<()> {
        let renames = self.circuit_mut(id)?.set_logic_pin_count(count)?;
        rename_links(&mut self.circuits, id, &renames);
        self.rebuild_networks()
    }

    /// Export the simulation. Ids are compacted first.
    pub fn save(&mut self, include_state: bool) -> Result<SaveSimulation> {
        self.compact_ids();
        let mut circuits = BTreeMap::new();
        let mut connections = Vec::new();
        for (id, circuit) in &self.circuits {
            circuits.insert(id.0, circuit.save(include_state)?);
            connections.extend(circuit.save_connections(true));
        }
        Ok(SaveSimulation {
            version: SAVE_VERSION,
            world_width: self.world_width,
            world_height: self.world_height,
            circuits,
            connections,
            tick: include_state.then_some(self.current_tick),
        })
    }

    /// Replace the simulation with the contents of a save.
    ///
    /// Malformed circuits abort the load; the simulation is then left partly
    /// loaded and should be discarded. Connections that point at missing
    /// circuits or pins are skipped with a warning.
    pub fn load(&mut self, save: &SaveSimulation) -> Result<()> {
        self.clear();
        if save.version > SAVE_VERSION {
            return Err(SimError::UnsupportedVersion {
                found: save.version,
                supported: SAVE_VERSION,
            });
        }
        if save.version < SAVE_VERSION {
            log::warn!(
                "Loading old save version {} (current {SAVE_VERSION}), things may not work as intended",
                save.version
            );
        }
        self.resize(save.world_width, save.world_height);

        for (&raw_id, saved) in &save.circuits {
            if raw_id == 0 {
                return Err(SimError::invalid_save("circuit id 0 is reserved"));
            }
            let circuit_type = CircuitType::from_type_name(&saved.circuit_type).ok_or_else(|| {
                SimError::UnknownCircuitType {
                    type_name: saved.circuit_type.clone(),
                }
            })?;
            let id = CircuitId(raw_id);
            let mut circuit = Circuit::new(circuit_type.instantiate());
            circuit.set_id(id);
            circuit.load(saved)?;
            self.circuits.insert(id, circuit);
            self.next_id = self.next_id.max(raw_id.saturating_add(1));
        }

        let mut skipped = 0;
        for (from_id, from_pin, to_id, to_pin) in &save.connections {
            let from = PinRef::new(CircuitId(*from_id), from_pin.as_str());
            let to = PinRef::new(CircuitId(*to_id), to_pin.as_str());
            if let Err(e) = circuit::connect(&mut self.circuits, &from, &to, Some(true)) {
                log::warn!("Skipping connection {from} -> {to}: {e}");
                skipped += 1;
            }
        }

        self.compact_ids();
        if let Some(tick) = save.tick {
            self.current_tick = tick;
        }
        if let Some(sink) = &mut self.sink {
            for circuit in self.circuits.values() {
                sink.attach(circuit);
            }
        }
        self.rebuild_networks()?;
        log::info!(
            "Loaded {} circuits and {} connections ({} skipped)",
            self.circuits.len(),
            save.connections.len() - skipped,
            skipped
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LogicMode;
    use crate::save::{deserialize_save, serialize_save, SaveOptions};
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pin(id: CircuitId, pin: &str) -> PinRef {
        PinRef::new(id, pin)
    }

    fn wire(sim: &mut Simulation, a: CircuitId, a_pin: &str, b: CircuitId, b_pin: &str) {
        assert!(sim.connect(&pin(a, a_pin), &pin(b, b_pin), Some(true)).unwrap());
    }

    fn is_on(sim: &Simulation, id: CircuitId) -> bool {
        sim.circuit(id).unwrap().is_on().unwrap()
    }

    fn out(sim: &Simulation, id: CircuitId, pin: &str) -> bool {
        sim.circuit(id).unwrap().pin(pin).unwrap().out
    }

    #[test]
    fn test_switch_drives_led() {
        let mut sim = Simulation::new();
        let switch = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        wire(&mut sim, switch, "Q", led, "I");

        sim.set_switch(switch, true).unwrap();
        sim.tick();
        assert!(is_on(&sim, led));

        sim.toggle_switch(switch).unwrap();
        assert!(is_on(&sim, led));
        sim.tick();
        assert!(!is_on(&sim, led));
    }

    #[test]
    fn test_one_tick_delay_per_hop() {
        let mut sim = Simulation::new();
        let switch = sim.add_new("switch").unwrap();
        let gate = sim.add_new("logic").unwrap();
        let led = sim.add_new("led").unwrap();
        wire(&mut sim, switch, "Q", gate, "1");
        wire(&mut sim, gate, "Q", led, "I");

        sim.set_switch(switch, true).unwrap();
        sim.tick();
        assert!(out(&sim, gate, "Q"));
        assert!(!is_on(&sim, led));
        sim.tick();
        assert!(is_on(&sim, led));
    }

    #[test]
    fn test_same_tick_outputs_are_not_visible() {
        // the led ticks before the gate, the gate's new output still waits a tick
        let mut sim = Simulation::new();
        let led = sim.add_new("led").unwrap();
        let gate = sim.add_new("logic").unwrap();
        sim.circuit_mut(gate)
            .unwrap()
            .set_logic_mode(LogicMode::And)
            .unwrap();
        wire(&mut sim, gate, "Q", led, "I");

        // unconnected inputs read low; inverted they read high
        for input in ["1", "2"] {
            sim.circuit_mut(gate).unwrap().set_inverted(input, true).unwrap();
        }
        sim.tick();
        assert!(out(&sim, gate, "Q"));
        assert!(!is_on(&sim, led));
        sim.tick();
        assert!(is_on(&sim, led));
    }

    #[test]
    fn test_inverted_input_reads_low_network_as_high() {
        let mut sim = Simulation::new();
        let switch = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        wire(&mut sim, switch, "Q", led, "I");
        sim.circuit_mut(led).unwrap().set_inverted("I", true).unwrap();

        sim.tick();
        assert!(is_on(&sim, led));
    }

    #[test]
    fn test_flip_flop_fires_once_per_rising_edge() {
        let mut sim = Simulation::new();
        let clk = sim.add_new("switch").unwrap();
        let t = sim.add_new("switch").unwrap();
        let ff = sim.add_new("flipflop-t").unwrap();
        wire(&mut sim, clk, "Q", ff, "CLK");
        wire(&mut sim, t, "Q", ff, "T");
        sim.set_switch(t, true).unwrap();

        sim.tick();
        assert!(!is_on(&sim, ff));

        sim.set_switch(clk, true).unwrap();
        sim.tick();
        assert!(is_on(&sim, ff));
        sim.run(3);
        assert!(is_on(&sim, ff));

        sim.set_switch(clk, false).unwrap();
        sim.tick();
        assert!(is_on(&sim, ff));
        sim.set_switch(clk, true).unwrap();
        sim.tick();
        assert!(!is_on(&sim, ff));
    }

    #[test]
    fn test_d_flip_flop_reset_wins() {
        let mut sim = Simulation::new();
        let set = sim.add_new("switch").unwrap();
        let reset = sim.add_new("switch").unwrap();
        let ff = sim.add_new("flipflop-d").unwrap();
        wire(&mut sim, set, "Q", ff, "S");
        wire(&mut sim, reset, "Q", ff, "R");

        sim.set_switch(set, true).unwrap();
        sim.tick();
        assert!(is_on(&sim, ff));
        assert!(out(&sim, ff, "Q"));
        assert!(!out(&sim, ff, "~Q"));

        sim.set_switch(reset, true).unwrap();
        sim.tick();
        assert!(!is_on(&sim, ff));
    }

    #[test]
    fn test_sr_flip_flop_forbidden_input() {
        let mut sim = Simulation::new();
        let clk = sim.add_new("switch").unwrap();
        let s = sim.add_new("switch").unwrap();
        let r = sim.add_new("switch").unwrap();
        let ff = sim.add_new("flipflop-sr").unwrap();
        wire(&mut sim, clk, "Q", ff, "CLK");
        wire(&mut sim, s, "Q", ff, "S");
        wire(&mut sim, r, "Q", ff, "R");
        sim.set_switch(s, true).unwrap();
        sim.set_switch(r, true).unwrap();
        sim.set_switch(clk, true).unwrap();

        sim.tick();
        assert!(!out(&sim, ff, "Q"));
        assert!(!out(&sim, ff, "~Q"));
        // the clock is still high, so no new edge: stored bit drives again
        sim.tick();
        assert!(!out(&sim, ff, "Q"));
        assert!(out(&sim, ff, "~Q"));
    }

    #[test]
    fn test_forbidden_input_redraws_storage() {
        let record = Rc::new(RefCell::new(Recorded::default()));
        let mut sim = Simulation::new();
        sim.set_draw_sink(Box::new(RecordingSink(record.clone())));
        let s = sim.add_new("switch").unwrap();
        let r = sim.add_new("switch").unwrap();
        let latch = sim.add_new("latch-sr").unwrap();
        let ff = sim.add_new("flipflop-sr").unwrap();
        let clk = sim.add_new("switch").unwrap();
        for target in [latch, ff] {
            wire(&mut sim, s, "Q", target, "S");
            wire(&mut sim, r, "Q", target, "R");
        }
        wire(&mut sim, clk, "Q", ff, "CLK");
        sim.tick();
        sim.update(true);
        record.borrow_mut().refreshed.clear();

        sim.set_switch(s, true).unwrap();
        sim.set_switch(r, true).unwrap();
        sim.set_switch(clk, true).unwrap();
        sim.update(false);
        record.borrow_mut().refreshed.clear();
        sim.tick();
        for target in [latch, ff] {
            assert!(!out(&sim, target, "Q"));
            assert!(!out(&sim, target, "~Q"));
            assert!(record.borrow().refreshed.contains(&target));
        }

        // leaving the forbidden state drives ~Q again and redraws
        sim.set_switch(s, false).unwrap();
        sim.update(false);
        record.borrow_mut().refreshed.clear();
        sim.tick();
        assert!(out(&sim, latch, "~Q"));
        assert!(out(&sim, ff, "~Q"));
        assert!(record.borrow().refreshed.contains(&latch));
        assert!(record.borrow().refreshed.contains(&ff));
    }

    #[test]
    fn test_held_clock_survives_save_round_trip() {
        let mut sim = Simulation::new();
        let clk = sim.add_new("switch").unwrap();
        let jk_in = sim.add_new("switch").unwrap();
        let ff = sim.add_new("flipflop-jk").unwrap();
        wire(&mut sim, clk, "Q", ff, "CLK");
        wire(&mut sim, jk_in, "Q", ff, "J");
        wire(&mut sim, jk_in, "Q", ff, "K");
        sim.set_switch(jk_in, true).unwrap();
        sim.set_switch(clk, true).unwrap();
        sim.run(3);
        assert!(is_on(&sim, ff));

        let saved = sim.save(true).unwrap();
        assert_eq!(
            saved.circuits[&ff.0].state,
            Some(serde_json::json!({ "on": true, "lastClock": true }))
        );
        let mut loaded = Simulation::new();
        loaded.load(&saved).unwrap();

        sim.tick();
        loaded.tick();
        assert!(is_on(&sim, ff));
        assert!(is_on(&loaded, ff));
        assert_eq!(loaded.save(true).unwrap(), sim.save(true).unwrap());
    }

    #[test]
    fn test_momentary_switch_press_and_release() {
        let mut sim = Simulation::new();
        let button = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        wire(&mut sim, button, "Q", led, "I");
        sim.circuit_mut(button).unwrap().set_switch_mode(false).unwrap();

        assert!(matches!(
            sim.toggle_switch(button),
            Err(SimError::InvalidParameter { .. })
        ));
        sim.press_switch(button).unwrap();
        sim.tick();
        assert!(is_on(&sim, led));
        sim.release_switch(button).unwrap();
        sim.tick();
        assert!(!is_on(&sim, led));

        sim.circuit_mut(button).unwrap().set_switch_mode(true).unwrap();
        assert!(matches!(
            sim.press_switch(button),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(sim.toggle_switch(button).unwrap());
        assert!(matches!(
            sim.press_switch(led),
            Err(SimError::WrongCircuitType { .. })
        ));
    }

    #[test]
    fn test_add_clone_of_wired_circuit() {
        let mut sim = Simulation::new();
        let switch = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        wire(&mut sim, switch, "Q", led, "I");

        let copy = sim.add_circuit(sim.circuit(switch).unwrap().clone()).unwrap();
        assert!(sim.validate().is_ok());
        let pins = sim.circuit(copy).unwrap().pins();
        assert!(pins.iter().all(|p| p.links().is_empty() && p.network().is_some()));
        assert_eq!(sim.circuit(led).unwrap().pin("I").unwrap().links().len(), 1);

        let extra = sim.add_new("led").unwrap();
        wire(&mut sim, copy, "Q", extra, "I");
        assert!(sim.validate().is_ok());
        sim.set_switch(copy, true).unwrap();
        sim.set_switch(switch, false).unwrap();
        sim.tick();
        assert!(is_on(&sim, extra));
        assert!(!is_on(&sim, led));
    }

    #[test]
    fn test_clock_drives_led() {
        let mut sim = Simulation::new();
        let clock = sim.add_new("clock").unwrap();
        let led = sim.add_new("led").unwrap();
        sim.circuit_mut(clock).unwrap().set_clock(2, 2, 0).unwrap();
        wire(&mut sim, clock, "Q", led, "I");

        let mut seen = Vec::new();
        for _ in 0..8 {
            sim.tick();
            seen.push(is_on(&sim, led));
        }
        // the led lags the clock by one tick
        assert_eq!(seen, vec![false, false, true, true, false, false, true, true]);
    }

    #[test]
    fn test_decoder_drives_segments() {
        let mut sim = Simulation::new();
        let bit0 = sim.add_new("switch").unwrap();
        let bit2 = sim.add_new("switch").unwrap();
        let decoder = sim.add_new("7segmentDecoder").unwrap();
        let display = sim.add_new("7segment").unwrap();
        wire(&mut sim, bit0, "Q", decoder, "D0");
        wire(&mut sim, bit2, "Q", decoder, "D2");
        for segment in crate::components::SEGMENTS {
            wire(&mut sim, decoder, segment, display, segment);
        }

        sim.set_switch(bit0, true).unwrap();
        sim.set_switch(bit2, true).unwrap();
        sim.run(2);

        let crate::components::CircuitKind::SevenSegment(shown) = sim.circuit(display).unwrap().kind()
        else {
            panic!("not a display");
        };
        // 5
        assert_eq!(shown.segments(), [true, false, true, true, false, true, true]);
    }

    #[test]
    fn test_remove_circuit_unlinks_partners() {
        let mut sim = Simulation::new();
        let switch = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        wire(&mut sim, switch, "Q", led, "I");

        sim.remove_circuit(switch).unwrap();
        assert!(sim.circuit(led).unwrap().pin("I").unwrap().links().is_empty());
        assert!(sim.validate().is_ok());
        assert!(matches!(
            sim.remove_circuit(switch),
            Err(SimError::CircuitNotFound { .. })
        ));
    }

    #[test]
    fn test_compact_ids_is_dense_and_ordered() {
        let mut sim = Simulation::new();
        let a = sim.add_new("switch").unwrap();
        let b = sim.add_new("led").unwrap();
        let c = sim.add_new("led").unwrap();
        wire(&mut sim, a, "Q", c, "I");
        sim.remove_circuit(b).unwrap();

        sim.compact_ids();
        let ids: Vec<u32> = sim.circuits().keys().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(sim.circuit(CircuitId(2)).unwrap().circuit_type(), CircuitType::Led);
        assert!(sim
            .circuit(CircuitId(1))
            .unwrap()
            .pin("Q")
            .unwrap()
            .is_linked_to(&pin(CircuitId(2), "I")));
        assert!(sim.validate().is_ok());
        assert_eq!(sim.add_new("led").unwrap(), CircuitId(3));
    }

    #[test]
    fn test_logic_resize_renames_partner_links() {
        let mut sim = Simulation::new();
        let switch = sim.add_new("switch").unwrap();
        let gate = sim.add_new("logic").unwrap();
        sim.set_logic_pin_count(gate, 3).unwrap();
        wire(&mut sim, switch, "Q", gate, "3");

        sim.set_logic_pin_count(gate, 2).unwrap();
        let circuit = sim.circuit(gate).unwrap();
        assert!(circuit.pin("3").is_none());
        assert!(circuit.pin("2").unwrap().is_linked_to(&pin(switch, "Q")));
        assert!(sim
            .circuit(switch)
            .unwrap()
            .pin("Q")
            .unwrap()
            .is_linked_to(&pin(gate, "2")));
        assert!(sim.validate().is_ok());

        sim.set_switch(switch, true).unwrap();
        sim.tick();
        assert!(out(&sim, gate, "Q"));
        assert_eq!(sim.circuit(gate).unwrap().used_input_count().unwrap(), 1);
    }

    #[test]
    fn test_save_round_trip_with_state() {
        let mut sim = Simulation::with_config(&SimulationConfig::new().with_world_size(640.0, 480.5));
        let switch = sim.add_new("switch").unwrap();
        let gate = sim.add_new("logic").unwrap();
        let jk = sim.add_new("flipflop-jk").unwrap();
        let clock = sim.add_new("clock").unwrap();
        let led = sim.add_new("led").unwrap();
        let decoder = sim.add_new("7segmentDecoder").unwrap();
        let display = sim.add_new("7segment").unwrap();
        let latch = sim.add_new("latch-sr").unwrap();
        sim.add_new("flipflop-d").unwrap();
        sim.add_new("flipflop-t").unwrap();
        sim.add_new("flipflop-sr").unwrap();

        wire(&mut sim, switch, "Q", gate, "1");
        wire(&mut sim, switch, "Q", latch, "S");
        wire(&mut sim, clock, "Q", jk, "CLK");
        wire(&mut sim, switch, "Q", jk, "J");
        wire(&mut sim, gate, "Q", led, "I");
        wire(&mut sim, switch, "Q", decoder, "D1");
        wire(&mut sim, decoder, "A", display, "A");
        {
            let circuit = sim.circuit_mut(led).unwrap();
            circuit.move_to(12.5, -3.0);
            circuit.rotate(270.0);
            circuit.set_color("#123456").unwrap();
        }
        sim.circuit_mut(gate).unwrap().set_inverted("2", true).unwrap();
        sim.circuit_mut(clock).unwrap().set_clock(3, 1, -2).unwrap();
        sim.set_switch(switch, true).unwrap();
        sim.run(7);

        let saved = sim.save(true).unwrap();
        assert_eq!(saved.tick, Some(7));
        let text = serialize_save(&saved, &SaveOptions::new().with_state(true)).unwrap();

        let mut loaded = Simulation::new();
        loaded.load(&deserialize_save(&text).unwrap()).unwrap();
        assert_eq!(loaded.current_tick(), 7);
        assert_eq!(loaded.circuit_count(), 11);
        let (width, height) = loaded.world_size();
        assert_relative_eq!(width, 640.0);
        assert_relative_eq!(height, 480.5);

        let restored = loaded.circuit(led).unwrap();
        let (x, y) = restored.position();
        assert_relative_eq!(x, 12.5);
        assert_relative_eq!(y, -3.0);
        assert_eq!(restored.rotation(), 270);
        assert_eq!(loaded.circuit(gate).unwrap().inverted_pins(), vec!["2"]);
        assert_eq!(is_on(&loaded, jk), is_on(&sim, jk));
        assert_eq!(is_on(&loaded, latch), is_on(&sim, latch));
        assert!(loaded.validate().is_ok());

        assert_eq!(loaded.save(true).unwrap(), saved);

        // both continue identically
        sim.run(5);
        loaded.run(5);
        assert_eq!(loaded.save(true).unwrap(), sim.save(true).unwrap());
    }

    #[test]
    fn test_save_lists_each_link_once() {
        let mut sim = Simulation::new();
        let a = sim.add_new("switch").unwrap();
        let b = sim.add_new("led").unwrap();
        let c = sim.add_new("led").unwrap();
        wire(&mut sim, b, "I", a, "Q");
        wire(&mut sim, c, "I", a, "Q");

        let save = sim.save(false).unwrap();
        assert_eq!(save.connections.len(), 2);
        assert!(save.connections.iter().all(|(from, _, to, _)| from < to));
        assert_eq!(save.tick, None);
        assert!(save.circuits.values().all(|c| c.state.is_none()));
    }

    #[test]
    fn test_load_compacts_sparse_ids() {
        let mut sim = Simulation::new();
        sim.add_new("switch").unwrap();
        sim.add_new("led").unwrap();
        let mut save = sim.save(false).unwrap();
        let led = save.circuits.remove(&2).unwrap();
        save.circuits.insert(7, led);
        save.connections = vec![(1, "Q".into(), 7, "I".into())];

        let mut loaded = Simulation::new();
        loaded.load(&save).unwrap();
        let ids: Vec<u32> = loaded.circuits().keys().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(loaded
            .circuit(CircuitId(2))
            .unwrap()
            .pin("I")
            .unwrap()
            .is_linked_to(&pin(CircuitId(1), "Q")));
        assert_eq!(loaded.add_new("led").unwrap(), CircuitId(3));
    }

    #[test]
    fn test_load_skips_bad_connections() {
        let mut sim = Simulation::new();
        sim.add_new("switch").unwrap();
        sim.add_new("led").unwrap();
        let mut save = sim.save(false).unwrap();
        save.connections = vec![
            (1, "Q".into(), 9, "I".into()),
            (1, "X".into(), 2, "I".into()),
            (1, "Q".into(), 2, "I".into()),
        ];

        let mut loaded = Simulation::new();
        loaded.load(&save).unwrap();
        let links = loaded.circuit(CircuitId(1)).unwrap().pin("Q").unwrap().links().len();
        assert_eq!(links, 1);
    }

    #[test]
    fn test_load_rejects_bad_saves() {
        let mut sim = Simulation::new();
        sim.add_new("clock").unwrap();
        let good = sim.save(false).unwrap();

        let mut newer = good.clone();
        newer.version = SAVE_VERSION + 1;
        assert!(matches!(
            Simulation::new().load(&newer),
            Err(SimError::UnsupportedVersion { .. })
        ));

        let mut unknown = good.clone();
        unknown.circuits.get_mut(&1).unwrap().circuit_type = "tesla-coil".into();
        assert!(matches!(
            Simulation::new().load(&unknown),
            Err(SimError::UnknownCircuitType { .. })
        ));

        let mut zero_period = good.clone();
        zero_period
            .circuits
            .get_mut(&1)
            .unwrap()
            .params
            .insert("on".into(), serde_json::json!(0));
        assert!(Simulation::new().load(&zero_period).is_err());

        let mut missing = good;
        missing.circuits.get_mut(&1).unwrap().params.remove("off");
        assert!(matches!(
            Simulation::new().load(&missing),
            Err(SimError::InvalidSave { .. })
        ));
    }

    #[derive(Default)]
    struct Recorded {
        attached: Vec<CircuitId>,
        detached: Vec<CircuitId>,
        refreshed: Vec<CircuitId>,
        renumbered: Vec<(CircuitId, CircuitId)>,
        rebuilds: usize,
    }

    struct RecordingSink(Rc<RefCell<Recorded>>);

    impl DrawSink for RecordingSink {
        fn attach(&mut self, circuit: &Circuit) {
            self.0.borrow_mut().attached.push(circuit.id());
        }

        fn detach(&mut self, id: CircuitId) {
            self.0.borrow_mut().detached.push(id);
        }

        fn refresh(&mut self, circuit: &Circuit) {
            self.0.borrow_mut().refreshed.push(circuit.id());
        }

        fn links_changed(&mut self, _networks: &NetworkManager) {
            self.0.borrow_mut().rebuilds += 1;
        }

        fn renumbered(&mut self, mapping: &[(CircuitId, CircuitId)]) {
            self.0.borrow_mut().renumbered.extend_from_slice(mapping);
        }
    }

    #[test]
    fn test_draw_sink_notifications() {
        let record = Rc::new(RefCell::new(Recorded::default()));
        let mut sim = Simulation::new();
        sim.set_draw_sink(Box::new(RecordingSink(record.clone())));

        let switch = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        let spare = sim.add_new("led").unwrap();
        wire(&mut sim, switch, "Q", spare, "I");
        sim.set_switch(switch, true).unwrap();
        sim.tick();

        sim.remove_circuit(led).unwrap();
        sim.compact_ids();
        sim.update(true);

        let record = record.borrow();
        assert_eq!(record.attached, vec![switch, led, spare]);
        assert_eq!(record.detached, vec![led]);
        assert!(record.refreshed.contains(&switch));
        assert!(record.refreshed.contains(&spare));
        assert_eq!(record.renumbered, vec![(CircuitId(3), CircuitId(2))]);
        // set_draw_sink, three adds, one link, one removal
        assert_eq!(record.rebuilds, 6);
    }
}
