//! A placed circuit: position, pins and variant behaviour.

use serde_json::{Map, Value};

use super::pin::{Pin, PinMap};
use super::types::{CircuitId, PinRef};
use crate::components::{CircuitKind, CircuitType, Clock, Color, LogicGate, LogicMode};
use crate::error::{Result, SimError};
use crate::save::{SaveCircuit, SaveConnection};
use crate::sim::TickContext;

/// A circuit instance.
///
/// A circuit is created detached (id [`CircuitId::DETACHED`]) and receives
/// its id when added to a simulation. Once attached, anything that touches
/// links goes through the simulation, which can reach both endpoints.
#[derive(Debug, Clone)]
pub struct Circuit {
    id: CircuitId,
    x: f64,
    y: f64,
    /// Rotation in whole degrees, `0..360`
    rotation: u32,
    pins: PinMap,
    kind: CircuitKind,
    needs_update: bool,
}

impl Circuit {
    /// Create a detached circuit with the variant's default pins.
    pub fn new(kind: CircuitKind) -> Self {
        let mut pins = PinMap::from_defs(&kind.behavior().pin_layout());
        kind.behavior().restore_outputs(&mut pins);
        Self {
            id: CircuitId::DETACHED,
            x: 0.0,
            y: 0.0,
            rotation: 0,
            pins,
            kind,
            needs_update: false,
        }
    }

    pub fn id(&self) -> CircuitId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: CircuitId) {
        self.id = id;
    }

    /// Position in world coordinates.
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn rotation(&self) -> u32 {
        self.rotation
    }

    /// Rotate to `degrees`, floored and wrapped into `0..360`.
    pub fn rotate(&mut self, degrees: f64) {
        let rotation = (degrees.floor() as i64).rem_euclid(360) as u32;
        if rotation != self.rotation {
            self.rotation = rotation;
            self.needs_update = true;
        }
    }

    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    pub(crate) fn pins_mut(&mut self) -> &mut PinMap {
        &mut self.pins
    }

    pub fn pin(&self, id: &str) -> Option<&Pin> {
        self.pins.get(id)
    }

    pub(crate) fn pin_mut(&mut self, id: &str) -> Option<&mut Pin> {
        self.pins.get_mut(id)
    }

    /// Reference to one of this circuit's pins.
    pub fn pin_ref(&self, id: &str) -> PinRef {
        PinRef::new(self.id, id)
    }

    pub fn kind(&self) -> &CircuitKind {
        &self.kind
    }

    pub fn circuit_type(&self) -> CircuitType {
        self.kind.circuit_type()
    }

    /// Latched or displayed on/off value, for variants that have one.
    pub fn is_on(&self) -> Option<bool> {
        self.kind.is_on()
    }

    /// Check whether the presentation of this circuit is stale.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    /// Clear the dirty flag, returning whether a refresh is due.
    pub(crate) fn take_update(&mut self, force: bool) -> bool {
        let due = self.needs_update || force;
        self.needs_update = false;
        due
    }

    /// Set or clear inversion of a pin.
    pub fn set_inverted(&mut self, pin: &str, inverted: bool) -> Result<()> {
        let id = self.id;
        let pin = self
            .pins
            .get_mut(pin)
            .ok_or_else(|| SimError::pin_not_found(id, pin))?;
        pin.set_inverted(inverted);
        self.needs_update = true;
        Ok(())
    }

    /// Ids of all inverted pins.
    pub fn inverted_pins(&self) -> Vec<String> {
        self.pins
            .iter()
            .filter(|pin| pin.is_inverted())
            .map(|pin| pin.id().to_string())
            .collect()
    }

    /// Run the variant's tick against the current network values.
    pub(crate) fn tick(&mut self, ctx: &TickContext<'_>) {
        if self.kind.behavior_mut().tick(&mut self.pins, ctx) {
            self.needs_update = true;
        }
    }

    fn wrong_type(&self, expected: CircuitType) -> SimError {
        SimError::WrongCircuitType {
            circuit: self.id,
            expected: expected.type_name(),
            found: self.circuit_type().type_name(),
        }
    }

    /// Set a switch on or off. Outputs change immediately.
    pub fn set_switch(&mut self, on: bool) -> Result<()> {
        match &mut self.kind {
            CircuitKind::Switch(switch) => {
                switch.set_on(&mut self.pins, on);
                self.needs_update = true;
                Ok(())
            }
            _ => Err(self.wrong_type(CircuitType::Switch)),
        }
    }

    /// Flip a toggle switch, returning its new state.
    ///
    /// Momentary switches are pressed and released instead.
    pub fn toggle_switch(&mut self) -> Result<bool> {
        match &mut self.kind {
            CircuitKind::Switch(switch) => {
                if !switch.toggle(&mut self.pins) {
                    return Err(SimError::invalid_parameter(
                        "toggle",
                        "momentary switches are pressed and released, not toggled",
                    ));
                }
                self.needs_update = true;
                Ok(switch.is_on())
            }
            _ => Err(self.wrong_type(CircuitType::Switch)),
        }
    }

    /// Hold a momentary switch down.
    pub fn press_switch(&mut self) -> Result<()> {
        self.hold_switch(true)
    }

    /// Release a momentary switch.
    pub fn release_switch(&mut self) -> Result<()> {
        self.hold_switch(false)
    }

    fn hold_switch(&mut self, down: bool) -> Result<()> {
        match &mut self.kind {
            CircuitKind::Switch(switch) if switch.is_toggle() => Err(SimError::invalid_parameter(
                "toggle",
                "toggle switches are tapped, not held",
            )),
            CircuitKind::Switch(switch) => {
                let changed = if down {
                    switch.press(&mut self.pins)
                } else {
                    switch.release(&mut self.pins)
                };
                if changed {
                    self.needs_update = true;
                }
                Ok(())
            }
            _ => Err(self.wrong_type(CircuitType::Switch)),
        }
    }

    /// Choose toggle or momentary operation of a switch.
    pub fn set_switch_mode(&mut self, toggle: bool) -> Result<()> {
        match &mut self.kind {
            CircuitKind::Switch(switch) => {
                switch.set_toggle(toggle);
                Ok(())
            }
            _ => Err(self.wrong_type(CircuitType::Switch)),
        }
    }

    /// Set the colour of an LED or 7-segment display.
    ///
    /// Invalid colours are rejected without change.
    pub fn set_color(&mut self, color: &str) -> Result<()> {
        let parsed: Color = color.parse()?;
        match &mut self.kind {
            CircuitKind::Led(led) => led.set_color(parsed),
            CircuitKind::SevenSegment(display) => display.set_color(parsed),
            _ => return Err(self.wrong_type(CircuitType::Led)),
        }
        self.needs_update = true;
        Ok(())
    }

    pub fn set_logic_mode(&mut self, mode: LogicMode) -> Result<()> {
        match &mut self.kind {
            CircuitKind::Logic(gate) => {
                gate.set_mode(mode);
                self.needs_update = true;
                Ok(())
            }
            _ => Err(self.wrong_type(CircuitType::Logic)),
        }
    }

    /// Number of linked input pins of a logic gate.
    pub fn used_input_count(&self) -> Result<usize> {
        match &self.kind {
            CircuitKind::Logic(_) => Ok(LogicGate::used_input_count(&self.pins)),
            _ => Err(self.wrong_type(CircuitType::Logic)),
        }
    }

    /// Resize a logic gate's inputs, returning the `(old, new)` pin renames.
    ///
    /// Link partners still refer to the old ids; the caller fixes them up.
    pub(crate) fn set_logic_pin_count(&mut self, count: usize) -> Result<Vec<(String, String)>> {
        let id = self.id;
        match &mut self.kind {
            CircuitKind::Logic(gate) => {
                let renames = gate.resize_inputs(id, &mut self.pins, count)?;
                self.needs_update = true;
                Ok(renames)
            }
            _ => Err(self.wrong_type(CircuitType::Logic)),
        }
    }

    /// Change clock timing. Zero durations are rejected without change.
    pub fn set_clock(&mut self, on: u32, off: u32, shift: i64) -> Result<()> {
        match &mut self.kind {
            CircuitKind::Clock(clock) => {
                clock.set_timing(on, off, shift)?;
                self.needs_update = true;
                Ok(())
            }
            _ => Err(self.wrong_type(CircuitType::Clock)),
        }
    }

    /// Clock settings, if this is a clock.
    pub fn clock(&self) -> Option<&Clock> {
        match &self.kind {
            CircuitKind::Clock(clock) => Some(clock),
            _ => None,
        }
    }

    /// Serialize position, pin inversion, variant parameters and optionally
    /// runtime state.
    pub fn save(&self, include_state: bool) -> Result<SaveCircuit> {
        let behavior = self.kind.behavior();
        let state = if include_state {
            Some(
                behavior
                    .save_state()?
                    .unwrap_or_else(|| Value::Object(Map::new())),
            )
        } else {
            None
        };
        Ok(SaveCircuit {
            x: self.x,
            y: self.y,
            r: (self.rotation != 0).then_some(f64::from(self.rotation)),
            circuit_type: self.circuit_type().type_name().to_string(),
            inverted_pins: self.inverted_pins(),
            state,
            params: behavior.save_params()?,
        })
    }

    /// Restore a detached circuit from its save.
    ///
    /// The pin set is rebuilt from the loaded parameters; pins no longer in
    /// the layout are dropped with their links.
    pub(crate) fn load(&mut self, save: &SaveCircuit) -> Result<()> {
        if save.circuit_type != self.circuit_type().type_name() {
            return Err(SimError::invalid_save(format!(
                "cannot load a '{}' save into a '{}'",
                save.circuit_type,
                self.circuit_type()
            )));
        }
        if let Some(r) = save.r {
            self.rotate(r);
        }

        let behavior = self.kind.behavior_mut();
        behavior.load_params(&save.params)?;
        let dropped = self.pins.apply_layout(&behavior.pin_layout());
        if dropped.iter().any(|pin| !pin.links().is_empty()) {
            log::warn!(
                "Circuit #{} dropped linked pins while loading; links discarded",
                self.id
            );
        }
        for pin in self.pins.iter_mut() {
            let inverted = save.inverted_pins.iter().any(|id| id == pin.id());
            pin.set_inverted(inverted);
        }
        self.move_to(save.x, save.y);

        let behavior = self.kind.behavior_mut();
        if let Some(state) = &save.state {
            behavior.load_state(state)?;
        }
        behavior.restore_outputs(&mut self.pins);
        self.needs_update = true;
        Ok(())
    }

    /// Serialize the links of every pin as `[own id, own pin, other id, other pin]`.
    ///
    /// With `one_way`, links to circuits with a smaller id are skipped so each
    /// link of a whole simulation is listed once.
    pub fn save_connections(&self, one_way: bool) -> Vec<SaveConnection> {
        self.pins
            .iter()
            .flat_map(|pin| {
                pin.links()
                    .iter()
                    .filter(move |link| !(one_way && link.circuit < self.id))
                    .map(move |link| (self.id.0, pin.id().to_string(), link.circuit.0, link.pin.clone()))
            })
            .collect()
    }
}
