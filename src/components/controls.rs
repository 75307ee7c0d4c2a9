//! User controls: the Switch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CircuitBehavior, CircuitType, OnState};
use crate::circuit::{PinDef, PinMap, Side};
use crate::error::Result;
use crate::save::{from_fields, from_state, to_fields};
use crate::sim::TickContext;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SwitchParams {
    toggle: bool,
}

/// A user operated switch.
///
/// Drives `Q` with its state and `~Q` with the complement. In toggle mode a
/// tap flips the state; otherwise the switch is momentary and is only on
/// while pressed. [`Switch::set_on`] ignores the mode.
#[derive(Debug, Clone)]
pub struct Switch {
    on: bool,
    toggle: bool,
}

impl Default for Switch {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl Switch {
    /// Create a new switch.
    pub fn new(on: bool, toggle: bool) -> Self {
        Self { on, toggle }
    }

    /// Get the switch state.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Check if the switch latches (toggle) rather than being momentary.
    pub fn is_toggle(&self) -> bool {
        self.toggle
    }

    /// Choose between toggle and momentary operation.
    pub fn set_toggle(&mut self, toggle: bool) {
        self.toggle = toggle;
    }

    /// Set the switch state and update the outputs right away.
    pub fn set_on(&mut self, pins: &mut PinMap, on: bool) {
        self.on = on;
        self.restore_outputs(pins);
    }

    /// Flip a toggle switch and update the outputs right away.
    ///
    /// Momentary switches ignore taps. Returns whether the state changed.
    pub fn toggle(&mut self, pins: &mut PinMap) -> bool {
        if !self.toggle {
            return false;
        }
        self.set_on(pins, !self.on);
        true
    }

    /// Hold a momentary switch down. Toggle switches ignore presses.
    ///
    /// Returns whether the state changed.
    pub fn press(&mut self, pins: &mut PinMap) -> bool {
        self.hold(pins, true)
    }

    /// Let go of a momentary switch. Toggle switches ignore releases.
    ///
    /// Returns whether the state changed.
    pub fn release(&mut self, pins: &mut PinMap) -> bool {
        self.hold(pins, false)
    }

    fn hold(&mut self, pins: &mut PinMap, down: bool) -> bool {
        if self.toggle || self.on == down {
            return false;
        }
        self.set_on(pins, down);
        true
    }
}

impl CircuitBehavior for Switch {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::Switch
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        vec![
            PinDef::output("Q", Side::Right),
            PinDef::output("~Q", Side::Right).with_label("Q\u{0305}"),
        ]
    }

    fn tick(&mut self, pins: &mut PinMap, _ctx: &TickContext<'_>) -> bool {
        pins.set_q(self.on);
        false
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_q(self.on);
    }

    fn save_params(&self) -> Result<Map<String, Value>> {
        to_fields(&SwitchParams {
            toggle: self.toggle,
        })
    }

    fn load_params(&mut self, params: &Map<String, Value>) -> Result<()> {
        let params: SwitchParams = from_fields(CircuitType::Switch, params)?;
        self.toggle = params.toggle;
        Ok(())
    }

    fn save_state(&self) -> Result<Option<Value>> {
        Ok(Some(serde_json::to_value(OnState { on: self.on })?))
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        let state: OnState = from_state(CircuitType::Switch, state)?;
        self.on = state.on;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::NetworkManager;

    fn pins_for(switch: &Switch) -> PinMap {
        PinMap::from_defs(&switch.pin_layout())
    }

    #[test]
    fn test_switch_drives_complementary_outputs() {
        let mut switch = Switch::new(true, true);
        let mut pins = pins_for(&switch);
        let networks = NetworkManager::new();
        switch.tick(&mut pins, &TickContext::new(&networks, 1));
        assert!(pins.get("Q").unwrap().output());
        assert!(!pins.get("~Q").unwrap().output());
    }

    #[test]
    fn test_toggle_updates_outputs_immediately() {
        let mut switch = Switch::default();
        let mut pins = pins_for(&switch);
        assert!(switch.toggle(&mut pins));
        assert!(switch.is_on());
        assert!(pins.get("Q").unwrap().out);
        assert!(!pins.get("~Q").unwrap().out);
        assert!(switch.toggle(&mut pins));
        assert!(!pins.get("Q").unwrap().out);
    }

    #[test]
    fn test_toggle_switch_ignores_press_and_release() {
        let mut switch = Switch::default();
        let mut pins = pins_for(&switch);
        assert!(!switch.press(&mut pins));
        assert!(!switch.is_on());
        switch.toggle(&mut pins);
        assert!(!switch.release(&mut pins));
        assert!(switch.is_on());
    }

    #[test]
    fn test_momentary_switch_is_on_while_pressed() {
        let mut switch = Switch::new(false, false);
        let mut pins = pins_for(&switch);
        assert!(!switch.toggle(&mut pins));
        assert!(!switch.is_on());

        assert!(switch.press(&mut pins));
        assert!(switch.is_on());
        assert!(pins.get("Q").unwrap().out);
        assert!(!switch.press(&mut pins));

        assert!(switch.release(&mut pins));
        assert!(!switch.is_on());
        assert!(!pins.get("Q").unwrap().out);
        assert!(pins.get("~Q").unwrap().out);
        assert!(!switch.release(&mut pins));
    }

    #[test]
    fn test_switch_params_require_toggle() {
        let mut switch = Switch::default();
        assert!(switch.load_params(&Map::new()).is_err());

        let params = Switch::new(false, false).save_params().unwrap();
        switch.load_params(&params).unwrap();
        assert!(!switch.is_toggle());
    }
}
