//! Pins: named connection points on a circuit.

use std::collections::BTreeMap;

use super::types::{NetworkId, PinRef, Side};
use crate::sim::NetworkManager;

/// Layout entry describing one pin of a circuit variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinDef {
    pub id: String,
    pub input: bool,
    pub output: bool,
    pub side: Side,
    pub label: Option<String>,
    pub order: i32,
}

impl PinDef {
    /// An input pin on the given side.
    pub fn input(id: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            input: true,
            output: false,
            side,
            label: None,
            order: 0,
        }
    }

    /// An output pin on the given side.
    pub fn output(id: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            input: false,
            output: true,
            side,
            label: None,
            order: 0,
        }
    }

    /// Set a display label different from the id.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A connection point on a circuit.
///
/// Links are symmetric: if pin A lists B, B lists A. They are only mutated by
/// the simulation, which owns every circuit and can reach both endpoints.
#[derive(Debug, Clone)]
pub struct Pin {
    id: String,
    label: Option<String>,
    /// Pin reads its network
    pub is_input: bool,
    /// Pin drives its network
    pub is_output: bool,
    /// Raw output value (ignored unless `is_output`)
    pub out: bool,
    inverted: bool,
    /// Layout tiebreak among pins on the same side
    pub order: i32,
    pub side: Side,
    pub(crate) links: Vec<PinRef>,
    pub(crate) network: Option<NetworkId>,
}

impl Pin {
    /// Create an unlinked pin that neither reads nor drives.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            is_input: false,
            is_output: false,
            out: false,
            inverted: false,
            order: 0,
            side: Side::default(),
            links: Vec::new(),
            network: None,
        }
    }

    /// Create a pin from a layout entry.
    pub fn from_def(def: &PinDef) -> Self {
        let mut pin = Self::new(def.id.clone());
        pin.apply_def(def);
        pin
    }

    /// Apply a layout entry, keeping links and output value.
    pub(crate) fn apply_def(&mut self, def: &PinDef) {
        self.is_input = def.input;
        self.is_output = def.output;
        self.side = def.side;
        if def.label.is_some() {
            self.label = def.label.clone();
        }
        if def.order != 0 {
            self.order = def.order;
        }
        self.inverted = false;
    }

    /// Pin id, unique within the owning circuit.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    /// Display label, defaulting to the id.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Display label, only if one was set.
    pub fn custom_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub(crate) fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Value this pin contributes to its network.
    ///
    /// Non-output pins always contribute `false`.
    pub fn output(&self) -> bool {
        self.is_output && (self.out != self.inverted)
    }

    /// Value this pin reads from its network.
    ///
    /// Non-input pins and pins without a network always read `false`.
    pub fn input(&self, networks: &NetworkManager) -> bool {
        if !self.is_input {
            return false;
        }
        match self.network {
            Some(net) => networks.is_active(net) != self.inverted,
            None => false,
        }
    }

    /// Pins directly linked to this one.
    pub fn links(&self) -> &[PinRef] {
        &self.links
    }

    /// Check for a direct link to `other`.
    pub fn is_linked_to(&self, other: &PinRef) -> bool {
        self.links.contains(other)
    }

    /// Network assigned by the last rebuild.
    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }
}

/// Pin map of a single circuit, keyed by pin id.
#[derive(Debug, Clone, Default)]
pub struct PinMap {
    pins: BTreeMap<String, Pin>,
}

impl PinMap {
    /// Create an empty pin map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pin map from a layout.
    pub fn from_defs(defs: &[PinDef]) -> Self {
        let mut map = Self::new();
        for def in defs {
            map.insert(Pin::from_def(def));
        }
        map
    }

    pub fn get(&self, id: &str) -> Option<&Pin> {
        self.pins.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Pin> {
        self.pins.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pins.contains_key(id)
    }

    pub(crate) fn insert(&mut self, pin: Pin) {
        self.pins.insert(pin.id.clone(), pin);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Pin> {
        self.pins.remove(id)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pin> {
        self.pins.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }

    /// Read the input value of pin `id`; unknown pins read `false`.
    pub fn input(&self, id: &str, networks: &NetworkManager) -> bool {
        self.pins.get(id).is_some_and(|pin| pin.input(networks))
    }

    /// Write the raw output value of pin `id`.
    pub fn set_out(&mut self, id: &str, value: bool) {
        if let Some(pin) = self.pins.get_mut(id) {
            pin.out = value;
        }
    }

    /// Write `Q` and its complement `~Q`.
    pub fn set_q(&mut self, on: bool) {
        self.set_out("Q", on);
        self.set_out("~Q", !on);
    }

    /// Apply a full layout: pins absent from it are dropped, existing pins
    /// with matching ids keep their links.
    ///
    /// Returns the pins that were dropped so the caller can unlink them.
    pub(crate) fn apply_layout(&mut self, defs: &[PinDef]) -> Vec<Pin> {
        let stale: Vec<String> = self
            .pins
            .keys()
            .filter(|id| !defs.iter().any(|def| &def.id == *id))
            .cloned()
            .collect();
        let removed = stale.iter().filter_map(|id| self.pins.remove(id)).collect();
        for def in defs {
            match self.pins.get_mut(&def.id) {
                Some(pin) => pin.apply_def(def),
                None => self.insert(Pin::from_def(def)),
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_respects_inversion() {
        let mut pin = Pin::from_def(&PinDef::output("Q", Side::Right));
        assert!(!pin.output());
        pin.out = true;
        assert!(pin.output());
        pin.set_inverted(true);
        assert!(!pin.output());
        pin.out = false;
        assert!(pin.output());
    }

    #[test]
    fn test_non_output_never_drives() {
        let mut pin = Pin::from_def(&PinDef::input("I", Side::Left));
        pin.out = true;
        pin.set_inverted(true);
        assert!(!pin.output());
    }

    #[test]
    fn test_input_without_network_reads_false() {
        let networks = NetworkManager::new();
        let mut pin = Pin::from_def(&PinDef::input("I", Side::Left));
        pin.set_inverted(true);
        assert!(!pin.input(&networks));
    }

    #[test]
    fn test_label_defaults_to_id() {
        let plain = Pin::from_def(&PinDef::output("Q", Side::Right));
        assert_eq!(plain.label(), "Q");
        assert_eq!(plain.custom_label(), None);

        let labelled = Pin::from_def(&PinDef::output("~Q", Side::Right).with_label("Q\u{0305}"));
        assert_eq!(labelled.label(), "Q\u{0305}");
    }

    #[test]
    fn test_apply_layout_keeps_matching_links() {
        let mut map = PinMap::from_defs(&[
            PinDef::input("A", Side::Left),
            PinDef::input("B", Side::Left),
        ]);
        map.get_mut("A")
            .unwrap()
            .links
            .push(PinRef::new(crate::circuit::CircuitId(2), "Q"));

        let removed = map.apply_layout(&[
            PinDef::input("A", Side::Left),
            PinDef::output("Q", Side::Right),
        ]);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), "B");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A").unwrap().links().len(), 1);
        assert!(map.get("Q").unwrap().is_output);
    }
}
