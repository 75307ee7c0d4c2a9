//! Core identifier types for the circuit graph.

use std::fmt;

/// A unique identifier for a circuit inside a simulation.
/// Ids start at 1 and are dense after compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircuitId(pub u32);

impl CircuitId {
    /// Id of a circuit that has not been added to a simulation yet.
    pub const DETACHED: CircuitId = CircuitId(0);

    /// Check if this circuit is attached to a simulation.
    pub fn is_attached(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-owning reference to a pin: owning circuit id plus pin id.
///
/// Links and networks only ever hold these keys; the simulation's circuit map
/// is the sole owner of pins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PinRef {
    pub circuit: CircuitId,
    pub pin: String,
}

impl PinRef {
    /// Create a new pin reference.
    pub fn new(circuit: CircuitId, pin: impl Into<String>) -> Self {
        Self {
            circuit,
            pin: pin.into(),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.circuit, self.pin)
    }
}

/// Index of a network produced by the last rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkId(pub usize);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NET{}", self.0)
    }
}

/// Side of the circuit body a pin is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    Top,
    Right,
    Bottom,
    #[default]
    Left,
}
