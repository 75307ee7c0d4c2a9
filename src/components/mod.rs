//! Circuit variant models.
//!
//! This module provides the behaviour of every supported circuit type:
//! - Inputs: Switch, Clock
//! - Combinational: Logic gate (OR/AND/XOR), 7-segment decoder
//! - Storage: SR latch, SR/JK/D/T flip-flops
//! - Displays: LED, 7-segment display
//!
//! Each variant implements [`CircuitBehavior`]: its pin layout, what it does
//! on a tick, and how its parameters and state are persisted.

mod clock;
mod color;
mod controls;
mod decoder;
mod display;
mod gates;
mod storage;

pub use clock::Clock;
pub use color::Color;
pub use controls::Switch;
pub use decoder::{SevenSegmentDecoder, TRUTH_TABLE};
pub use display::{Led, SevenSegment, SEGMENTS};
pub use gates::{LogicGate, LogicMode, MAX_LOGIC_PINS, MIN_LOGIC_PINS};
pub use storage::{ClockEdge, DFlipFlop, JkFlipFlop, SrFlipFlop, SrLatch, TFlipFlop};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::circuit::{Circuit, PinDef, PinMap};
use crate::error::Result;
use crate::sim::TickContext;

/// Type tag of a circuit variant, used for save/load dispatch and the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitType {
    Switch,
    Led,
    Logic,
    SrLatch,
    SrFlipFlop,
    JkFlipFlop,
    DFlipFlop,
    TFlipFlop,
    Clock,
    SevenSegment,
    SevenSegmentDecoder,
}

impl CircuitType {
    /// Every known circuit type, in menu order.
    pub const ALL: [CircuitType; 11] = [
        CircuitType::Switch,
        CircuitType::Led,
        CircuitType::Logic,
        CircuitType::SrLatch,
        CircuitType::SrFlipFlop,
        CircuitType::JkFlipFlop,
        CircuitType::DFlipFlop,
        CircuitType::TFlipFlop,
        CircuitType::Clock,
        CircuitType::SevenSegment,
        CircuitType::SevenSegmentDecoder,
    ];

    /// Internal name written to saves.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::Led => "led",
            Self::Logic => "logic",
            Self::SrLatch => "latch-sr",
            Self::SrFlipFlop => "flipflop-sr",
            Self::JkFlipFlop => "flipflop-jk",
            Self::DFlipFlop => "flipflop-d",
            Self::TFlipFlop => "flipflop-t",
            Self::Clock => "clock",
            Self::SevenSegment => "7segment",
            Self::SevenSegmentDecoder => "7segmentDecoder",
        }
    }

    /// Human readable name for menus.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Switch => "Switch",
            Self::Led => "LED",
            Self::Logic => "Logic gate",
            Self::SrLatch => "SR Latch",
            Self::SrFlipFlop => "SR Flip Flop",
            Self::JkFlipFlop => "JK Flip Flop",
            Self::DFlipFlop => "D Flip Flop",
            Self::TFlipFlop => "T Flip Flop",
            Self::Clock => "Clock",
            Self::SevenSegment => "7-segment display",
            Self::SevenSegmentDecoder => "7-segment decoder",
        }
    }

    /// Look up a type by its save name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.type_name() == name)
    }

    /// Create the default variant for this type.
    pub fn instantiate(&self) -> CircuitKind {
        match self {
            Self::Switch => CircuitKind::Switch(Switch::default()),
            Self::Led => CircuitKind::Led(Led::default()),
            Self::Logic => CircuitKind::Logic(LogicGate::default()),
            Self::SrLatch => CircuitKind::SrLatch(SrLatch::default()),
            Self::SrFlipFlop => CircuitKind::SrFlipFlop(SrFlipFlop::default()),
            Self::JkFlipFlop => CircuitKind::JkFlipFlop(JkFlipFlop::default()),
            Self::DFlipFlop => CircuitKind::DFlipFlop(DFlipFlop::default()),
            Self::TFlipFlop => CircuitKind::TFlipFlop(TFlipFlop::default()),
            Self::Clock => CircuitKind::Clock(Clock::default()),
            Self::SevenSegment => CircuitKind::SevenSegment(SevenSegment::default()),
            Self::SevenSegmentDecoder => {
                CircuitKind::SevenSegmentDecoder(SevenSegmentDecoder::default())
            }
        }
    }
}

impl std::fmt::Display for CircuitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Create a detached circuit of the named type, or `None` for unknown types.
pub fn create_circuit(type_name: &str) -> Option<Circuit> {
    match CircuitType::from_type_name(type_name) {
        Some(circuit_type) => Some(Circuit::new(circuit_type.instantiate())),
        None => {
            log::error!("Unknown circuit type: {type_name:?}");
            None
        }
    }
}

/// Behaviour shared by all circuit variants.
pub trait CircuitBehavior {
    /// Type tag of the variant.
    fn circuit_type(&self) -> CircuitType;

    /// Pins this variant needs with its current parameters.
    fn pin_layout(&self) -> Vec<PinDef>;

    /// Read inputs and write outputs for one tick.
    ///
    /// Returns `true` when something visible changed.
    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool;

    /// Write outputs from stored state, without sampling inputs.
    fn restore_outputs(&self, _pins: &mut PinMap) {}

    /// Persistent configuration fields, merged into the circuit save.
    fn save_params(&self) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    /// Restore configuration fields. Missing or malformed fields are an error.
    fn load_params(&mut self, _params: &Map<String, Value>) -> Result<()> {
        Ok(())
    }

    /// Runtime state, saved only when state is included.
    fn save_state(&self) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Restore runtime state.
    fn load_state(&mut self, _state: &Value) -> Result<()> {
        Ok(())
    }

    /// Latched or displayed on/off value, for variants that have one.
    fn is_on(&self) -> Option<bool> {
        None
    }
}

/// Persisted state of every variant with a single stored bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OnState {
    pub on: bool,
}

/// A circuit variant.
#[derive(Debug, Clone)]
pub enum CircuitKind {
    Switch(Switch),
    Led(Led),
    Logic(LogicGate),
    SrLatch(SrLatch),
    SrFlipFlop(SrFlipFlop),
    JkFlipFlop(JkFlipFlop),
    DFlipFlop(DFlipFlop),
    TFlipFlop(TFlipFlop),
    Clock(Clock),
    SevenSegment(SevenSegment),
    SevenSegmentDecoder(SevenSegmentDecoder),
}

impl CircuitKind {
    /// Borrow the variant through its shared interface.
    pub fn behavior(&self) -> &dyn CircuitBehavior {
        match self {
            CircuitKind::Switch(c) => c,
            CircuitKind::Led(c) => c,
            CircuitKind::Logic(c) => c,
            CircuitKind::SrLatch(c) => c,
            CircuitKind::SrFlipFlop(c) => c,
            CircuitKind::JkFlipFlop(c) => c,
            CircuitKind::DFlipFlop(c) => c,
            CircuitKind::TFlipFlop(c) => c,
            CircuitKind::Clock(c) => c,
            CircuitKind::SevenSegment(c) => c,
            CircuitKind::SevenSegmentDecoder(c) => c,
        }
    }

    /// Mutably borrow the variant through its shared interface.
    pub fn behavior_mut(&mut self) -> &mut dyn CircuitBehavior {
        match self {
            CircuitKind::Switch(c) => c,
            CircuitKind::Led(c) => c,
            CircuitKind::Logic(c) => c,
            CircuitKind::SrLatch(c) => c,
            CircuitKind::SrFlipFlop(c) => c,
            CircuitKind::JkFlipFlop(c) => c,
            CircuitKind::DFlipFlop(c) => c,
            CircuitKind::TFlipFlop(c) => c,
            CircuitKind::Clock(c) => c,
            CircuitKind::SevenSegment(c) => c,
            CircuitKind::SevenSegmentDecoder(c) => c,
        }
    }

    /// Get the type tag.
    pub fn circuit_type(&self) -> CircuitType {
        self.behavior().circuit_type()
    }

    /// Latched or displayed on/off value, for variants that have one.
    pub fn is_on(&self) -> Option<bool> {
        self.behavior().is_on()
    }
}

impl From<CircuitType> for CircuitKind {
    fn from(circuit_type: CircuitType) -> Self {
        circuit_type.instantiate()
    }
}
