//! Visual outputs: LED and 7-segment display.
//!
//! Neither drives anything. They sample their inputs each tick and flag a
//! redraw when what they show changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CircuitBehavior, CircuitType, Color, OnState};
use crate::circuit::{PinDef, PinMap, Side};
use crate::error::{Result, SimError};
use crate::save::{from_fields, from_state, to_fields};
use crate::sim::TickContext;

/// Segment pin ids, in display order.
pub const SEGMENTS: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColorParams {
    color: String,
}

fn load_color(circuit_type: CircuitType, params: &Map<String, Value>) -> Result<Color> {
    let params: ColorParams = from_fields(circuit_type, params)?;
    Color::parse(&params.color).ok_or_else(|| {
        SimError::invalid_save(format!("{circuit_type}: invalid color {:?}", params.color))
    })
}

/// Single input indicator lamp.
#[derive(Debug, Clone)]
pub struct Led {
    on: bool,
    color: Color,
}

impl Default for Led {
    fn default() -> Self {
        Self {
            on: false,
            color: Color::RED,
        }
    }
}

impl Led {
    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl CircuitBehavior for Led {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::Led
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        vec![PinDef::input("I", Side::Left)]
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let on = pins.input("I", ctx.networks);
        let changed = on != self.on;
        self.on = on;
        changed
    }

    fn save_params(&self) -> Result<Map<String, Value>> {
        to_fields(&ColorParams {
            color: self.color.name(),
        })
    }

    fn load_params(&mut self, params: &Map<String, Value>) -> Result<()> {
        self.color = load_color(CircuitType::Led, params)?;
        Ok(())
    }

    fn save_state(&self) -> Result<Option<Value>> {
        Ok(Some(serde_json::to_value(OnState { on: self.on })?))
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        let state: OnState = from_state(CircuitType::Led, state)?;
        self.on = state.on;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SegmentStatus {
    #[serde(rename = "A")]
    a: bool,
    #[serde(rename = "B")]
    b: bool,
    #[serde(rename = "C")]
    c: bool,
    #[serde(rename = "D")]
    d: bool,
    #[serde(rename = "E")]
    e: bool,
    #[serde(rename = "F")]
    f: bool,
    #[serde(rename = "G")]
    g: bool,
}

impl From<[bool; 7]> for SegmentStatus {
    fn from([a, b, c, d, e, f, g]: [bool; 7]) -> Self {
        Self { a, b, c, d, e, f, g }
    }
}

impl From<SegmentStatus> for [bool; 7] {
    fn from(s: SegmentStatus) -> Self {
        [s.a, s.b, s.c, s.d, s.e, s.f, s.g]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SegmentState {
    on: SegmentStatus,
}

/// Seven independent segment lamps.
#[derive(Debug, Clone)]
pub struct SevenSegment {
    segments: [bool; 7],
    color: Color,
}

impl Default for SevenSegment {
    fn default() -> Self {
        Self {
            segments: [false; 7],
            color: Color::LIME,
        }
    }
}

impl SevenSegment {
    /// Lit state of each segment, indexed like [`SEGMENTS`].
    pub fn segments(&self) -> [bool; 7] {
        self.segments
    }

    pub fn segment(&self, id: &str) -> Option<bool> {
        SEGMENTS
            .iter()
            .position(|s| *s == id)
            .map(|i| self.segments[i])
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

impl CircuitBehavior for SevenSegment {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::SevenSegment
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        SEGMENTS
            .iter()
            .map(|id| PinDef::input(*id, Side::Left))
            .collect()
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let mut changed = false;
        for (lit, id) in self.segments.iter_mut().zip(SEGMENTS) {
            let input = pins.input(id, ctx.networks);
            if *lit != input {
                *lit = input;
                changed = true;
            }
        }
        changed
    }

    fn save_params(&self) -> Result<Map<String, Value>> {
        to_fields(&ColorParams {
            color: self.color.name(),
        })
    }

    fn load_params(&mut self, params: &Map<String, Value>) -> Result<()> {
        self.color = load_color(CircuitType::SevenSegment, params)?;
        Ok(())
    }

    fn save_state(&self) -> Result<Option<Value>> {
        let state = SegmentState {
            on: self.segments.into(),
        };
        Ok(Some(serde_json::to_value(state)?))
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        let state: SegmentState = from_state(CircuitType::SevenSegment, state)?;
        self.segments = state.on.into();
        Ok(())
    }
}
