//! 4-bit binary to 7-segment decoder.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CircuitBehavior, CircuitType, SEGMENTS};
use crate::circuit::{PinDef, PinMap, Side};
use crate::error::{Result, SimError};
use crate::save::from_state;
use crate::sim::TickContext;

/// Binary input pin ids, least significant first.
const DATA_PINS: [&str; 4] = ["D0", "D1", "D2", "D3"];

/// Segment pattern per hex digit. Bit 6 is segment A, bit 0 is segment G.
pub const TRUTH_TABLE: [u8; 16] = [
    0x7E, 0x30, 0x6D, 0x79, 0x33, 0x5B, 0x5F, 0x70, // 0-7
    0x7F, 0x7B, 0x77, 0x1F, 0x4E, 0x3D, 0x4F, 0x47, // 8-F
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DecoderState {
    #[serde(default)]
    num: Option<u8>,
}

/// Combinational decoder driving a 7-segment display from `D0..D3`.
#[derive(Debug, Clone, Default)]
pub struct SevenSegmentDecoder {
    /// Last decoded value, `None` until the first tick
    num: Option<u8>,
}

impl SevenSegmentDecoder {
    /// Last decoded value.
    pub fn value(&self) -> Option<u8> {
        self.num
    }

    fn write_outputs(num: u8, pins: &mut PinMap) {
        let pattern = TRUTH_TABLE[usize::from(num & 0xf)];
        for (i, id) in SEGMENTS.iter().enumerate() {
            pins.set_out(id, pattern & (0x40 >> i) != 0);
        }
    }
}

impl CircuitBehavior for SevenSegmentDecoder {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::SevenSegmentDecoder
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        DATA_PINS
            .iter()
            .map(|id| PinDef::input(*id, Side::Left))
            .chain(SEGMENTS.iter().map(|id| PinDef::output(*id, Side::Right)))
            .collect()
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let num = DATA_PINS
            .iter()
            .enumerate()
            .filter(|(_, id)| pins.input(id, ctx.networks))
            .fold(0u8, |acc, (bit, _)| acc | (1 << bit));
        if self.num != Some(num) {
            self.num = Some(num);
            Self::write_outputs(num, pins);
        }
        false
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        if let Some(num) = self.num {
            Self::write_outputs(num, pins);
        }
    }

    fn save_state(&self) -> Result<Option<Value>> {
        match self.num {
            Some(num) => Ok(Some(serde_json::to_value(DecoderState { num: Some(num) })?)),
            None => Ok(None),
        }
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        let state: DecoderState = from_state(CircuitType::SevenSegmentDecoder, state)?;
        if let Some(num) = state.num.filter(|num| *num > 0xf) {
            return Err(SimError::invalid_save(format!(
                "{}: decoded value {num} out of range",
                CircuitType::SevenSegmentDecoder
            )));
        }
        self.num = state.num;
        Ok(())
    }
}
