//! Clock: a free-running pulse generator.
//!
//! The clock has no timer of its own. Its phase is a pure function of the
//! simulation tick counter:
//!
//! ```text
//! phase = (tick + shift) mod (on + off)
//! Q     = phase >= off
//! ```
//!
//! so each period starts with `off` low ticks followed by `on` high ticks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CircuitBehavior, CircuitType};
use crate::circuit::{PinDef, PinMap, Side};
use crate::error::{Result, SimError};
use crate::save::{from_fields, to_fields};
use crate::sim::TickContext;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ClockParams {
    on: u32,
    off: u32,
    shift: i64,
}

/// Periodic on/off pulse source.
#[derive(Debug, Clone)]
pub struct Clock {
    /// High ticks per period
    on: u32,
    /// Low ticks per period
    off: u32,
    /// Phase shift in ticks
    shift: i64,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            on: 1,
            off: 1,
            shift: 0,
        }
    }
}

impl Clock {
    /// Create a new clock.
    ///
    /// Both durations must be at least one tick.
    pub fn new(on: u32, off: u32, shift: i64) -> Result<Self> {
        let mut clock = Self::default();
        clock.set_timing(on, off, shift)?;
        Ok(clock)
    }

    /// Get the high duration in ticks.
    pub fn on_ticks(&self) -> u32 {
        self.on
    }

    /// Get the low duration in ticks.
    pub fn off_ticks(&self) -> u32 {
        self.off
    }

    /// Get the phase shift in ticks.
    pub fn shift(&self) -> i64 {
        self.shift
    }

    /// Change the timing. Rejected without change if a duration is zero.
    pub fn set_timing(&mut self, on: u32, off: u32, shift: i64) -> Result<()> {
        if on == 0 {
            return Err(SimError::invalid_parameter("on", "must be at least 1 tick"));
        }
        if off == 0 {
            return Err(SimError::invalid_parameter("off", "must be at least 1 tick"));
        }
        self.on = on;
        self.off = off;
        self.shift = shift;
        Ok(())
    }

    /// Output level at the given tick.
    pub fn level_at(&self, tick: u64) -> bool {
        let period = i128::from(self.on) + i128::from(self.off);
        let phase = (i128::from(tick) + i128::from(self.shift)).rem_euclid(period);
        phase >= i128::from(self.off)
    }
}

impl CircuitBehavior for Clock {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::Clock
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        vec![
            PinDef::output("Q", Side::Right),
            PinDef::output("~Q", Side::Right).with_label("Q\u{0305}"),
        ]
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        pins.set_q(self.level_at(ctx.tick));
        false
    }

    fn save_params(&self) -> Result<Map<String, Value>> {
        to_fields(&ClockParams {
            on: self.on,
            off: self.off,
            shift: self.shift,
        })
    }

    fn load_params(&mut self, params: &Map<String, Value>) -> Result<()> {
        let params: ClockParams = from_fields(CircuitType::Clock, params)?;
        self.set_timing(params.on, params.off, params.shift)
            .map_err(|e| SimError::invalid_save(format!("clock: {e}")))
    }
}
