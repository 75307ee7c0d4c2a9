//! Storage elements: SR latch and edge-triggered flip-flops.
//!
//! Every element keeps one stored bit and drives it on `Q`, with the
//! complement on `~Q`. Flip-flops sample their clock input each tick and act
//! only on a rising edge (low on the previous tick, high now). The previous
//! sample is saved with the state as `lastClock`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CircuitBehavior, CircuitType, OnState};
use crate::circuit::{PinDef, PinMap, Side};
use crate::error::Result;
use crate::save::from_state;
use crate::sim::TickContext;

/// Rising edge detector for a clock input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockEdge {
    last: bool,
}

impl ClockEdge {
    /// Record `clock` and report whether it rose since the last sample.
    pub fn rising(&mut self, clock: bool) -> bool {
        let rose = clock && !self.last;
        self.last = clock;
        rose
    }

    /// Clock level seen on the previous sample.
    pub fn last(&self) -> bool {
        self.last
    }

    /// Restore the previous sample.
    pub fn set_last(&mut self, last: bool) {
        self.last = last;
    }
}

fn q_outputs() -> [PinDef; 2] {
    [
        PinDef::output("Q", Side::Right),
        PinDef::output("~Q", Side::Right).with_label("Q\u{0305}"),
    ]
}

fn clock_input() -> PinDef {
    PinDef::input("CLK", Side::Left).with_label("▶")
}

/// Persisted state of a clocked flip-flop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct FlipFlopState {
    on: bool,
    #[serde(rename = "lastClock", default)]
    last_clock: bool,
}

fn save_flip_flop(on: bool, clock: ClockEdge) -> Result<Option<Value>> {
    let state = FlipFlopState {
        on,
        last_clock: clock.last(),
    };
    Ok(Some(serde_json::to_value(state)?))
}

fn load_flip_flop(
    circuit_type: CircuitType,
    state: &Value,
    clock: &mut ClockEdge,
) -> Result<bool> {
    let state: FlipFlopState = from_state(circuit_type, state)?;
    clock.set_last(state.last_clock);
    Ok(state.on)
}

fn q_levels(pins: &PinMap) -> (bool, bool) {
    let out = |id| pins.get(id).is_some_and(|pin| pin.out);
    (out("Q"), out("~Q"))
}

/// Drive `Q` and `~Q`. Returns whether either output changed.
fn drive_outputs(pins: &mut PinMap, q: bool, not_q: bool) -> bool {
    let before = q_levels(pins);
    pins.set_out("Q", q);
    pins.set_out("~Q", not_q);
    before != (q, not_q)
}

/// Level-sensitive set/reset latch.
///
/// With both `S` and `R` high, both outputs are driven low and the stored bit
/// is left alone.
#[derive(Debug, Clone, Default)]
pub struct SrLatch {
    on: bool,
}

impl CircuitBehavior for SrLatch {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::SrLatch
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        let mut defs = vec![PinDef::input("S", Side::Left), PinDef::input("R", Side::Left)];
        defs.extend(q_outputs());
        defs
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let s = pins.input("S", ctx.networks);
        let r = pins.input("R", ctx.networks);
        if s && r {
            return drive_outputs(pins, false, false);
        }
        if s {
            self.on = true;
        }
        if r {
            self.on = false;
        }
        drive_outputs(pins, self.on, !self.on)
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_q(self.on);
    }

    fn save_state(&self) -> Result<Option<Value>> {
        Ok(Some(serde_json::to_value(OnState { on: self.on })?))
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        let state: OnState = from_state(CircuitType::SrLatch, state)?;
        self.on = state.on;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}

/// Clocked set/reset flip-flop.
///
/// On a rising edge with both `S` and `R` high, both outputs are driven low
/// for that tick; the next tick drives the stored bit again.
#[derive(Debug, Clone, Default)]
pub struct SrFlipFlop {
    on: bool,
    clock: ClockEdge,
}

impl CircuitBehavior for SrFlipFlop {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::SrFlipFlop
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        let mut defs = vec![
            PinDef::input("S", Side::Left),
            clock_input(),
            PinDef::input("R", Side::Left),
        ];
        defs.extend(q_outputs());
        defs
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        if self.clock.rising(pins.input("CLK", ctx.networks)) {
            let s = pins.input("S", ctx.networks);
            let r = pins.input("R", ctx.networks);
            if s && r {
                return drive_outputs(pins, false, false);
            }
            if s {
                self.on = true;
            }
            if r {
                self.on = false;
            }
        }
        drive_outputs(pins, self.on, !self.on)
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_q(self.on);
    }

    fn save_state(&self) -> Result<Option<Value>> {
        save_flip_flop(self.on, self.clock)
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        self.on = load_flip_flop(CircuitType::SrFlipFlop, state, &mut self.clock)?;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}

/// Clocked JK flip-flop. `J` and `K` both high toggles the stored bit.
#[derive(Debug, Clone, Default)]
pub struct JkFlipFlop {
    on: bool,
    clock: ClockEdge,
}

impl CircuitBehavior for JkFlipFlop {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::JkFlipFlop
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        let mut defs = vec![
            PinDef::input("J", Side::Left),
            clock_input(),
            PinDef::input("K", Side::Left),
        ];
        defs.extend(q_outputs());
        defs
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let before = self.on;
        if self.clock.rising(pins.input("CLK", ctx.networks)) {
            let j = pins.input("J", ctx.networks);
            let k = pins.input("K", ctx.networks);
            self.on = match (j, k) {
                (true, true) => !self.on,
                (true, false) => true,
                (false, true) => false,
                (false, false) => self.on,
            };
        }
        pins.set_q(self.on);
        before != self.on
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_q(self.on);
    }

    fn save_state(&self) -> Result<Option<Value>> {
        save_flip_flop(self.on, self.clock)
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        self.on = load_flip_flop(CircuitType::JkFlipFlop, state, &mut self.clock)?;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}

/// Asynchronous set (top) and reset (bottom) inputs shared by the D and T
/// flip-flops.
fn async_set_reset(pins: &PinMap, ctx: &TickContext<'_>) -> Option<bool> {
    if pins.input("R", ctx.networks) {
        Some(false)
    } else if pins.input("S", ctx.networks) {
        Some(true)
    } else {
        None
    }
}

fn set_reset_pins() -> [PinDef; 2] {
    [PinDef::input("S", Side::Top), PinDef::input("R", Side::Bottom)]
}

/// Clocked data flip-flop with asynchronous set and reset.
///
/// `R` wins over `S`, and both win over the clock.
#[derive(Debug, Clone, Default)]
pub struct DFlipFlop {
    on: bool,
    clock: ClockEdge,
}

impl CircuitBehavior for DFlipFlop {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::DFlipFlop
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        let mut defs = vec![PinDef::input("D", Side::Left), clock_input()];
        defs.extend(q_outputs());
        defs.extend(set_reset_pins());
        defs
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let before = self.on;
        let rising = self.clock.rising(pins.input("CLK", ctx.networks));
        if let Some(forced) = async_set_reset(pins, ctx) {
            self.on = forced;
        } else if rising {
            self.on = pins.input("D", ctx.networks);
        }
        pins.set_q(self.on);
        before != self.on
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_q(self.on);
    }

    fn save_state(&self) -> Result<Option<Value>> {
        save_flip_flop(self.on, self.clock)
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        self.on = load_flip_flop(CircuitType::DFlipFlop, state, &mut self.clock)?;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}

/// Clocked toggle flip-flop with asynchronous set and reset.
#[derive(Debug, Clone, Default)]
pub struct TFlipFlop {
    on: bool,
    clock: ClockEdge,
}

impl CircuitBehavior for TFlipFlop {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::TFlipFlop
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        let mut defs = vec![PinDef::input("T", Side::Left), clock_input()];
        defs.extend(q_outputs());
        defs.extend(set_reset_pins());
        defs
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let before = self.on;
        let rising = self.clock.rising(pins.input("CLK", ctx.networks));
        if let Some(forced) = async_set_reset(pins, ctx) {
            self.on = forced;
        } else if rising && pins.input("T", ctx.networks) {
            self.on = !self.on;
        }
        pins.set_q(self.on);
        before != self.on
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_q(self.on);
    }

    fn save_state(&self) -> Result<Option<Value>> {
        save_flip_flop(self.on, self.clock)
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        self.on = load_flip_flop(CircuitType::TFlipFlop, state, &mut self.clock)?;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}
