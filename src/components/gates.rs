//! Multi-input logic gate.
//!
//! One gate type covers OR, AND and XOR. Input pins are named `1..=n` and can
//! be added or removed at runtime; the output pin is `Q`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CircuitBehavior, CircuitType, OnState};
use crate::circuit::{CircuitId, Pin, PinDef, PinMap, Side};
use crate::error::{Result, SimError};
use crate::save::{from_fields, from_state, to_fields};
use crate::sim::TickContext;

/// Fewest inputs a gate can be resized to.
pub const MIN_LOGIC_PINS: usize = 2;
/// Most inputs a gate can have.
pub const MAX_LOGIC_PINS: usize = 64;

/// Combining function of a logic gate. Persisted as its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicMode {
    #[default]
    Or = 0,
    And = 1,
    Xor = 2,
}

impl LogicMode {
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::Or),
            1 => Some(Self::And),
            2 => Some(Self::Xor),
            _ => None,
        }
    }

    /// Symbol drawn on the gate body.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "≥1",
            Self::And => "&",
            Self::Xor => "=1",
        }
    }

    /// Combine input values.
    ///
    /// With no inputs OR and XOR give `false` and AND gives `true`.
    pub fn evaluate(&self, inputs: impl IntoIterator<Item = bool>) -> bool {
        let mut inputs = inputs.into_iter();
        match self {
            Self::Or => inputs.any(|v| v),
            Self::And => inputs.all(|v| v),
            Self::Xor => inputs.fold(false, |acc, v| acc ^ v),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogicParams {
    mode: u64,
    pin_count: usize,
}

/// OR / AND / XOR gate with a resizable set of inputs.
#[derive(Debug, Clone)]
pub struct LogicGate {
    mode: LogicMode,
    pin_count: usize,
    on: bool,
}

impl Default for LogicGate {
    fn default() -> Self {
        Self {
            mode: LogicMode::Or,
            pin_count: MIN_LOGIC_PINS,
            on: false,
        }
    }
}

impl LogicGate {
    pub fn mode(&self) -> LogicMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LogicMode) {
        self.mode = mode;
    }

    /// Number of input pins.
    pub fn pin_count(&self) -> usize {
        self.pin_count
    }

    /// Number of input pins that have at least one link.
    pub fn used_input_count(pins: &PinMap) -> usize {
        pins.iter()
            .filter(|pin| pin.is_input && !pin.links().is_empty())
            .count()
    }

    /// Resize the set of input pins.
    ///
    /// Growing appends unlinked pins. Shrinking drops unlinked inputs, lowest
    /// numbers first, and renumbers the survivors densely from `1`. Pins keep
    /// their links and inversion through a rename.
    ///
    /// Returns the `(old, new)` id of every renamed pin so link partners can
    /// be updated. Nothing changes when the request is rejected.
    pub(crate) fn resize_inputs(
        &mut self,
        circuit: CircuitId,
        pins: &mut PinMap,
        count: usize,
    ) -> Result<Vec<(String, String)>> {
        if !(MIN_LOGIC_PINS..=MAX_LOGIC_PINS).contains(&count) {
            return Err(SimError::pin_count_rejected(
                circuit,
                count,
                format!("must be between {MIN_LOGIC_PINS} and {MAX_LOGIC_PINS}"),
            ));
        }

        if count > self.pin_count {
            for n in self.pin_count + 1..=count {
                pins.insert(Pin::from_def(&PinDef::input(n.to_string(), Side::Left)));
            }
            self.pin_count = count;
            return Ok(Vec::new());
        }
        if count == self.pin_count {
            return Ok(Vec::new());
        }

        let mut inputs = input_ids(pins);
        let unlinked: Vec<String> = inputs
            .iter()
            .filter(|id| pins.get(id).is_some_and(|pin| pin.links().is_empty()))
            .cloned()
            .collect();
        let excess = self.pin_count - count;
        if unlinked.len() < excess {
            return Err(SimError::pin_count_rejected(
                circuit,
                count,
                format!(
                    "only {} of {} inputs are unconnected",
                    unlinked.len(),
                    self.pin_count
                ),
            ));
        }

        for id in unlinked.iter().take(excess) {
            pins.remove(id);
        }
        inputs.retain(|id| pins.contains(id));

        // lift every renamed pin out first so new ids never collide
        let mut renames = Vec::new();
        let mut moved = Vec::new();
        for (n, old) in inputs.into_iter().enumerate() {
            let new = (n + 1).to_string();
            if old == new {
                continue;
            }
            if let Some(mut pin) = pins.remove(&old) {
                pin.set_id(new.clone());
                moved.push(pin);
                renames.push((old, new));
            }
        }
        for pin in moved {
            pins.insert(pin);
        }

        log::debug!(
            "Logic gate #{circuit} resized to {count} inputs, {} renamed",
            renames.len()
        );
        self.pin_count = count;
        Ok(renames)
    }
}

/// Input pin ids sorted by their number.
fn input_ids(pins: &PinMap) -> Vec<String> {
    let mut ids: Vec<String> = pins
        .iter()
        .filter(|pin| pin.is_input)
        .map(|pin| pin.id().to_string())
        .collect();
    ids.sort_by_key(|id| id.parse::<usize>().unwrap_or(usize::MAX));
    ids
}

impl CircuitBehavior for LogicGate {
    fn circuit_type(&self) -> CircuitType {
        CircuitType::Logic
    }

    fn pin_layout(&self) -> Vec<PinDef> {
        std::iter::once(PinDef::output("Q", Side::Right))
            .chain((1..=self.pin_count).map(|n| PinDef::input(n.to_string(), Side::Left)))
            .collect()
    }

    fn tick(&mut self, pins: &mut PinMap, ctx: &TickContext<'_>) -> bool {
        let on = self.mode.evaluate(
            pins.iter()
                .filter(|pin| pin.is_input)
                .map(|pin| pin.input(ctx.networks)),
        );
        let changed = on != self.on;
        self.on = on;
        pins.set_out("Q", on);
        changed
    }

    fn restore_outputs(&self, pins: &mut PinMap) {
        pins.set_out("Q", self.on);
    }

    fn save_params(&self) -> Result<Map<String, Value>> {
        to_fields(&LogicParams {
            mode: self.mode as u64,
            pin_count: self.pin_count,
        })
    }

    fn load_params(&mut self, params: &Map<String, Value>) -> Result<()> {
        let params: LogicParams = from_fields(CircuitType::Logic, params)?;
        let mode = LogicMode::from_index(params.mode).ok_or_else(|| {
            SimError::invalid_save(format!("logic: unknown mode {}", params.mode))
        })?;
        if params.pin_count > MAX_LOGIC_PINS {
            return Err(SimError::invalid_save(format!(
                "logic: pin count {} exceeds {MAX_LOGIC_PINS}",
                params.pin_count
            )));
        }
        self.mode = mode;
        self.pin_count = params.pin_count;
        Ok(())
    }

    fn save_state(&self) -> Result<Option<Value>> {
        Ok(Some(serde_json::to_value(OnState { on: self.on })?))
    }

    fn load_state(&mut self, state: &Value) -> Result<()> {
        let state: OnState = from_state(CircuitType::Logic, state)?;
        self.on = state.on;
        Ok(())
    }

    fn is_on(&self) -> Option<bool> {
        Some(self.on)
    }
}
