//! Circuit representation.
//!
//! This module provides the [`Circuit`] struct (one placed element with its
//! pins and variant behaviour), the pin types, and the link bookkeeping that
//! keeps pin connections symmetric across a [`CircuitMap`].

mod base;
mod graph;
mod pin;
mod types;
mod validate;

pub use base::Circuit;
pub use graph::{connect, resolve, CircuitMap};
pub(crate) use graph::{rename_links, remap_ids, unlink_circuit};
pub use pin::{Pin, PinDef, PinMap};
pub use types::*;
pub use validate::validate_links;
