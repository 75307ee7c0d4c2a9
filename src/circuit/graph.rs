//! Circuit map and pin link bookkeeping.
//!
//! Links live on the pins themselves as [`PinRef`] keys. Every operation here
//! edits both endpoints so the link relation stays symmetric.

use std::collections::BTreeMap;

use super::base::Circuit;
use super::pin::Pin;
use super::types::{CircuitId, PinRef};
use crate::error::{Result, SimError};

/// All circuits of a simulation, iterated in id order.
pub type CircuitMap = BTreeMap<CircuitId, Circuit>;

/// Look up a pin by reference.
pub fn resolve<'a>(circuits: &'a CircuitMap, pin: &PinRef) -> Option<&'a Pin> {
    circuits.get(&pin.circuit)?.pin(&pin.pin)
}

fn resolve_mut<'a>(circuits: &'a mut CircuitMap, pin: &PinRef) -> Result<&'a mut Pin> {
    circuits
        .get_mut(&pin.circuit)
        .ok_or(SimError::CircuitNotFound { id: pin.circuit })?
        .pin_mut(&pin.pin)
        .ok_or_else(|| SimError::pin_not_found(pin.circuit, pin.pin.clone()))
}

/// Link, unlink or toggle the link between two pins.
///
/// `desired` of `Some(true)` only links, `Some(false)` only unlinks and `None`
/// toggles. Pins of the same circuit are never linked.
///
/// Returns whether the wiring changed.
pub fn connect(
    circuits: &mut CircuitMap,
    a: &PinRef,
    b: &PinRef,
    desired: Option<bool>,
) -> Result<bool> {
    // both ends must exist before either is touched
    resolve_mut(circuits, b)?;
    let linked = resolve_mut(circuits, a)?.is_linked_to(b);
    if a.circuit == b.circuit {
        return Ok(false);
    }

    match (linked, desired) {
        (false, Some(false)) | (true, Some(true)) => Ok(false),
        (false, _) => {
            resolve_mut(circuits, a)?.links.push(b.clone());
            resolve_mut(circuits, b)?.links.push(a.clone());
            Ok(true)
        }
        (true, _) => {
            resolve_mut(circuits, a)?.links.retain(|l| l != b);
            resolve_mut(circuits, b)?.links.retain(|l| l != a);
            Ok(true)
        }
    }
}

/// Remove `pin` from the link list of each of its partners.
///
/// The pin's own list is left alone; callers drop or clear it.
fn detach_partners(circuits: &mut CircuitMap, pin: &PinRef, links: &[PinRef]) {
    for partner in links {
        if let Ok(other) = resolve_mut(circuits, partner) {
            other.links.retain(|l| l != pin);
        }
    }
}

/// Unlink every pin of a circuit from its partners.
pub(crate) fn unlink_circuit(circuits: &mut CircuitMap, id: CircuitId) {
    let Some(circuit) = circuits.get_mut(&id) else {
        return;
    };
    let mut detached = Vec::new();
    for pin in circuit.pins_mut().iter_mut() {
        let links = std::mem::take(&mut pin.links);
        detached.push((PinRef::new(id, pin.id()), links));
    }
    for (pin, links) in detached {
        detach_partners(circuits, &pin, &links);
    }
}

/// Point link partners at the new ids of renamed pins.
pub(crate) fn rename_links(circuits: &mut CircuitMap, owner: CircuitId, renames: &[(String, String)]) {
    for (old, new) in renames {
        let old_ref = PinRef::new(owner, old.as_str());
        let partners = match circuits.get(&owner).and_then(|c| c.pin(new)) {
            Some(pin) => pin.links().to_vec(),
            None => continue,
        };
        for partner in partners {
            if let Ok(other) = resolve_mut(circuits, &partner) {
                for link in other.links.iter_mut().filter(|l| **l == old_ref) {
                    link.pin = new.clone();
                }
            }
        }
    }
}

/// Renumber circuits, rewriting every link to the new ids.
///
/// `mapping` must cover every circuit in the map.
pub(crate) fn remap_ids(circuits: CircuitMap, mapping: &BTreeMap<CircuitId, CircuitId>) -> CircuitMap {
    circuits
        .into_iter()
        .map(|(old, mut circuit)| {
            let new = mapping.get(&old).copied().unwrap_or(old);
            circuit.set_id(new);
            for pin in circuit.pins_mut().iter_mut() {
                for link in pin.links.iter_mut() {
                    if let Some(id) = mapping.get(&link.circuit) {
                        link.circuit = *id;
                    }
                }
            }
            (new, circuit)
        })
        .collect()
}
