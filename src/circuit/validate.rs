//! Link graph validation.

use crate::error::{Result, SimError};

use super::graph::{resolve, CircuitMap};
use super::types::PinRef;

/// Validate the link graph of a set of circuits.
///
/// Checks:
/// - Every link target exists
/// - Every link is listed on both endpoints
/// - No pin is linked to a pin of its own circuit
pub fn validate_links(circuits: &CircuitMap) -> Result<()> {
    for (id, circuit) in circuits {
        for pin in circuit.pins().iter() {
            let from = PinRef::new(*id, pin.id());
            for to in pin.links() {
                let Some(other) = resolve(circuits, to) else {
                    return Err(SimError::DanglingLink {
                        from,
                        to: to.clone(),
                    });
                };
                if to.circuit == *id || !other.is_linked_to(&from) {
                    return Err(SimError::NetworkConflict {
                        from,
                        to: to.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{connect, CircuitId};
    use crate::components::create_circuit;

    fn circuits() -> CircuitMap {
        let mut circuits = CircuitMap::new();
        for (n, ty) in [(1, "switch"), (2, "led")] {
            let mut circuit = create_circuit(ty).unwrap();
            circuit.set_id(CircuitId(n));
            circuits.insert(CircuitId(n), circuit);
        }
        circuits
    }

    #[test]
    fn test_valid_links() {
        let mut circuits = circuits();
        let q = PinRef::new(CircuitId(1), "Q");
        let i = PinRef::new(CircuitId(2), "I");
        connect(&mut circuits, &q, &i, None).unwrap();
        assert!(validate_links(&circuits).is_ok());
    }

    #[test]
    fn test_one_sided_link() {
        let mut circuits = circuits();
        circuits
            .get_mut(&CircuitId(1))
            .unwrap()
            .pin_mut("Q")
            .unwrap()
            .links
            .push(PinRef::new(CircuitId(2), "I"));
        assert!(matches!(
            validate_links(&circuits),
            Err(SimError::NetworkConflict { .. })
        ));
    }

    #[test]
    fn test_dangling_link() {
        let mut circuits = circuits();
        circuits
            .get_mut(&CircuitId(1))
            .unwrap()
            .pin_mut("Q")
            .unwrap()
            .links
            .push(PinRef::new(CircuitId(5), "I"));
        assert!(matches!(
            validate_links(&circuits),
            Err(SimError::DanglingLink { .. })
        ));
    }
}
