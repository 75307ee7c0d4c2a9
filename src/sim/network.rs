//! Networks: groups of pins joined by links.
//!
//! Networks are never patched. Whenever the wiring changes the whole set is
//! thrown away and rebuilt from the link graph, then evaluated.

use std::collections::BTreeMap;

use crate::circuit::{resolve, CircuitId, CircuitMap, NetworkId, Pin, PinRef};
use crate::error::{Result, SimError};

/// A set of pins sharing one logic level.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pins: Vec<PinRef>,
    active: bool,
}

impl Network {
    /// Member pins.
    pub fn pins(&self) -> &[PinRef] {
        &self.pins
    }

    /// Check whether any member drives the network high.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Owner of all networks of a simulation.
#[derive(Debug, Clone, Default)]
pub struct NetworkManager {
    networks: Vec<Network>,
}

impl NetworkManager {
    /// Create a manager with no networks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild every network from the link graph and evaluate it.
    ///
    /// Each pin ends up in exactly one network; unlinked pins get a network of
    /// their own. Fails if the links are inconsistent (a link to a missing pin,
    /// or linked pins landing in different networks).
    pub fn recreate(&mut self, circuits: &mut CircuitMap) -> Result<()> {
        self.networks.clear();

        let mut all_pins = Vec::new();
        for (id, circuit) in circuits.iter_mut() {
            for pin in circuit.pins_mut().iter_mut() {
                pin.network = None;
                all_pins.push(PinRef::new(*id, pin.id()));
            }
        }

        for start in all_pins {
            if network_of(circuits, &start)?.is_some() {
                continue;
            }
            let net = NetworkId(self.networks.len());
            let mut members = Vec::new();
            // iterative DFS
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                let pin = pin_mut(circuits, &current)?;
                if pin.network.is_some() {
                    continue;
                }
                pin.network = Some(net);
                let links = pin.links().to_vec();
                for link in links {
                    match network_of(circuits, &link) {
                        Ok(None) => stack.push(link),
                        Ok(Some(existing)) if existing == net => {}
                        Ok(Some(_)) => {
                            return Err(SimError::NetworkConflict {
                                from: current,
                                to: link,
                            })
                        }
                        Err(_) => {
                            return Err(SimError::DanglingLink {
                                from: current,
                                to: link,
                            })
                        }
                    }
                }
                members.push(current);
            }
            self.networks.push(Network {
                pins: members,
                active: false,
            });
        }

        log::debug!("Rebuilt {} networks", self.networks.len());
        self.evaluate(circuits);
        Ok(())
    }

    /// Recompute every network's level as the OR of its members' outputs.
    pub fn evaluate(&mut self, circuits: &CircuitMap) {
        for network in &mut self.networks {
            network.active = network
                .pins
                .iter()
                .any(|pin| resolve(circuits, pin).is_some_and(|pin| pin.output()));
        }
    }

    /// Level of a network. Unknown ids read low.
    pub fn is_active(&self, id: NetworkId) -> bool {
        self.networks.get(id.0).is_some_and(Network::is_active)
    }

    pub fn get(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(id.0)
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Rewrite member references after circuits were renumbered.
    pub(crate) fn remap(&mut self, mapping: &BTreeMap<CircuitId, CircuitId>) {
        for network in &mut self.networks {
            for pin in &mut network.pins {
                if let Some(id) = mapping.get(&pin.circuit) {
                    pin.circuit = *id;
                }
            }
        }
    }

    /// Drop every network.
    pub(crate) fn clear(&mut self) {
        self.networks.clear();
    }
}

fn pin_mut<'a>(circuits: &'a mut CircuitMap, pin: &PinRef) -> Result<&'a mut Pin> {
    circuits
        .get_mut(&pin.circuit)
        .and_then(|circuit| circuit.pin_mut(&pin.pin))
        .ok_or_else(|| SimError::pin_not_found(pin.circuit, pin.pin.clone()))
}

fn network_of(circuits: &CircuitMap, pin: &PinRef) -> Result<Option<NetworkId>> {
    resolve(circuits, pin)
        .map(|pin| pin.network())
        .ok_or_else(|| SimError::pin_not_found(pin.circuit, pin.pin.clone()))
}
