use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::models::digraph::{DigraphState, Endpoint};
use crate::models::model::{AtomicEntry, ModelKind};
use crate::models::{Port, PortValue};
use crate::utils::errors::SimulationError;

/// A produced event awaiting resolution, expressed against the coupling
/// table of one network: the endpoint within `scope` that produced it,
/// the port it left on, and the carried value.  `depth` counts the
/// coupling edges traversed along this event's chain since the
/// originating output.
struct PendingEvent<X: 'static> {
    scope: Rc<RefCell<DigraphState<X>>>,
    source: Endpoint,
    port: Port,
    value: X,
    depth: usize,
}

/// The routing result: for every atomic model reached by at least one
/// event this step, its input batch.  Destinations appear in first
/// delivery order and batches accumulate in production order.
pub(crate) struct Deliveries<X: 'static> {
    batches: Vec<(Rc<RefCell<AtomicEntry<X>>>, Vec<PortValue<X>>)>,
}

impl<X: 'static> Deliveries<X> {
    fn push(&mut self, entry: Rc<RefCell<AtomicEntry<X>>>, input: PortValue<X>) {
        match self
            .batches
            .iter_mut()
            .find(|(existing, _)| Rc::ptr_eq(existing, &entry))
        {
            Some((_, batch)) => batch.push(input),
            None => self.batches.push((entry, vec![input])),
        }
    }

    /// Consumes the deliveries, yielding each destination with its
    /// batch sorted stably by port - so inputs arrive ordered by port
    /// first and production order within a port.
    pub(crate) fn into_batches(self) -> Vec<(Rc<RefCell<AtomicEntry<X>>>, Vec<PortValue<X>>)> {
        self.batches
            .into_iter()
            .map(|(entry, mut batch)| {
                batch.sort_by_key(|input| input.port);
                (entry, batch)
            })
            .collect()
    }
}

/// Resolves the outputs produced by the imminent set into final atomic
/// destinations, descending into nested networks through their input
/// ports and climbing out through their output ports.  An event
/// reaching the root network's own output ports leaves the simulated
/// system and is dropped, as are the outputs of a root atomic model.
///
/// The traversal is an explicit worklist, not recursion, and each
/// event's chain depth is checked against `hop_limit` (the total
/// coupling-edge count of the model tree).  A chain longer than the
/// edge count must have traversed some edge twice, which only a
/// structural pass-through cycle allows, so such chains fail fast
/// instead of looping.
pub(crate) fn route<X: Clone + 'static>(
    origins: Vec<(Rc<RefCell<AtomicEntry<X>>>, Vec<PortValue<X>>)>,
    hop_limit: usize,
) -> Result<Deliveries<X>, SimulationError> {
    let mut deliveries = Deliveries {
        batches: Vec::new(),
    };
    let mut pending: VecDeque<PendingEvent<X>> = VecDeque::new();
    for (entry, outputs) in origins {
        let scope = match entry.borrow().parent.upgrade() {
            Some(scope) => scope,
            None => continue,
        };
        let source = scope
            .borrow()
            .index_of_atomic(&entry)
            .map(Endpoint::Component)
            .ok_or(SimulationError::ModelNotFound)?;
        for output in outputs {
            pending.push_back(PendingEvent {
                scope: Rc::clone(&scope),
                source,
                port: output.port,
                value: output.value,
                depth: 0,
            });
        }
    }
    while let Some(event) = pending.pop_front() {
        if event.depth > hop_limit {
            tracing::debug!(
                depth = event.depth,
                hop_limit,
                "event routing exceeded the coupling edge count"
            );
            return Err(SimulationError::CouplingCycle);
        }
        let (couplings, components, parent) = {
            let scope = event.scope.borrow();
            (
                scope.couplings.clone(),
                scope.components.clone(),
                scope.parent.upgrade(),
            )
        };
        for coupling in couplings
            .iter()
            .filter(|coupling| coupling.source == event.source && coupling.source_port == event.port)
        {
            match coupling.target {
                Endpoint::Component(index) => match &components[index].kind {
                    ModelKind::Atomic(entry) => deliveries.push(
                        Rc::clone(entry),
                        PortValue::new(coupling.target_port, event.value.clone()),
                    ),
                    ModelKind::Network(child) => pending.push_back(PendingEvent {
                        scope: Rc::clone(child),
                        source: Endpoint::Network,
                        port: coupling.target_port,
                        value: event.value.clone(),
                        depth: event.depth + 1,
                    }),
                },
                Endpoint::Network => {
                    if let Some(parent) = &parent {
                        let index = parent
                            .borrow()
                            .index_of_network(&event.scope)
                            .ok_or(SimulationError::ModelNotFound)?;
                        pending.push_back(PendingEvent {
                            scope: Rc::clone(parent),
                            source: Endpoint::Component(index),
                            port: coupling.target_port,
                            value: event.value.clone(),
                            depth: event.depth + 1,
                        });
                    }
                }
            }
        }
    }
    Ok(deliveries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Weak;

    fn entry() -> Rc<RefCell<AtomicEntry<i32>>> {
        use crate::models::Atomic;

        struct Passive;
        impl Atomic<i32> for Passive {}

        Rc::new(RefCell::new(AtomicEntry {
            hooks: Rc::new(RefCell::new(Passive)),
            time_of_last_event: 0.0,
            parent: Weak::new(),
        }))
    }

    #[test]
    fn batches_accumulate_per_destination_and_sort_by_port() {
        let first = entry();
        let second = entry();
        let mut deliveries = Deliveries {
            batches: Vec::new(),
        };
        deliveries.push(Rc::clone(&first), PortValue::new(3, 30));
        deliveries.push(Rc::clone(&second), PortValue::new(0, 1));
        deliveries.push(Rc::clone(&first), PortValue::new(1, 10));
        deliveries.push(Rc::clone(&first), PortValue::new(3, 31));
        let batches = deliveries.into_batches();
        assert_eq!(batches.len(), 2);
        assert!(Rc::ptr_eq(&batches[0].0, &first));
        assert_eq!(
            batches[0].1,
            vec![
                PortValue::new(1, 10),
                PortValue::new(3, 30),
                PortValue::new(3, 31),
            ]
        );
        assert!(Rc::ptr_eq(&batches[1].0, &second));
        assert_eq!(batches[1].1, vec![PortValue::new(0, 1)]);
    }

    #[test]
    fn root_atomic_outputs_are_dropped() {
        let orphan = entry();
        let deliveries = route(vec![(orphan, vec![PortValue::new(0, 7)])], 0).unwrap();
        assert!(deliveries.into_batches().is_empty());
    }
}
