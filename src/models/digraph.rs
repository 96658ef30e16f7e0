use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::model::{AtomicEntry, Model, ModelKind};
use super::Port;
use crate::utils::errors::SimulationError;

/// `Digraph` composes atomic and nested network models through a
/// coupling relation, routing outputs of one component's port to inputs
/// of another's.  Components are registered with [`Digraph::add`] and
/// connected with [`Digraph::couple`]; the network's own ports appear
/// in couplings by passing the digraph's handle (see
/// [`Digraph::as_model`]) as an endpoint, which is how events cross the
/// network boundary in either direction.
///
/// The digraph holds shared, non-owning references to its components.
/// The caller remains the owner of model state, and dropping a digraph
/// leaves its components untouched.
pub struct Digraph<X: 'static> {
    pub(crate) state: Rc<RefCell<DigraphState<X>>>,
}

impl<X: 'static> Clone for Digraph<X> {
    fn clone(&self) -> Self {
        Digraph {
            state: Rc::clone(&self.state),
        }
    }
}

pub(crate) struct DigraphState<X: 'static> {
    pub(crate) components: Vec<Model<X>>,
    pub(crate) couplings: Vec<Coupling>,
    pub(crate) parent: Weak<RefCell<DigraphState<X>>>,
}

/// One endpoint of a coupling, relative to the owning digraph: a direct
/// component, or the digraph's own external ports.  As a coupling
/// source, `Network` is the digraph's input side; as a target, its
/// output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Component(usize),
    Network,
}

/// A directed edge of the coupling relation.  Duplicate edges are legal
/// and route independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Coupling {
    pub(crate) source: Endpoint,
    pub(crate) source_port: Port,
    pub(crate) target: Endpoint,
    pub(crate) target_port: Port,
}

impl<X: 'static> Digraph<X> {
    /// Creates an empty network, with no components and no couplings.
    pub fn new() -> Self {
        Digraph {
            state: Rc::new(RefCell::new(DigraphState {
                components: Vec::new(),
                couplings: Vec::new(),
                parent: Weak::new(),
            })),
        }
    }

    /// The network viewed as a component handle, for nesting inside
    /// another network, naming the network's own ports in couplings, or
    /// constructing a simulator.
    pub fn as_model(&self) -> Model<X> {
        Model {
            kind: ModelKind::Network(Rc::clone(&self.state)),
        }
    }

    /// Registers a model as a component of this network and records
    /// this network as its parent.  A model belongs to at most one
    /// network at a time, so adding a model twice - to this network or
    /// to any other - is a configuration error, as is nesting a network
    /// inside itself or one of its descendants.
    pub fn add(&self, model: &Model<X>) -> Result<(), SimulationError> {
        if let ModelKind::Network(state) = &model.kind {
            if Rc::ptr_eq(state, &self.state) || self.has_ancestor(state) {
                return Err(SimulationError::NetworkCycle);
            }
        }
        if model.parent().is_some() {
            return Err(SimulationError::ModelAlreadyOwned);
        }
        model.set_parent(&self.state);
        self.state.borrow_mut().components.push(model.clone());
        Ok(())
    }

    /// Appends a coupling from `(source, source_port)` to
    /// `(target, target_port)`.  Both endpoints must already be
    /// components of this network, or the network itself for external
    /// pass-through.  Self-coupling of a component is legal, and the
    /// same edge may be added repeatedly to fan out multiple deliveries.
    pub fn couple(
        &self,
        source: &Model<X>,
        source_port: Port,
        target: &Model<X>,
        target_port: Port,
    ) -> Result<(), SimulationError> {
        let source = self
            .endpoint_of(source)
            .ok_or(SimulationError::ModelNotFound)?;
        let target = self
            .endpoint_of(target)
            .ok_or(SimulationError::ModelNotFound)?;
        self.state.borrow_mut().couplings.push(Coupling {
            source,
            source_port,
            target,
            target_port,
        });
        Ok(())
    }

    /// The direct components of this network, in insertion order.  Not
    /// recursive; nested networks enumerate their own components.
    pub fn components(&self) -> Vec<Model<X>> {
        self.state.borrow().components.clone()
    }

    fn endpoint_of(&self, model: &Model<X>) -> Option<Endpoint> {
        if let ModelKind::Network(state) = &model.kind {
            if Rc::ptr_eq(state, &self.state) {
                return Some(Endpoint::Network);
            }
        }
        self.state
            .borrow()
            .components
            .iter()
            .position(|component| component.ptr_eq(model))
            .map(Endpoint::Component)
    }

    fn has_ancestor(&self, candidate: &Rc<RefCell<DigraphState<X>>>) -> bool {
        let mut current = self.state.borrow().parent.upgrade();
        while let Some(state) = current {
            if Rc::ptr_eq(&state, candidate) {
                return true;
            }
            current = state.borrow().parent.upgrade();
        }
        false
    }
}

impl<X: 'static> Default for Digraph<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X: 'static> IntoIterator for &Digraph<X> {
    type Item = Model<X>;
    type IntoIter = std::vec::IntoIter<Model<X>>;

    fn into_iter(self) -> Self::IntoIter {
        self.components().into_iter()
    }
}

impl<X: 'static> DigraphState<X> {
    pub(crate) fn index_of_atomic(&self, entry: &Rc<RefCell<AtomicEntry<X>>>) -> Option<usize> {
        self.components.iter().position(|component| {
            matches!(&component.kind, ModelKind::Atomic(existing) if Rc::ptr_eq(existing, entry))
        })
    }

    pub(crate) fn index_of_network(&self, state: &Rc<RefCell<DigraphState<X>>>) -> Option<usize> {
        self.components.iter().position(|component| {
            matches!(&component.kind, ModelKind::Network(existing) if Rc::ptr_eq(existing, state))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Atomic;

    struct Passive;

    impl Atomic<i32> for Passive {}

    fn passive() -> Model<i32> {
        Model::atomic(Rc::new(RefCell::new(Passive)))
    }

    #[test]
    fn add_registers_components_in_insertion_order() {
        let network = Digraph::new();
        let first = passive();
        let second = passive();
        network.add(&first).unwrap();
        network.add(&second).unwrap();
        let components = network.components();
        assert_eq!(components.len(), 2);
        assert!(components[0].ptr_eq(&first));
        assert!(components[1].ptr_eq(&second));
    }

    #[test]
    fn add_same_model_twice_fails() {
        let network = Digraph::new();
        let model = passive();
        network.add(&model).unwrap();
        assert!(matches!(
            network.add(&model),
            Err(SimulationError::ModelAlreadyOwned)
        ));
    }

    #[test]
    fn add_to_second_network_fails() {
        let first = Digraph::new();
        let second = Digraph::new();
        let model = passive();
        first.add(&model).unwrap();
        assert!(matches!(
            second.add(&model),
            Err(SimulationError::ModelAlreadyOwned)
        ));
    }

    #[test]
    fn add_network_to_itself_fails() {
        let network: Digraph<i32> = Digraph::new();
        assert!(matches!(
            network.add(&network.as_model()),
            Err(SimulationError::NetworkCycle)
        ));
    }

    #[test]
    fn add_ancestor_as_component_fails() {
        let outer: Digraph<i32> = Digraph::new();
        let inner: Digraph<i32> = Digraph::new();
        outer.add(&inner.as_model()).unwrap();
        assert!(matches!(
            inner.add(&outer.as_model()),
            Err(SimulationError::NetworkCycle)
        ));
    }

    #[test]
    fn couple_before_add_fails() {
        let network = Digraph::new();
        let added = passive();
        let stray = passive();
        network.add(&added).unwrap();
        assert!(matches!(
            network.couple(&added, 0, &stray, 0),
            Err(SimulationError::ModelNotFound)
        ));
        assert!(matches!(
            network.couple(&stray, 0, &added, 0),
            Err(SimulationError::ModelNotFound)
        ));
    }

    #[test]
    fn couple_network_self_ports_is_pass_through() {
        let network: Digraph<i32> = Digraph::new();
        network
            .couple(&network.as_model(), 0, &network.as_model(), 1)
            .unwrap();
        let state = network.state.borrow();
        assert_eq!(state.couplings.len(), 1);
        assert_eq!(state.couplings[0].source, Endpoint::Network);
        assert_eq!(state.couplings[0].target, Endpoint::Network);
    }

    #[test]
    fn duplicate_couplings_are_independent_edges() {
        let network = Digraph::new();
        let source = passive();
        let target = passive();
        network.add(&source).unwrap();
        network.add(&target).unwrap();
        network.couple(&source, 0, &target, 0).unwrap();
        network.couple(&source, 0, &target, 0).unwrap();
        assert_eq!(network.state.borrow().couplings.len(), 2);
    }

    #[test]
    fn dropping_a_network_leaves_components_alive() {
        let state = Rc::new(RefCell::new(Passive));
        let hooks: Rc<RefCell<dyn Atomic<i32>>> = state.clone();
        let model = Model::atomic(hooks);
        let network = Digraph::new();
        network.add(&model).unwrap();
        drop(network);
        drop(model);
        assert_eq!(Rc::strong_count(&state), 1);
    }
}
