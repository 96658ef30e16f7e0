use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::atomic::Atomic;
use super::digraph::DigraphState;
use super::INFINITY;
use crate::utils::errors::SimulationError;

/// Kernel bookkeeping for one atomic model: the caller's hook
/// implementation, the time of the model's last transition, and a
/// non-owning link to the enclosing network.
pub(crate) struct AtomicEntry<X: 'static> {
    pub(crate) hooks: Rc<RefCell<dyn Atomic<X>>>,
    pub(crate) time_of_last_event: f64,
    pub(crate) parent: Weak<RefCell<DigraphState<X>>>,
}

/// The two component variants the simulator dispatches over.
pub(crate) enum ModelKind<X: 'static> {
    Atomic(Rc<RefCell<AtomicEntry<X>>>),
    Network(Rc<RefCell<DigraphState<X>>>),
}

impl<X: 'static> Clone for ModelKind<X> {
    fn clone(&self) -> Self {
        match self {
            ModelKind::Atomic(entry) => ModelKind::Atomic(Rc::clone(entry)),
            ModelKind::Network(state) => ModelKind::Network(Rc::clone(state)),
        }
    }
}

/// `Model` is the shared handle to one simulation component - either an
/// atomic model or a nested network.  Handles are cheap to clone, and
/// every clone refers to the same component; component identity is
/// handle identity.  A handle shares ownership of the caller's model
/// state but networks never become its sole owner, so dropping a
/// network leaves models that the caller still references intact.
pub struct Model<X: 'static> {
    pub(crate) kind: ModelKind<X>,
}

impl<X: 'static> Clone for Model<X> {
    fn clone(&self) -> Self {
        Model {
            kind: self.kind.clone(),
        }
    }
}

impl<X: 'static> Model<X> {
    /// Wraps a caller-owned atomic model into a component handle.  The
    /// caller keeps its own `Rc` to retain typed access to the model
    /// state; the kernel only ever reaches the state through the
    /// `Atomic` hooks.
    pub fn atomic(hooks: Rc<RefCell<dyn Atomic<X>>>) -> Self {
        Model {
            kind: ModelKind::Atomic(Rc::new(RefCell::new(AtomicEntry {
                hooks,
                time_of_last_event: 0.0,
                parent: Weak::new(),
            }))),
        }
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ModelKind::Atomic(a), ModelKind::Atomic(b)) => Rc::ptr_eq(a, b),
            (ModelKind::Network(a), ModelKind::Network(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn parent(&self) -> Option<Rc<RefCell<DigraphState<X>>>> {
        match &self.kind {
            ModelKind::Atomic(entry) => entry.borrow().parent.upgrade(),
            ModelKind::Network(state) => state.borrow().parent.upgrade(),
        }
    }

    pub(crate) fn set_parent(&self, parent: &Rc<RefCell<DigraphState<X>>>) {
        let parent = Rc::downgrade(parent);
        match &self.kind {
            ModelKind::Atomic(entry) => entry.borrow_mut().parent = parent,
            ModelKind::Network(state) => state.borrow_mut().parent = parent,
        }
    }

    /// The absolute time of this component's next internal event:
    /// `time_of_last_event + ta()` for an atomic model, the minimum
    /// over components for a network, `INFINITY` for an empty network.
    /// Querying is free of side effects and repeatable.
    pub(crate) fn time_of_next_event(&self) -> Result<f64, SimulationError> {
        match &self.kind {
            ModelKind::Atomic(entry) => {
                let (hooks, time_of_last_event) = {
                    let entry = entry.borrow();
                    (Rc::clone(&entry.hooks), entry.time_of_last_event)
                };
                Ok(time_of_last_event + checked_ta(&hooks)?)
            }
            ModelKind::Network(state) => {
                let components = state.borrow().components.clone();
                components.iter().try_fold(INFINITY, |min, component| {
                    Ok(f64::min(min, component.time_of_next_event()?))
                })
            }
        }
    }

    /// Gathers every atomic leaf whose next-event time equals `t_next`,
    /// in tree order.  Simultaneous events across different branches are
    /// all included.
    pub(crate) fn collect_imminent(
        &self,
        t_next: f64,
        imminent: &mut Vec<Rc<RefCell<AtomicEntry<X>>>>,
    ) -> Result<(), SimulationError> {
        match &self.kind {
            ModelKind::Atomic(entry) => {
                if self.time_of_next_event()? == t_next {
                    imminent.push(Rc::clone(entry));
                }
            }
            ModelKind::Network(state) => {
                let components = state.borrow().components.clone();
                for component in &components {
                    component.collect_imminent(t_next, imminent)?;
                }
            }
        }
        Ok(())
    }

    /// Total coupling edges in the tree, used as the routing hop bound.
    pub(crate) fn count_couplings(&self) -> usize {
        match &self.kind {
            ModelKind::Atomic(_) => 0,
            ModelKind::Network(state) => {
                let state = state.borrow();
                state.couplings.len()
                    + state
                        .components
                        .iter()
                        .map(Model::count_couplings)
                        .sum::<usize>()
            }
        }
    }
}

/// A time advance must be a non-negative duration or `INFINITY`; a
/// negative or NaN value would corrupt the event ordering.
fn checked_ta<X: 'static>(hooks: &Rc<RefCell<dyn Atomic<X>>>) -> Result<f64, SimulationError> {
    let ta = hooks.borrow().ta()?;
    if ta.is_nan() || ta < 0.0 {
        return Err(SimulationError::NegativeTimeAdvance);
    }
    Ok(ta)
}
