//! The simulator module provides the mechanics to advance a model tree
//! through discrete event simulation, per the Discrete Event System
//! Specification.  The `Simulator` owns the global clock and executes
//! one global event at a time: the output functions of every imminent
//! model run first, their outputs are resolved through the coupling
//! tables into per-destination input batches, and only then do the
//! state transitions fire - internal for imminent models without input,
//! external for input receivers, confluent for models that are both.
//!
//! Execution is single-threaded and run-to-completion.  An error from
//! any model hook propagates out of the executing step unmodified,
//! leaving the global clock at its pre-step value; state already
//! mutated by sibling models earlier in the step is not rolled back.

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::model::AtomicEntry;
use crate::models::{Model, INFINITY};
use crate::utils::errors::SimulationError;

pub mod router;

/// The `Simulator` drives a single root model - atomic or network -
/// forward in time.  It owns the clock but not the model memory; the
/// caller keeps ownership of the models, and the simulator holds a
/// shared handle to the root for the duration of its own lifetime.
pub struct Simulator<X: 'static> {
    root: Model<X>,
    global_time: f64,
}

impl<X: Clone + 'static> Simulator<X> {
    /// Constructs a simulator over `root`, with the clock at `0.0`.
    /// The root must not itself be a component of a network; a nested
    /// model is driven through its enclosing network's simulator.
    pub fn new(root: &Model<X>) -> Result<Self, SimulationError> {
        if root.parent().is_some() {
            return Err(SimulationError::ModelAlreadyOwned);
        }
        Ok(Self {
            root: root.clone(),
            global_time: 0.0,
        })
    }

    /// An accessor method for the simulation global time.  The clock is
    /// monotonically non-decreasing across executed events and only
    /// advances when a step completes without error.
    pub fn global_time(&self) -> f64 {
        self.global_time
    }

    /// The absolute time of the next scheduled event anywhere in the
    /// model tree - the minimum of `time_of_last_event + ta()` over all
    /// atomic leaves - or `INFINITY` if no leaf ever fires.  Querying
    /// has no side effects, so repeated calls return the same value.
    pub fn next_event_time(&self) -> Result<f64, SimulationError> {
        self.root.time_of_next_event()
    }

    /// Executes the next scheduled event.  A no-op when nothing is
    /// scheduled.  Otherwise: collect the imminent set (ties across
    /// branches all fire), run every imminent model's output function,
    /// route the outputs to their final atomic destinations, and then
    /// run one transition per touched model - confluent for imminent
    /// input receivers, external for the rest of the receivers, and
    /// internal for imminent models that received nothing.
    pub fn execute_next_event(&mut self) -> Result<(), SimulationError> {
        let t_next = self.next_event_time()?;
        if t_next == INFINITY {
            return Ok(());
        }
        let mut imminent = Vec::new();
        self.root.collect_imminent(t_next, &mut imminent)?;
        tracing::trace!(
            time = t_next,
            imminent = imminent.len(),
            "executing next event"
        );
        // Output phase: every output function runs before any
        // transition, so no model's transition can influence another
        // model's output within the same step.
        let mut origins = Vec::with_capacity(imminent.len());
        for entry in &imminent {
            let hooks = Rc::clone(&entry.borrow().hooks);
            let outputs = hooks.borrow().output_func()?;
            origins.push((Rc::clone(entry), outputs));
        }
        let hop_limit = self.root.count_couplings();
        let deliveries = router::route(origins, hop_limit)?;
        // Transition phase.
        let mut transitioned: Vec<Rc<RefCell<AtomicEntry<X>>>> = Vec::new();
        for (entry, batch) in deliveries.into_batches() {
            let hooks = Rc::clone(&entry.borrow().hooks);
            if imminent
                .iter()
                .any(|candidate| Rc::ptr_eq(candidate, &entry))
            {
                hooks.borrow_mut().delta_conf(&batch)?;
            } else {
                let elapsed = t_next - entry.borrow().time_of_last_event;
                hooks.borrow_mut().delta_ext(elapsed, &batch)?;
            }
            entry.borrow_mut().time_of_last_event = t_next;
            transitioned.push(entry);
        }
        for entry in &imminent {
            if transitioned.iter().any(|done| Rc::ptr_eq(done, entry)) {
                continue;
            }
            let hooks = Rc::clone(&entry.borrow().hooks);
            hooks.borrow_mut().delta_int()?;
            entry.borrow_mut().time_of_last_event = t_next;
        }
        // The clock commits last, so a failed step is observable at its
        // pre-step time.
        self.global_time = t_next;
        Ok(())
    }

    /// Executes events while the next event time does not exceed
    /// `time_limit`, then stops without overshooting.
    pub fn execute_until(&mut self, time_limit: f64) -> Result<(), SimulationError> {
        loop {
            if self.next_event_time()? > time_limit {
                return Ok(());
            }
            self.execute_next_event()?;
        }
    }
}
