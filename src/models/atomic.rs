use super::{PortValue, INFINITY};
use crate::utils::errors::SimulationError;

/// The `Atomic` trait defines everything required for a leaf model to
/// operate within the discrete event simulation.  The simulator
/// formalism (Discrete Event System Specification) requires a time
/// advance function, internal/external/confluent transition functions,
/// and an output function.
///
/// Every hook has a default body, so a passive model - one that never
/// schedules an event and ignores any input - is a valid implementation
/// with no overrides.  All hooks are fallible; an error returned from
/// any of them propagates out of the executing simulation step.
///
/// The kernel never reads or writes model state directly.  State lives
/// in the implementing type and is only mutated through these hooks, in
/// the deterministic order fixed by the simulator.
pub trait Atomic<X> {
    /// The remaining time until this model's next internal event, given
    /// its current state.  `INFINITY` means "never, until externally
    /// perturbed".  Must be non-negative.  The simulator may call this
    /// repeatedly between transitions, so it must be free of side
    /// effects.
    fn ta(&self) -> Result<f64, SimulationError> {
        Ok(INFINITY)
    }

    /// Internal transition: the time advance elapsed with no concurrent
    /// external input.  Updates state to reflect the transition.
    fn delta_int(&mut self) -> Result<(), SimulationError> {
        Ok(())
    }

    /// External transition: routed input arrived strictly before this
    /// model's next internal event.  `elapsed` is the time since the
    /// model's last transition; `inputs` is the batch of port-value
    /// pairs delivered this step, ordered by port then arrival.
    fn delta_ext(&mut self, elapsed: f64, inputs: &[PortValue<X>]) -> Result<(), SimulationError> {
        let _ = (elapsed, inputs);
        Ok(())
    }

    /// Confluent transition: routed input arrived at exactly the instant
    /// this model's own internal event was due.  The default applies the
    /// internal transition followed by an external transition with zero
    /// elapsed time; models override this to special-case the collision.
    fn delta_conf(&mut self, inputs: &[PortValue<X>]) -> Result<(), SimulationError> {
        self.delta_int()?;
        self.delta_ext(0.0, inputs)
    }

    /// Output function, invoked immediately before `delta_int` or
    /// `delta_conf` - never before a pure external transition.  Produces
    /// the port-value pairs to be routed this step.
    fn output_func(&self) -> Result<Vec<PortValue<X>>, SimulationError> {
        Ok(Vec::new())
    }
}
