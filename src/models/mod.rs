//! The models module defines the building blocks of a simulation - the
//! `Atomic` trait specifies the contract any leaf model must satisfy,
//! the `Digraph` composes models through a coupling relation, and the
//! `Model` handle lets the simulator treat both uniformly.  Models
//! exchange values over integer ports, as `PortValue` pairs.

pub mod atomic;
pub mod digraph;
pub mod model;

pub use self::atomic::Atomic;
pub use self::digraph::Digraph;
pub use self::model::Model;

/// The distinguished "never" time.  Satisfies `INFINITY > t` and
/// `t + INFINITY == INFINITY` for every finite time `t`, so a passive
/// model simply returns it from `ta` and drops out of scheduling.
pub const INFINITY: f64 = f64::INFINITY;

/// Models address each other's inputs and outputs by integer port.
pub type Port = usize;

/// A `PortValue` pairs a port with a message value.  Outputs are
/// produced as port-value pairs by `Atomic::output_func`, and routed
/// inputs are delivered as port-value batches to the external and
/// confluent transition hooks.  The value type is chosen by the caller
/// and is opaque to the kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct PortValue<X> {
    pub port: Port,
    pub value: X,
}

impl<X> PortValue<X> {
    pub fn new(port: Port, value: X) -> Self {
        Self { port, value }
    }
}
