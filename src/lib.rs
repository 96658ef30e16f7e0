//! # Overview
//! "Devs" provides a Discrete Event System Specification simulation
//! kernel, for composing atomic state-machine models into hierarchical
//! networks and executing them deterministically.
//!
//! This crate contains:
//!
//! * An atomic model contract, capturing the five DEVS hooks - time
//! advance, internal/external/confluent transitions, and output.
//! * A digraph network model, for coupling atomic and nested network
//! models through integer ports.
//! * An event router, resolving outputs across arbitrarily nested
//! coupling tables into per-destination input batches.
//! * A simulator engine, owning the global clock and executing one
//! imminent event set at a time.
//!
//! Model state is owned by the caller.  Networks and the simulator hold
//! shared handles, so dropping a network never invalidates models that
//! are still referenced elsewhere.  Execution is single-threaded and
//! run-to-completion; every hook and every kernel operation that can
//! fail returns a `Result`, and a failing hook surfaces unmodified from
//! the executing step with the global clock left at its pre-step value.

pub mod models;
pub mod simulator;
pub mod utils;
