//! Batch execution engine: runs a unit-of-work template once per input
//! value, routing each value through a capability-matched input provider and
//! collecting every run's declared outputs into a result table.
//!
//! The unit-of-work runtime itself is an external collaborator reached only
//! through the traits in [runtime], so the engine runs unchanged against any
//! host able to instantiate and execute templates.

pub mod executor;
pub mod param;
pub mod provider;
pub mod registry;
pub mod runtime;
pub mod table;
#[cfg(test)]
mod testutil;
pub mod value;
