//! Contract between the batch engine and the unit-of-work runtime that
//! instantiates and executes templates.
//!
//! The engine drives the runtime exclusively through these traits, so tests
//! and alternative hosts can substitute their own implementations.

use crate::param::{ParamDescriptor, ParamName};
use crate::value::{Value, ValueKind};

/// Ordered mapping of declared output names to produced values.
pub type Outputs = Vec<(String, Value)>;

/// Introspection over a reusable unit-of-work template.
pub trait TemplateInfo {
    /// Human-readable template label, used for logging.
    fn label(&self) -> &str;

    /// The template's declared input parameters, in declaration order.
    fn params(&self) -> &[ParamDescriptor];
}

/// Creates live instances from templates.
pub trait TaskRuntime {
    type Template: TemplateInfo;

    fn instantiate(
        &self,
        template: &Self::Template,
    ) -> Result<Box<dyn TaskInstance>, InstantiateError>;
}

/// One live, executable instance of a template.
///
/// The batch executor owns the instance exclusively for the duration of a
/// run and re-executes it once per input value; only the varying parameter
/// changes between executions, all others keep the values they held at
/// creation.
pub trait TaskInstance {
    /// Marks an input parameter as externally satisfied, so the runtime does
    /// not attempt to collect it interactively.
    fn resolve_param(&mut self, name: &ParamName);

    /// Marks a declared output as externally collected.
    fn resolve_output(&mut self, name: &str);

    /// Declared output names, in declaration order.
    fn declared_outputs(&self) -> Vec<String>;

    /// Sets the value of a named input parameter.
    fn set_param(&mut self, name: &ParamName, value: Value) -> Result<(), PopulateError>;

    /// Starts one asynchronous execution of the instance with its current
    /// parameter values. The caller must wait on the returned handle before
    /// starting another execution.
    fn execute(&mut self) -> Box<dyn ExecutionHandle>;
}

/// Handle to one in-flight execution.
pub trait ExecutionHandle {
    /// Blocks until the execution finishes, yielding its outputs.
    fn wait(self: Box<Self>) -> Result<Outputs, ExecutionError>;
}

/// Error creating an instance from a template.
#[derive(Debug, thiserror::Error)]
#[error("instantiating template {label:?}")]
pub struct InstantiateError {
    pub label: String,
    #[source]
    pub source: anyhow::Error,
}

/// Error setting a parameter value on a live instance.
#[derive(Debug, thiserror::Error)]
pub enum PopulateError {
    #[error("instance has no parameter named {name:?}")]
    UnknownParam { name: ParamName },
    #[error("parameter {name:?} does not accept a {given:?} value")]
    KindMismatch { name: ParamName, given: ValueKind },
}

/// Failure modes of waiting on an [ExecutionHandle].
///
/// The two variants carry different severities for the batch as a whole: an
/// interrupted wait aborts the remaining batch, while a failed execution
/// loses only the item that produced it.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("interrupted while waiting for the execution to finish")]
    Interrupted,
    #[error("execution failed")]
    Failed(#[source] anyhow::Error),
}
