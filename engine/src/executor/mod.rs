//! The batch executor: drives a unit-of-work template over an ordered list
//! of source values, one sequential execution per value.
//!
//! The loop is strictly sequential. Item `i + 1` never starts before item
//! `i`'s execution has returned or failed, so result rows always match the
//! input order and the single shared instance is never mutated concurrently.


use crate::param::{ParamDescriptor, ParamName};
use crate::provider::{CapabilityRequest, InputProvider};
use crate::registry::ProviderRegistry;
use crate::runtime::{ExecutionError, InstantiateError, TaskInstance, TaskRuntime, TemplateInfo};
use crate::table::ResultTable;
use crate::value::{Value, ValueKind};

/// A batch to execute: the template, the parameter to vary, and the ordered
/// source values to feed it. Immutable during a run.
pub struct BatchJob<'a, T> {
    pub template: &'a T,
    /// The varying parameter. Left `None`, it is auto-selected when exactly
    /// one template parameter is eligible.
    pub param: Option<ParamName>,
    pub inputs: Vec<Value>,
}

/// Progress reporting and cooperative cancellation for one batch run.
///
/// Cancellation is polled between items only: a request made while an item
/// executes takes effect before the next item starts.
pub trait BatchProgress {
    fn set_maximum(&mut self, items: usize);
    fn advance(&mut self);
    fn is_cancelled(&self) -> bool;
    fn finish(&mut self);
}

/// [BatchProgress] implementation for callers with no reporting needs.
#[derive(Debug, Default)]
pub struct NullProgress;

impl BatchProgress for NullProgress {
    fn set_maximum(&mut self, _items: usize) {}

    fn advance(&mut self) {}

    fn is_cancelled(&self) -> bool {
        false
    }

    fn finish(&mut self) {}
}

/// How a batch run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchStatus {
    /// Every input value was processed.
    Completed,
    /// Cancellation was observed between items; the remaining inputs were
    /// not processed.
    Cancelled,
    /// Waiting on an execution was interrupted; the remaining inputs were
    /// not processed.
    Interrupted,
}

/// Outcome of a batch run: how it ended, plus the result table, which is
/// returned whole even when the run ended early.
#[derive(Debug)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub table: ResultTable,
}

/// Configuration-class failures. The batch never started and no rows were
/// produced.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("template has no parameter that any registered provider can populate")]
    NoEligibleParams,
    #[error("multiple parameters are eligible, one must be chosen: {0:?}")]
    ChoiceRequired(Vec<ParamName>),
    #[error("template has no parameter named {0:?}")]
    UnknownParam(ParamName),
    #[error("parameter {0:?} cannot be populated by any registered provider")]
    NoProvider(ParamName),
    #[error(transparent)]
    Instantiate(#[from] InstantiateError),
}

/// Orchestrates batch runs against one provider registry and one runtime.
///
/// Both collaborators are passed in explicitly and borrowed for the runner's
/// lifetime; the runner holds no ambient state of its own.
pub struct BatchRunner<'a, R> {
    registry: &'a ProviderRegistry,
    runtime: &'a R,
    source: ValueKind,
}

impl<'a, R> BatchRunner<'a, R>
where
    R: TaskRuntime,
{
    /// A runner whose batches feed file values.
    pub fn for_files(registry: &'a ProviderRegistry, runtime: &'a R) -> Self {
        Self::with_source(registry, runtime, ValueKind::File)
    }

    pub fn with_source(registry: &'a ProviderRegistry, runtime: &'a R, source: ValueKind) -> Self {
        Self {
            registry,
            runtime,
            source,
        }
    }

    /// The template parameters a batch run could vary, in declaration order.
    pub fn eligible_params<'t>(&self, template: &'t R::Template) -> Vec<&'t ParamDescriptor> {
        self.registry.eligible_params(self.source, template.params())
    }

    /// Returns true if `template` has at least one parameter a batch run
    /// could vary.
    pub fn supports_template(&self, template: &R::Template) -> bool {
        !self.eligible_params(template).is_empty()
    }

    /// Runs `job` to completion, cancellation, or interruption.
    ///
    /// Configuration errors surface as `Err` before any item is processed;
    /// every other ending returns the collected table together with a
    /// status. One fresh instance is created per run, with the varying
    /// parameter and all declared outputs marked externally resolved; only
    /// the varying parameter's value changes across iterations.
    pub fn run(
        &self,
        job: &BatchJob<'_, R::Template>,
        progress: &mut dyn BatchProgress,
    ) -> Result<BatchOutcome, BatchError> {
        let param = self.select_param(job)?;

        // Resolve the provider once, before any item: an unsatisfiable
        // request is a configuration error, not a per-item one.
        let request = CapabilityRequest {
            source: self.source,
            param,
        };
        let provider = self
            .registry
            .resolve(&request)
            .ok_or_else(|| BatchError::NoProvider(param.name.clone()))?;

        let mut instance = self.runtime.instantiate(job.template)?;
        instance.resolve_param(&param.name);

        let outputs = instance.declared_outputs();
        for output in &outputs {
            instance.resolve_output(output);
        }

        let mut table = ResultTable::new();
        table.set_columns(outputs);

        log::debug!(
            "Running batch of {} items with template {:?}.",
            job.inputs.len(),
            job.template.label()
        );

        progress.set_maximum(job.inputs.len());
        let status = self.iterate(job, param, provider, instance.as_mut(), &mut table, progress);
        progress.finish();

        Ok(BatchOutcome { status, table })
    }

    /// Picks the varying parameter: the job's explicit choice when present,
    /// otherwise the single eligible parameter. Anything else is a
    /// configuration error naming the candidates.
    fn select_param<'t>(
        &self,
        job: &BatchJob<'t, R::Template>,
    ) -> Result<&'t ParamDescriptor, BatchError> {
        match &job.param {
            Some(name) => {
                let param = job
                    .template
                    .params()
                    .iter()
                    .find(|param| &param.name == name)
                    .ok_or_else(|| BatchError::UnknownParam(name.clone()))?;
                if !self.registry.supports(self.source, param) {
                    return Err(BatchError::NoProvider(name.clone()));
                }
                Ok(param)
            }
            None => {
                let mut eligible = self.eligible_params(job.template);
                match eligible.len() {
                    0 => Err(BatchError::NoEligibleParams),
                    1 => Ok(eligible.remove(0)),
                    _ => Err(BatchError::ChoiceRequired(
                        eligible.iter().map(|param| param.name.clone()).collect(),
                    )),
                }
            }
        }
    }

    fn iterate(
        &self,
        job: &BatchJob<'_, R::Template>,
        param: &ParamDescriptor,
        provider: &dyn InputProvider,
        instance: &mut dyn TaskInstance,
        table: &mut ResultTable,
        progress: &mut dyn BatchProgress,
    ) -> BatchStatus {
        for value in &job.inputs {
            if progress.is_cancelled() {
                log::warn!("Cancellation requested, ending batch early.");
                return BatchStatus::Cancelled;
            }

            let label = value.label();
            let row = table.append_row(label.as_str());

            if let Err(err) = provider.populate(instance, param, value) {
                log::error!(
                    "Failed to populate parameter {:?} for item {label:?}: {err}.",
                    param.name
                );
                progress.advance();
                continue;
            }

            match instance.execute().wait() {
                Ok(outputs) => {
                    for (name, output) in outputs {
                        if let Err(err) = table.set(row, &name, output) {
                            log::error!("Discarding output outside the declared schema: {err}.");
                        }
                    }
                    log::info!("Item {label:?} processed.");
                }
                Err(ExecutionError::Interrupted) => {
                    // The interrupted item gets no row; rows collected so
                    // far are retained.
                    log::error!("Interrupted while waiting for item {label:?}, ending batch.");
                    table.pop_row();
                    return BatchStatus::Interrupted;
                }
                Err(ExecutionError::Failed(err)) => {
                    // The item is lost but the batch proceeds; the row stays
                    // with its cells unset.
                    log::error!("Execution failed for item {label:?}: {err:?}.");
                }
            }

            progress.advance();
        }

        BatchStatus::Completed
    }
}
