//! Shared fakes for engine tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use mockall::mock;

use crate::executor;
use crate::param::{ParamDescriptor, ParamName};
use crate::provider::{InputProvider, SelectionMode, SelectionStyle};
use crate::runtime::{
    ExecutionError, ExecutionHandle, InstantiateError, Outputs, PopulateError, TaskInstance,
    TaskRuntime, TemplateInfo,
};
use crate::value::{Value, ValueKind};

pub fn param_name(s: &str) -> ParamName {
    ParamName::test_param_name(s)
}

pub fn file_param(name: &str) -> ParamDescriptor {
    ParamDescriptor::new(param_name(name), ValueKind::File)
}

/// Template fake: a label plus declared inputs and outputs.
pub struct FakeTemplate {
    pub label: String,
    pub params: Vec<ParamDescriptor>,
    pub outputs: Vec<String>,
}

impl FakeTemplate {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            params: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_output(mut self, name: &str) -> Self {
        self.outputs.push(name.to_string());
        self
    }
}

impl TemplateInfo for FakeTemplate {
    fn label(&self) -> &str {
        &self.label
    }

    fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }
}

/// Calls observed across a [FakeRuntime]'s instances.
#[derive(Clone, Debug, PartialEq)]
pub enum FakeEvent {
    Instantiated,
    ParamResolved(ParamName),
    OutputResolved(String),
    ParamSet(ParamName, Value),
    Executed,
}

/// Behavior of one execution of a [FakeInstance].
#[derive(Clone)]
pub enum ExecBehavior {
    /// Succeed, producing every declared output with the current value of
    /// the named parameter.
    Echo(ParamName),
    /// Succeed with the given outputs verbatim.
    Outputs(Outputs),
    /// Fail the execution; the batch is expected to continue.
    Fail(&'static str),
    /// Interrupt the wait; the batch is expected to abort.
    Interrupt,
}

/// Runtime fake with scripted per-execution behaviors.
///
/// Queued behaviors are consumed one per execution, in order; once the queue
/// is empty the default behavior applies.
pub struct FakeRuntime {
    default_behavior: ExecBehavior,
    queued: Rc<RefCell<VecDeque<ExecBehavior>>>,
    events: Rc<RefCell<Vec<FakeEvent>>>,
    fail_instantiate: bool,
}

impl FakeRuntime {
    pub fn new(default_behavior: ExecBehavior) -> Self {
        Self {
            default_behavior,
            queued: Rc::new(RefCell::new(VecDeque::new())),
            events: Rc::new(RefCell::new(Vec::new())),
            fail_instantiate: false,
        }
    }

    /// A runtime whose executions echo the named parameter into every
    /// declared output.
    pub fn echoing(param: &str) -> Self {
        Self::new(ExecBehavior::Echo(param_name(param)))
    }

    pub fn refusing_to_instantiate(mut self) -> Self {
        self.fail_instantiate = true;
        self
    }

    pub fn queue(&self, behavior: ExecBehavior) {
        self.queued.borrow_mut().push_back(behavior);
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.events.borrow().clone()
    }

    pub fn executed_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, FakeEvent::Executed))
            .count()
    }
}

impl TaskRuntime for FakeRuntime {
    type Template = FakeTemplate;

    fn instantiate(
        &self,
        template: &FakeTemplate,
    ) -> Result<Box<dyn TaskInstance>, InstantiateError> {
        if self.fail_instantiate {
            return Err(InstantiateError {
                label: template.label.clone(),
                source: anyhow::anyhow!("refusing to instantiate"),
            });
        }

        self.events.borrow_mut().push(FakeEvent::Instantiated);
        Ok(Box::new(FakeInstance {
            outputs: template.outputs.clone(),
            values: hashbrown::HashMap::new(),
            default_behavior: self.default_behavior.clone(),
            queued: self.queued.clone(),
            events: self.events.clone(),
        }))
    }
}

pub struct FakeInstance {
    outputs: Vec<String>,
    values: hashbrown::HashMap<ParamName, Value>,
    default_behavior: ExecBehavior,
    queued: Rc<RefCell<VecDeque<ExecBehavior>>>,
    events: Rc<RefCell<Vec<FakeEvent>>>,
}

impl FakeInstance {
    /// An instance detached from any runtime, for tests that drive
    /// [TaskInstance] directly.
    pub fn standalone(outputs: &[&str]) -> Self {
        Self {
            outputs: outputs.iter().map(|name| name.to_string()).collect(),
            values: hashbrown::HashMap::new(),
            default_behavior: ExecBehavior::Outputs(Vec::new()),
            queued: Rc::new(RefCell::new(VecDeque::new())),
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn value_of(&self, name: &ParamName) -> Option<&Value> {
        self.values.get(name)
    }
}

impl TaskInstance for FakeInstance {
    fn resolve_param(&mut self, name: &ParamName) {
        self.events
            .borrow_mut()
            .push(FakeEvent::ParamResolved(name.clone()));
    }

    fn resolve_output(&mut self, name: &str) {
        self.events
            .borrow_mut()
            .push(FakeEvent::OutputResolved(name.to_string()));
    }

    fn declared_outputs(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn set_param(&mut self, name: &ParamName, value: Value) -> Result<(), PopulateError> {
        self.events
            .borrow_mut()
            .push(FakeEvent::ParamSet(name.clone(), value.clone()));
        self.values.insert(name.clone(), value);
        Ok(())
    }

    fn execute(&mut self) -> Box<dyn ExecutionHandle> {
        self.events.borrow_mut().push(FakeEvent::Executed);

        let behavior = self
            .queued
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.default_behavior.clone());

        let result = match behavior {
            ExecBehavior::Echo(param) => match self.values.get(&param) {
                Some(value) => Ok(self
                    .outputs
                    .iter()
                    .map(|output| (output.clone(), value.clone()))
                    .collect()),
                None => Err(ExecutionError::Failed(anyhow::anyhow!(
                    "parameter {param:?} has no value"
                ))),
            },
            ExecBehavior::Outputs(outputs) => Ok(outputs),
            ExecBehavior::Fail(message) => Err(ExecutionError::Failed(anyhow::anyhow!(message))),
            ExecBehavior::Interrupt => Err(ExecutionError::Interrupted),
        };

        Box::new(FakeHandle { result })
    }
}

pub struct FakeHandle {
    result: Result<Outputs, ExecutionError>,
}

impl ExecutionHandle for FakeHandle {
    fn wait(self: Box<Self>) -> Result<Outputs, ExecutionError> {
        self.result
    }
}

/// Provider fake with a fixed source kind and a pluggable capability test;
/// populate calls are recorded under `tag` in a shared log so tests can tell
/// which registered provider resolution picked.
pub struct FakeProvider {
    pub tag: &'static str,
    pub kind: ValueKind,
    pub accepts: fn(&ParamDescriptor) -> bool,
    pub populated: Rc<RefCell<Vec<&'static str>>>,
}

impl FakeProvider {
    pub fn new(tag: &'static str, kind: ValueKind, populated: Rc<RefCell<Vec<&'static str>>>) -> Self {
        Self {
            tag,
            kind,
            accepts: |_| true,
            populated,
        }
    }

    pub fn accepting(mut self, accepts: fn(&ParamDescriptor) -> bool) -> Self {
        self.accepts = accepts;
        self
    }
}

impl InputProvider for FakeProvider {
    fn source_kind(&self) -> ValueKind {
        self.kind
    }

    fn can_provide(&self, param: &ParamDescriptor) -> bool {
        (self.accepts)(param)
    }

    fn populate(
        &self,
        instance: &mut dyn TaskInstance,
        param: &ParamDescriptor,
        value: &Value,
    ) -> Result<(), PopulateError> {
        self.populated.borrow_mut().push(self.tag);
        instance.set_param(&param.name, value.clone())
    }

    fn selection_style(&self, _param: &ParamDescriptor) -> SelectionStyle {
        SelectionStyle {
            mode: SelectionMode::FilesOnly,
            extensions: None,
        }
    }
}

mock! {
    pub Progress {}

    impl executor::BatchProgress for Progress {
        fn set_maximum(&mut self, items: usize);
        fn advance(&mut self);
        fn is_cancelled(&self) -> bool;
        fn finish(&mut self);
    }
}
