//! A unit-of-work runtime that runs an external command once per execution.
//!
//! A template is a program plus arguments; arguments that are wholly a
//! `{name}` placeholder declare file parameters, filled in per execution.
//! `{name:save}` declares a save target, which stays out of batch selection.


use std::collections::HashMap;
use std::process;
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};

use engine::param::{ParamDescriptor, ParamName, ParamStyles};
use engine::runtime::{
    ExecutionError, ExecutionHandle, InstantiateError, Outputs, PopulateError, TaskInstance,
    TaskRuntime, TemplateInfo,
};
use engine::value::{Value, ValueKind};

/// Output column holding the command's trimmed standard output.
pub const OUTPUT_STDOUT: &str = "stdout";
/// Output column holding the command's exit status code.
pub const OUTPUT_STATUS: &str = "status";

/// A reusable command-line template with named file parameters.
#[derive(Debug)]
pub struct CommandTemplate {
    label: String,
    program: String,
    args: Vec<ArgTemplate>,
    params: Vec<ParamDescriptor>,
}

#[derive(Clone, Debug)]
enum ArgTemplate {
    Literal(String),
    Placeholder(ParamName),
}

impl CommandTemplate {
    /// Parses `argv` as a command template. The first element is the
    /// program; later elements that are wholly `{name}` or `{name:styles}`
    /// declare parameters, everything else passes through literally.
    pub fn parse(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("command template is empty"))?;

        let mut params: Vec<ParamDescriptor> = Vec::new();
        let mut arg_templates = Vec::with_capacity(args.len());
        for arg in args {
            match parse_placeholder(arg)? {
                Some(descriptor) => {
                    match params.iter().position(|param| param.name == descriptor.name) {
                        None => {
                            arg_templates.push(ArgTemplate::Placeholder(descriptor.name.clone()));
                            params.push(descriptor);
                        }
                        Some(index) if params[index] == descriptor => {
                            arg_templates.push(ArgTemplate::Placeholder(descriptor.name.clone()));
                        }
                        Some(_) => bail!(
                            "parameter {:?} is declared twice with different styles",
                            descriptor.name
                        ),
                    }
                }
                None => arg_templates.push(ArgTemplate::Literal(arg.clone())),
            }
        }

        Ok(Self {
            label: program.clone(),
            program: program.clone(),
            args: arg_templates,
            params,
        })
    }
}

fn parse_placeholder(arg: &str) -> Result<Option<ParamDescriptor>> {
    let Some(inner) = arg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
        return Ok(None);
    };

    let (name, styles) = match inner.split_once(':') {
        Some((name, styles)) => (name, ParamStyles::parse(styles)),
        None => (inner, ParamStyles::default()),
    };
    let name = ParamName::try_from(name).with_context(|| format!("in placeholder {arg:?}"))?;

    Ok(Some(
        ParamDescriptor::new(name, ValueKind::File).with_styles(styles),
    ))
}

impl TemplateInfo for CommandTemplate {
    fn label(&self) -> &str {
        &self.label
    }

    fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }
}

/// [TaskRuntime] backed by external command execution.
///
/// Fixed parameter values are applied to every instance at creation; the
/// batch executor then varies only its chosen parameter.
pub struct CommandRuntime {
    fixed: Vec<(ParamName, Value)>,
}

impl CommandRuntime {
    pub fn new(fixed: Vec<(ParamName, Value)>) -> Self {
        Self { fixed }
    }
}

impl TaskRuntime for CommandRuntime {
    type Template = CommandTemplate;

    fn instantiate(
        &self,
        template: &CommandTemplate,
    ) -> Result<Box<dyn TaskInstance>, InstantiateError> {
        let mut instance = CommandInstance {
            program: template.program.clone(),
            args: template.args.clone(),
            params: template.params.clone(),
            values: HashMap::new(),
        };

        for (name, value) in &self.fixed {
            instance
                .set_param(name, value.clone())
                .map_err(|err| InstantiateError {
                    label: template.label.clone(),
                    source: err.into(),
                })?;
        }

        Ok(Box::new(instance))
    }
}

struct CommandInstance {
    program: String,
    args: Vec<ArgTemplate>,
    params: Vec<ParamDescriptor>,
    values: HashMap<ParamName, Value>,
}

impl CommandInstance {
    fn render_args(&self) -> Result<Vec<String>> {
        self.args
            .iter()
            .map(|arg| match arg {
                ArgTemplate::Literal(literal) => Ok(literal.clone()),
                ArgTemplate::Placeholder(name) => self
                    .values
                    .get(name)
                    .map(Value::to_string)
                    .ok_or_else(|| anyhow!("parameter {name:?} has no value")),
            })
            .collect()
    }
}

impl TaskInstance for CommandInstance {
    // Commands collect nothing interactively; resolution is a no-op.
    fn resolve_param(&mut self, _name: &ParamName) {}

    fn resolve_output(&mut self, _name: &str) {}

    fn declared_outputs(&self) -> Vec<String> {
        vec![OUTPUT_STDOUT.to_string(), OUTPUT_STATUS.to_string()]
    }

    fn set_param(&mut self, name: &ParamName, value: Value) -> Result<(), PopulateError> {
        let param = self
            .params
            .iter()
            .find(|param| &param.name == name)
            .ok_or_else(|| PopulateError::UnknownParam { name: name.clone() })?;
        if value.kind() != param.kind {
            return Err(PopulateError::KindMismatch {
                name: name.clone(),
                given: value.kind(),
            });
        }

        self.values.insert(name.clone(), value);
        Ok(())
    }

    fn execute(&mut self) -> Box<dyn ExecutionHandle> {
        let (sender, receiver) = mpsc::sync_channel(1);

        match self.render_args() {
            Ok(args) => {
                let program = self.program.clone();
                thread::spawn(move || {
                    let result = run_command(&program, &args);
                    if sender.send(result).is_err() {
                        log::warn!("Failed to send command result on channel.");
                    }
                });
            }
            Err(err) => {
                // Report through the handle so the executor sees an ordinary
                // failed execution.
                if sender.send(Err(err)).is_err() {
                    log::warn!("Failed to send command result on channel.");
                }
            }
        }

        Box::new(CommandHandle { receiver })
    }
}

fn run_command(program: &str, args: &[String]) -> Result<Outputs> {
    let output = process::Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("spawning command {program:?}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "command {program:?} exited with {}: {}",
            output.status,
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_string();
    let status = output.status.code().map(i64::from).unwrap_or(-1);

    Ok(vec![
        (OUTPUT_STDOUT.to_string(), Value::Text(stdout)),
        (OUTPUT_STATUS.to_string(), Value::Int(status)),
    ])
}

struct CommandHandle {
    receiver: mpsc::Receiver<Result<Outputs>>,
}

impl ExecutionHandle for CommandHandle {
    fn wait(self: Box<Self>) -> Result<Outputs, ExecutionError> {
        match self.receiver.recv() {
            Ok(result) => result.map_err(ExecutionError::Failed),
            // The worker dropped its sender without reporting a result; the
            // wait was interrupted rather than the command having failed.
            Err(mpsc::RecvError) => Err(ExecutionError::Interrupted),
        }
    }
}
