use std::{
    fs::File,
    io,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use simple_bar::ProgressBar;

use engine::{
    executor::{BatchJob, BatchProgress, BatchRunner, BatchStatus},
    param::ParamName,
    provider::CapabilityRequest,
    registry::ProviderRegistry,
    runtime::TemplateInfo,
    table::ResultTable,
    value::{Value, ValueKind},
};

use crate::{
    cmdrun::{CommandRuntime, CommandTemplate},
    filelist,
};

/// Runs a command template once per matching file in a directory, collecting
/// each run's outputs into a CSV table.
#[derive(Args, Debug)]
pub struct Command {
    /// Directory containing the input files.
    input_dir: PathBuf,

    /// Command template: a program followed by its arguments, after `--`.
    /// Arguments that are wholly a `{name}` placeholder declare file
    /// parameters; `{name:save}` marks a save target that is never offered
    /// for batching.
    #[arg(last = true, required = true, num_args = 1..)]
    command: Vec<String>,

    /// Only include input files with this extension (case-insensitive).
    #[arg(long)]
    extension: Option<String>,

    /// Name of the parameter to vary across the batch. Defaults to the only
    /// eligible parameter when the template has exactly one.
    #[arg(long)]
    param: Option<String>,

    /// Fixed values for the template's other parameters, as name=path pairs.
    #[arg(long, value_name = "NAME=PATH")]
    set: Vec<String>,

    /// Path of the CSV file to write the result table to. Defaults to
    /// standard output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// List the template's batchable parameters and their selection styles,
    /// then exit without running anything.
    #[arg(long)]
    list_params: bool,

    /// Do not show a progress bar.
    #[arg(long, default_value = "false")]
    no_progress: bool,
}

/// Runs the subcommand.
pub fn run(cmd: &Command) -> Result<()> {
    let template = CommandTemplate::parse(&cmd.command)?;
    let registry = ProviderRegistry::with_default_providers();

    if cmd.list_params {
        return list_params(&registry, &template);
    }

    let fixed = parse_set_args(&cmd.set)?;
    let runtime = CommandRuntime::new(fixed);
    let runner = BatchRunner::for_files(&registry, &runtime);

    let inputs = filelist::list_files(&cmd.input_dir, cmd.extension.as_deref())
        .with_context(|| format!("listing input files under {:?}", cmd.input_dir))?;
    if inputs.is_empty() {
        bail!("no input files found under {:?}", cmd.input_dir);
    }

    let param = cmd
        .param
        .as_deref()
        .map(ParamName::try_from)
        .transpose()
        .with_context(|| "parsing --param")?;

    let continue_intent = Arc::new(AtomicBool::new(true));
    ctrlc::set_handler({
        let continue_intent = continue_intent.clone();
        move || continue_intent.store(false, Ordering::SeqCst)
    })?;
    let mut progress = ProgressDisplayer::new(!cmd.no_progress, continue_intent);

    let job = BatchJob {
        template: &template,
        param,
        inputs,
    };
    let outcome = runner.run(&job, &mut progress)?;

    match outcome.status {
        BatchStatus::Completed => eprintln!("Batch complete."),
        BatchStatus::Cancelled => eprintln!("Batch cancelled."),
        BatchStatus::Interrupted => eprintln!("Batch interrupted."),
    }

    write_table(&outcome.table, cmd.output.as_deref())
}

/// Prints each batchable parameter with the selection style a chooser
/// should use for it.
fn list_params(registry: &ProviderRegistry, template: &CommandTemplate) -> Result<()> {
    let eligible = registry.eligible_params(ValueKind::File, template.params());
    if eligible.is_empty() {
        bail!("template has no batchable parameters");
    }

    for param in eligible {
        let provider = registry
            .resolve(&CapabilityRequest {
                source: ValueKind::File,
                param,
            })
            .ok_or_else(|| anyhow!("no provider for eligible parameter {:?}", param.name))?;
        println!("{}\t{}", param.name.as_ref(), provider.selection_style(param));
    }

    Ok(())
}

fn parse_set_args(set: &[String]) -> Result<Vec<(ParamName, Value)>> {
    set.iter()
        .map(|pair| {
            let (name, path) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected NAME=PATH, got {pair:?}"))?;
            let name = ParamName::try_from(name).with_context(|| format!("in --set {pair:?}"))?;
            Ok((name, Value::File(PathBuf::from(path))))
        })
        .collect()
}

fn write_table(table: &ResultTable, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating output file {path:?}"))?;
            table
                .write_csv(file)
                .with_context(|| format!("writing result table to {path:?}"))
        }
        None => table
            .write_csv(io::stdout().lock())
            .with_context(|| "writing result table to standard output"),
    }
}

struct ProgressDisplayer {
    show_progress: bool,
    progress_bar: Option<ProgressBar>,
    continue_intent: Arc<AtomicBool>,
}

impl ProgressDisplayer {
    fn new(show_progress: bool, continue_intent: Arc<AtomicBool>) -> Self {
        Self {
            show_progress,
            progress_bar: None,
            continue_intent,
        }
    }
}

impl BatchProgress for ProgressDisplayer {
    fn set_maximum(&mut self, items: usize) {
        if self.show_progress && items > 0 {
            self.progress_bar = Some(ProgressBar::cargo_style(items as u32, 80, true));
        }
    }

    fn advance(&mut self) {
        if let Some(progress_bar) = self.progress_bar.as_mut() {
            progress_bar.update();
        }
    }

    fn is_cancelled(&self) -> bool {
        !self.continue_intent.load(Ordering::Relaxed)
    }

    fn finish(&mut self) {
        self.progress_bar = None;
    }
}
