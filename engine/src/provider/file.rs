use super::{InputProvider, SelectionMode, SelectionStyle};
use crate::param::ParamDescriptor;
use crate::runtime::{PopulateError, TaskInstance};
use crate::value::{Value, ValueKind};

/// Populates file-typed parameters from batch file values.
pub struct FileInputProvider;

impl InputProvider for FileInputProvider {
    fn source_kind(&self) -> ValueKind {
        ValueKind::File
    }

    /// A file parameter is eligible unless it is a save target: a parameter
    /// the unit of work writes to cannot be fed batch input.
    fn can_provide(&self, param: &ParamDescriptor) -> bool {
        param.kind == ValueKind::File && !param.styles.has_save()
    }

    fn populate(
        &self,
        instance: &mut dyn TaskInstance,
        param: &ParamDescriptor,
        value: &Value,
    ) -> Result<(), PopulateError> {
        instance.set_param(&param.name, value.clone())
    }

    fn selection_style(&self, param: &ParamDescriptor) -> SelectionStyle {
        let mode = if param.styles.has_directory() {
            SelectionMode::DirectoriesOnly
        } else {
            SelectionMode::FilesOnly
        };

        SelectionStyle {
            mode,
            extensions: param.styles.extensions().map(str::to_string),
        }
    }
}
