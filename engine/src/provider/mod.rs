//! Input providers: capability-matched strategies that populate one
//! parameter of a live instance from one batch source value.

mod file;

use std::fmt::{self, Display};

use crate::param::ParamDescriptor;
use crate::runtime::{PopulateError, TaskInstance};
use crate::value::{Value, ValueKind};

pub use file::FileInputProvider;

/// Lookup currency for provider resolution: a source value kind paired with
/// the destination parameter it would populate.
///
/// Two requests are equivalent for lookup purposes when their source kinds
/// match and the destination passes the same capability test; resolution is
/// a capability check, not key equality.
pub struct CapabilityRequest<'a> {
    pub source: ValueKind,
    pub param: &'a ParamDescriptor,
}

/// Strategy able to populate certain parameters from batch source values of
/// one declared kind.
///
/// Implementations are stateless with regard to instances and values.
/// [InputProvider::populate] is the only side-effecting method and is called
/// at most once per parameter per item iteration.
pub trait InputProvider {
    /// The source value kind this provider consumes.
    fn source_kind(&self) -> ValueKind;

    /// Returns true if this provider can populate `param`. Implementations
    /// must match more than the nominal kind: style constraints such as save
    /// targets make an otherwise matching parameter ineligible.
    fn can_provide(&self, param: &ParamDescriptor) -> bool;

    /// Sets `value` as `param`'s value on the live instance.
    fn populate(
        &self,
        instance: &mut dyn TaskInstance,
        param: &ParamDescriptor,
        value: &Value,
    ) -> Result<(), PopulateError>;

    /// The selection style a host should present when choosing batch source
    /// values destined for `param`.
    fn selection_style(&self, param: &ParamDescriptor) -> SelectionStyle;
}

/// How compatible batch source values are selected for a given parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectionStyle {
    pub mode: SelectionMode,
    /// Raw extension constraint carried over from the parameter, if any.
    pub extensions: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
pub enum SelectionMode {
    #[strum(serialize = "directories-only")]
    DirectoriesOnly,
    #[strum(serialize = "files-only")]
    FilesOnly,
}

impl Display for SelectionStyle {
    /// Renders the comma-joined style-string form, e.g.
    /// `files-only,extensions:csv/txt`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode)?;
        if let Some(list) = &self.extensions {
            write!(f, ",extensions:{list}")?;
        }
        Ok(())
    }
}
