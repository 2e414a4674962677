//! Runtime values fed into unit-of-work parameters and collected from their
//! outputs.

#[cfg(test)]
mod tests;

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A runtime value for a single parameter or result cell.
///
/// The derived discriminant enum [ValueKind] identifies a value's kind
/// without carrying its payload; it is the source-type half of a provider
/// lookup.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, strum_macros::EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash))]
#[serde(tag = "type", content = "value")]
pub enum Value {
    File(PathBuf),
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        self.into()
    }

    /// Human-readable identifier used to label the result row produced from
    /// this value. A file labels itself by its final path component.
    pub fn label(&self) -> String {
        match self {
            Value::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            other => other.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::File(path) => write!(f, "{}", path.display()),
            Value::Text(text) => f.write_str(text),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Value::File(value)
    }
}

impl From<&Path> for Value {
    fn from(value: &Path) -> Self {
        Value::File(value.to_path_buf())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
