//! Parameter identity and descriptors declared by a unit-of-work template.
//!
//! Parameter names have value validation, so their inner value is private.


use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

#[derive(Debug, thiserror::Error)]
#[error("got {value:?} which is not {expected}")]
pub struct ValueError<V> {
    pub value: V,
    pub expected: &'static str,
}

/// Name of a single input or output parameter on a unit-of-work template.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct ParamName(String);

impl ParamName {
    const EXPECTED: &str = r#"a parameter name matching ^[A-Za-z_][A-Za-z0-9_]*$"#;

    #[cfg(any(test, feature = "testing"))]
    pub fn test_param_name(s: &str) -> Self {
        s.to_string()
            .try_into()
            .expect("expected valid ParamName value")
    }

    fn valid_regex() -> &'static lazy_regex::Regex {
        lazy_regex::regex!(r#"^[A-Za-z_][A-Za-z0-9_]*$"#)
    }

    fn try_from_string<S>(value: S) -> std::result::Result<Self, S>
    where
        S: Into<String> + AsRef<str>,
    {
        let rx = Self::valid_regex();
        if rx.is_match(value.as_ref()) {
            std::result::Result::Ok(Self(value.into()))
        } else {
            std::result::Result::Err(value)
        }
    }
}

impl TryFrom<&str> for ParamName {
    type Error = ValueError<String>;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from_string(value).map_err(|value| ValueError {
            value: value.to_string(),
            expected: Self::EXPECTED,
        })
    }
}

impl TryFrom<String> for ParamName {
    type Error = ValueError<String>;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from_string(value).map_err(|value| ValueError {
            value,
            expected: Self::EXPECTED,
        })
    }
}

impl<'de> Deserialize<'de> for ParamName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        Self::try_from_string(s).map_err(|s| {
            serde::de::Error::invalid_value(serde::de::Unexpected::Str(&s), &Self::EXPECTED)
        })
    }
}

impl AsRef<str> for ParamName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single style annotation on a parameter, as declared by the template.
///
/// Unknown annotations are preserved verbatim so templates can carry
/// host-specific styling without breaking capability checks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StyleTag {
    /// The parameter selects a directory rather than a regular file.
    Directory,
    /// The parameter names a save target; it must never be fed batch input.
    Save,
    /// The parameter names a file opened for reading.
    Open,
    /// An extension constraint; the payload is the raw list after the
    /// `extensions:` prefix, e.g. `csv/txt`.
    Extensions(String),
    Other(String),
}

impl From<&str> for StyleTag {
    fn from(tag: &str) -> Self {
        if let Some(list) = tag.strip_prefix("extensions:") {
            return StyleTag::Extensions(list.to_string());
        }
        match tag {
            "directory" => StyleTag::Directory,
            "save" => StyleTag::Save,
            "open" => StyleTag::Open,
            "extensions" => StyleTag::Extensions(String::new()),
            other => StyleTag::Other(other.to_string()),
        }
    }
}

impl Display for StyleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleTag::Directory => f.write_str("directory"),
            StyleTag::Save => f.write_str("save"),
            StyleTag::Open => f.write_str("open"),
            StyleTag::Extensions(list) => write!(f, "extensions:{list}"),
            StyleTag::Other(tag) => f.write_str(tag),
        }
    }
}

/// Parsed set of style annotations for one parameter.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParamStyles(Vec<StyleTag>);

impl ParamStyles {
    /// Parses a comma-separated style string, trimming whitespace around the
    /// separators. An empty or all-whitespace string parses to no styles.
    pub fn parse(style: &str) -> Self {
        Self(
            style
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(StyleTag::from)
                .collect(),
        )
    }

    pub fn has(&self, tag: &StyleTag) -> bool {
        self.0.contains(tag)
    }

    pub fn has_directory(&self) -> bool {
        self.has(&StyleTag::Directory)
    }

    pub fn has_save(&self) -> bool {
        self.has(&StyleTag::Save)
    }

    /// The raw list of the first extension constraint, if any.
    pub fn extensions(&self) -> Option<&str> {
        self.0.iter().find_map(|tag| match tag {
            StyleTag::Extensions(list) => Some(list.as_str()),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleTag> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Describes one named, typed input parameter of a unit-of-work template.
/// Immutable and owned by the template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamDescriptor {
    pub name: ParamName,
    pub kind: ValueKind,
    pub styles: ParamStyles,
}

impl ParamDescriptor {
    pub fn new(name: ParamName, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            styles: ParamStyles::default(),
        }
    }

    pub fn with_styles(mut self, styles: ParamStyles) -> Self {
        self.styles = styles;
        self
    }
}
