//! Error types for mapping records onto object graphs.

use core::fmt::{self, Display};

use rowgraph_core::{Shape, Value, ValueKind};

/// Error returned by every mapping entry point.
///
/// Raising an error aborts the whole call: no partial results are returned.
#[derive(Debug, Clone)]
pub struct MapError {
    /// The specific kind of error
    pub(crate) kind: MapErrorKind,
    /// Member path from the root type down to where the error occurred,
    /// outermost first
    pub(crate) path: Vec<String>,
}

impl MapError {
    /// Create a new error with the given kind.
    pub(crate) fn new(kind: impl Into<MapErrorKind>) -> Self {
        MapError {
            kind: kind.into(),
            path: Vec::new(),
        }
    }

    /// Record that the error happened below `member`.
    pub(crate) fn within(mut self, member: &str) -> Self {
        self.path.insert(0, member.to_owned());
        self
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &MapErrorKind {
        &self.kind
    }

    /// Member path where the error occurred, e.g. `Orders.OrderTotal`.
    ///
    /// Empty for errors that are not tied to a member.
    pub fn path(&self) -> String {
        self.path.join(".")
    }
}

impl Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_empty() {
            write!(f, " (at {})", self.path())?;
        }
        Ok(())
    }
}

impl core::error::Error for MapError {}

impl<K: Into<MapErrorKind>> From<K> for MapError {
    fn from(value: K) -> Self {
        MapError::new(value)
    }
}

/// Detailed classification of mapping errors.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum MapErrorKind {
    /// The input cannot be interpreted as flat key/value records at all.
    Shape {
        /// What the input had to be.
        expected: &'static str,
        /// What it was instead.
        found: String,
    },
    /// A value could not be converted to a member's declared type.
    Conversion(MemberFailure),
    /// A value survived conversion but the member still rejected it.
    Assignment(MemberFailure),
    /// The requested root type is not a struct.
    NotAStruct {
        /// The requested type.
        shape: &'static Shape,
    },
}

impl MapErrorKind {
    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            MapErrorKind::Shape { .. } => "rowgraph::shape",
            MapErrorKind::Conversion(_) => "rowgraph::conversion",
            MapErrorKind::Assignment(_) => "rowgraph::assignment",
            MapErrorKind::NotAStruct { .. } => "rowgraph::not_a_struct",
        }
    }
}

impl Display for MapErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapErrorKind::Shape { expected, found } => {
                write!(f, "input is not {expected}: found {found}")
            }
            MapErrorKind::Conversion(failure) => {
                write!(
                    f,
                    "cannot convert {} to {} for member `{}` of type `{}`",
                    failure.describe_value(),
                    failure.target_type,
                    failure.member,
                    failure.declaring_type,
                )?;
                if let Some(reason) = &failure.reason {
                    write!(f, ": {reason}")?;
                }
                Ok(())
            }
            MapErrorKind::Assignment(failure) => write!(
                f,
                "cannot assign {} to member `{}` of type `{}`, which is declared as {}",
                failure.describe_value(),
                failure.member,
                failure.declaring_type,
                failure.target_type,
            ),
            MapErrorKind::NotAStruct { shape } => {
                write!(f, "cannot map records onto {shape}: only structs can be roots")
            }
        }
    }
}

/// Everything known about a value that could not be stored in a member.
#[derive(Debug, Clone)]
pub struct MemberFailure {
    /// The offending value, after any conversion that did succeed.
    pub value: Value,
    /// The runtime type of the value as found in the record.
    pub source_type: ValueKind,
    /// The member name, as records address it.
    pub member: String,
    /// The member's declared type.
    pub target_type: &'static Shape,
    /// The type declaring the member.
    pub declaring_type: &'static str,
    /// Why the converter gave up, if one ran.
    pub reason: Option<String>,
}

impl MemberFailure {
    fn describe_value(&self) -> String {
        format!("value {} ({})", self.value, self.source_type)
    }
}

impl miette::Diagnostic for MapError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            MapErrorKind::Shape { .. } => Some(Box::new(
                "pass a JSON object (one record) or an array of objects with scalar values",
            )),
            MapErrorKind::Conversion(_) => Some(Box::new(
                "register a type converter that handles this value, or change the member's type",
            )),
            MapErrorKind::Assignment(failure) => Some(Box::new(format!(
                "no converter turns a {} into {}",
                failure.source_type, failure.target_type
            ))),
            MapErrorKind::NotAStruct { .. } => None,
        }
    }
}
