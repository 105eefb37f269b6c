//! Type definitions for document paths.

use std::fmt;

/// A step in a document path.
///
/// Either a field name (object key) or a non-negative list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field(name) => f.write_str(name),
            PathStep::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(name: &str) -> Self {
        PathStep::Field(name.to_string())
    }
}

impl From<String> for PathStep {
    fn from(name: String) -> Self {
        PathStep::Field(name)
    }
}

impl From<usize> for PathStep {
    fn from(i: usize) -> Self {
        PathStep::Index(i)
    }
}

/// A document path: an ordered sequence of steps from the document root.
pub type Path = Vec<PathStep>;
