use crate::report::Report;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("unable to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: template references undefined parameter {name:?}", path.display())]
    MissingParameter { path: PathBuf, name: String },
    #[error("unable to render template {}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: crate::template::TemplateError,
    },
    #[error("unable to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("circular dependency detected including {}: {stack}", path.display())]
    CircularDependency { stack: PathStack, path: PathBuf },
    #[error("resolution cancelled")]
    Cancelled,
    #[error("validation failed with {} error(s)", report.errors().count())]
    Validation { report: Report },
    #[error("unable to serialize yaml")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unable to serialize json")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map an io error, keeping "not found" distinct
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound { path },
            _ => Error::Io { path, source },
        }
    }

    /// The sequence of paths forming the cycle: the active stack followed by the path that closed it
    pub fn cycle(&self) -> Option<Vec<PathBuf>> {
        let Error::CircularDependency { stack, path } = self else {
            return None;
        };

        let mut cycle = stack.to_vec();
        cycle.push(path.clone());
        Some(cycle)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("invalid yaml")]
    Yaml(#[source] serde_yaml::Error),
    #[error("content is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid document: {0}")]
    Structure(String),
    #[error("does not match the provisioning schema")]
    Schema(#[source] serde_yaml::Error),
}

/// Paths currently being resolved on one branch of the include tree
///
/// Each child receives its own copy (see [PathStack::with]), siblings never observe each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStack(Vec<PathBuf>);

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.0.iter().any(|entry| entry == path)
    }

    /// Copy of this stack with `path` appended
    pub fn with(&self, path: impl Into<PathBuf>) -> Self {
        let mut next = self.clone();
        next.0.push(path.into());
        next
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PathStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (index, path) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", path.display())?;
        }
        f.write_str("]")
    }
}
