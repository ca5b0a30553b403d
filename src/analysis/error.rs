//! Error types for schema resolution.

use std::fmt;

use thiserror::Error;

use super::literal::LiteralError;
use crate::ast::Expr;
use crate::model::ResourceType;

/// Dotted path of an attribute inside a resource schema, e.g.
/// `os_disk.caching`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttrPath(Vec<String>);

impl AttrPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a child attribute.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<schema>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

/// What went wrong while resolving one node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedShape { expected: &'static str, found: String },
    #[error(transparent)]
    InvalidLiteral(#[from] LiteralError),
    #[error("unresolved schema reference `{0}`")]
    UnresolvedSchemaReference(String),
    #[error("cyclic schema reference `{0}`")]
    CyclicSchemaReference(String),
    #[error("schema field not found")]
    SchemaFieldNotFound,
    #[error("no schema.Schema literal found in `{0}`")]
    SchemaLiteralNotFound(String),
    #[error("name `{name}` does not start with provider prefix `{prefix}`")]
    NamePrefix { name: String, prefix: String },
    #[error("constructor `{0}` does not return a resource schema")]
    UnresolvedConstructor(String),
    #[error("`{0}` is not registered by the provider")]
    UnknownResource(String),
}

impl ResolveErrorKind {
    /// Shape mismatch against the node actually found.
    pub fn shape(expected: &'static str, found: &Expr) -> Self {
        ResolveErrorKind::UnexpectedShape {
            expected,
            found: format!("{} `{}`", found.kind_name(), found),
        }
    }

    /// Attach the attribute path the failure occurred at.
    pub fn at(self, path: &AttrPath) -> ResolveError {
        ResolveError {
            path: path.clone(),
            kind: self,
        }
    }
}

/// A resolution failure at a specific attribute path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {kind}")]
pub struct ResolveError {
    pub path: AttrPath,
    pub kind: ResolveErrorKind,
}

/// All failures collected while building one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceError {
    pub resource: String,
    pub resource_type: ResourceType,
    pub errors: Vec<ResolveError>,
}

impl ResourceError {
    pub fn new(resource: &str, resource_type: ResourceType, errors: Vec<ResolveError>) -> Self {
        Self {
            resource: resource.to_string(),
            resource_type,
            errors,
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource_type, self.resource)?;
        match self.errors.as_slice() {
            [] => Ok(()),
            [only] => write!(f, ": {}", only),
            many => {
                write!(f, ": {} errors", many.len())?;
                for err in many {
                    write!(f, "\n  {}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// A provider registry that could not be read. Only the resources drawn
/// from that registry are affected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed {registry}: {reason}")]
pub struct RegistryError {
    /// Field name of the registry, `DataSourcesMap` or `ResourcesMap`.
    pub registry: &'static str,
    pub resource_type: ResourceType,
    pub reason: String,
}

/// Failures that stop the whole generation run.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("unable to find Provider export func")]
    MissingProvider,
    /// A selected registry is malformed (only in fail-fast mode).
    #[error(transparent)]
    MalformedRegistry(#[from] RegistryError),
    #[error("invalid import in {file}: {source}")]
    Import {
        file: String,
        #[source]
        source: LiteralError,
    },
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
