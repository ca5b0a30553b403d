//! Extraction of the provider's data source and resource registries.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use super::error::RegistryError;
use super::literal::unquote;
use crate::ast::{self, BasicLit, CompositeLit, Expr, FuncDecl, LitKind, Node};
use crate::model::ResourceType;

const DATA_SOURCES_FIELD: &str = "DataSourcesMap";
const RESOURCES_FIELD: &str = "ResourcesMap";

/// Public name → constructor function name.
pub type Entries = BTreeMap<String, String>;

/// Public name → constructor function name, per registry. Each registry is
/// extracted on its own, so a malformed one leaves the other usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub data_sources: Result<Entries, RegistryError>,
    pub resources: Result<Entries, RegistryError>,
}

impl Registry {
    /// Extract both registries from the provider constructor's body.
    pub fn extract(provider: &FuncDecl) -> Self {
        let mut data_sources: Option<&Expr> = None;
        let mut resources: Option<&Expr> = None;

        for root in provider.body_nodes() {
            let flow = ast::walk(root, &mut |node| {
                if let Node::Expr(Expr::KeyValue(kv)) = node {
                    match kv.key.as_ident() {
                        Some(DATA_SOURCES_FIELD) => data_sources = Some(&kv.value),
                        Some(RESOURCES_FIELD) => resources = Some(&kv.value),
                        _ => {}
                    }
                }
                if data_sources.is_some() && resources.is_some() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
            if flow.is_break() {
                break;
            }
        }

        Self {
            data_sources: constructor_names(ResourceType::Datasource, data_sources),
            resources: constructor_names(ResourceType::Resource, resources),
        }
    }

    pub fn get(&self, resource_type: ResourceType) -> Result<&Entries, &RegistryError> {
        match resource_type {
            ResourceType::Datasource => self.data_sources.as_ref(),
            ResourceType::Resource => self.resources.as_ref(),
        }
    }

    /// Constructor registered for `name` in the given registry. `None` also
    /// when that registry is malformed.
    pub fn constructor(&self, resource_type: ResourceType, name: &str) -> Option<&str> {
        self.get(resource_type)
            .ok()?
            .get(name)
            .map(String::as_str)
    }

    /// Registries that could not be read.
    pub fn errors(&self) -> impl Iterator<Item = &RegistryError> {
        [&self.data_sources, &self.resources]
            .into_iter()
            .filter_map(|r| r.as_ref().err())
    }

    /// Number of entries across the readable registries.
    pub fn len(&self) -> usize {
        [&self.data_sources, &self.resources]
            .into_iter()
            .filter_map(|r| r.as_ref().ok())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn field_name(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Datasource => DATA_SOURCES_FIELD,
        ResourceType::Resource => RESOURCES_FIELD,
    }
}

fn constructor_names(
    resource_type: ResourceType,
    value: Option<&Expr>,
) -> Result<Entries, RegistryError> {
    let malformed = |reason: String| RegistryError {
        registry: field_name(resource_type),
        resource_type,
        reason,
    };

    let lit: &CompositeLit = match value {
        None => return Err(malformed("field not found in provider".to_string())),
        Some(Expr::Composite(lit)) => lit,
        Some(other) => {
            return Err(malformed(format!(
                "expected composite literal, found {}",
                other.kind_name()
            )))
        }
    };

    let mut names = BTreeMap::new();
    for elt in &lit.elts {
        let kv = match elt {
            Expr::KeyValue(kv) => kv,
            other => {
                return Err(malformed(format!(
                    "expected key-value pair, found {} `{}`",
                    other.kind_name(),
                    other
                )))
            }
        };

        let name = match &kv.key {
            Expr::BasicLit(BasicLit {
                kind: LitKind::String,
                value,
            }) => unquote(value).map_err(|e| malformed(e.to_string()))?,
            other => {
                return Err(malformed(format!(
                    "expected string key, found {} `{}`",
                    other.kind_name(),
                    other
                )))
            }
        };

        let constructor = match &kv.value {
            Expr::Call(call) => match call.fun.as_ref() {
                Expr::Ident(fun) => fun.clone(),
                other => {
                    return Err(malformed(format!(
                        "entry {:?}: expected call to a function name, found call to {} `{}`",
                        name,
                        other.kind_name(),
                        other
                    )))
                }
            },
            other => {
                return Err(malformed(format!(
                    "entry {:?}: expected call expression, found {} `{}`",
                    name,
                    other.kind_name(),
                    other
                )))
            }
        };

        names.insert(name, constructor);
    }

    Ok(names)
}
