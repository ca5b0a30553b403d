//! Per-file import resolution.

use std::collections::BTreeMap;

use super::literal::{unquote, LiteralError};
use crate::ast::{Expr, ImportSpec};

/// Local import name → full module path, for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportMap {
    entries: BTreeMap<String, String>,
}

impl ImportMap {
    /// Build the map from a file's import specs.
    ///
    /// Blank imports are skipped. An import without an explicit name is
    /// keyed by the last segment of its path.
    pub fn from_specs(specs: &[ImportSpec]) -> Result<Self, LiteralError> {
        let mut entries = BTreeMap::new();

        for spec in specs {
            if spec.name.as_deref() == Some("_") {
                continue;
            }

            let path = unquote(&spec.path)?;
            let key = match spec.name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => base_name(&path).to_string(),
            };
            entries.insert(key, path);
        }

        Ok(Self { entries })
    }

    /// Module path bound to a local name.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    /// Whether `expr` is `alias.symbol` with `alias` bound to `module`.
    pub fn is_qualified(&self, expr: &Expr, module: &str, symbol: &str) -> bool {
        match expr {
            Expr::Selector { x, sel } if sel == symbol => match x.as_ref() {
                Expr::Ident(alias) => self.resolve(alias) == Some(module),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "github.com/hashicorp/terraform/helper/schema";

    #[test]
    fn test_default_name_is_last_segment() {
        let map = ImportMap::from_specs(&[
            ImportSpec::new(None, "\"fmt\""),
            ImportSpec::new(None, &format!("\"{}\"", SCHEMA)),
        ])
        .unwrap();

        assert_eq!(map.resolve("fmt"), Some("fmt"));
        assert_eq!(map.resolve("schema"), Some(SCHEMA));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_alias_and_blank() {
        let map = ImportMap::from_specs(&[
            ImportSpec::new(Some("tfschema"), &format!("\"{}\"", SCHEMA)),
            ImportSpec::new(Some("_"), "\"github.com/lib/pq\""),
        ])
        .unwrap();

        assert_eq!(map.resolve("tfschema"), Some(SCHEMA));
        assert_eq!(map.resolve("schema"), None);
        assert_eq!(map.resolve("pq"), None);
        assert_eq!(map.resolve("_"), None);
    }

    #[test]
    fn test_raw_path_literal() {
        let map = ImportMap::from_specs(&[ImportSpec::new(None, "`net/http`")]).unwrap();
        assert_eq!(map.resolve("http"), Some("net/http"));
    }

    #[test]
    fn test_bad_literal() {
        let err = ImportMap::from_specs(&[ImportSpec::new(None, "\"fmt")]).unwrap_err();
        assert!(matches!(err, LiteralError::InvalidString(_)));
    }

    #[test]
    fn test_is_qualified() {
        let map =
            ImportMap::from_specs(&[ImportSpec::new(None, &format!("\"{}\"", SCHEMA))]).unwrap();

        assert!(map.is_qualified(&Expr::selector("schema", "Schema"), SCHEMA, "Schema"));
        assert!(!map.is_qualified(&Expr::selector("schema", "Resource"), SCHEMA, "Schema"));
        assert!(!map.is_qualified(&Expr::selector("other", "Schema"), SCHEMA, "Schema"));
        assert!(!map.is_qualified(&Expr::ident("Schema"), SCHEMA, "Schema"));
    }
}
