//! Declaration classification and the declaration index.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::GenerateError;
use super::imports::ImportMap;
use crate::ast::{Expr, FuncDecl, SourceFile};

/// Module paths the classifier matches qualified result types against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaModules {
    /// Module declaring `Resource` and `Schema`.
    pub schema: String,
    /// Module declaring `ResourceProvider`.
    pub provider: String,
}

impl Default for SchemaModules {
    fn default() -> Self {
        Self {
            schema: "github.com/hashicorp/terraform/helper/schema".to_string(),
            provider: "github.com/hashicorp/terraform/terraform".to_string(),
        }
    }
}

/// Which of the loaded files take part in classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Only the package of the first file in path order.
    #[default]
    First,
    /// Every loaded file.
    All,
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(ScanMode::First),
            "all" => Ok(ScanMode::All),
            _ => Err(format!("unknown scan mode: {}", s)),
        }
    }
}

/// Role of a top-level function, decided by its first result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclClass {
    /// Returns `terraform.ResourceProvider`.
    Provider,
    /// Returns `*schema.Resource`.
    Resource,
    /// Returns `*schema.Schema`.
    Schema,
    None,
}

/// Classify a function by its first declared result type.
pub fn classify(func: &FuncDecl, imports: &ImportMap, modules: &SchemaModules) -> DeclClass {
    let first = match func.results.first() {
        Some(ty) => ty,
        None => return DeclClass::None,
    };
    let target = match first {
        Expr::Star(inner) => inner.as_ref(),
        other => other,
    };

    if imports.is_qualified(target, &modules.schema, "Resource") {
        DeclClass::Resource
    } else if imports.is_qualified(target, &modules.schema, "Schema") {
        DeclClass::Schema
    } else if imports.is_qualified(target, &modules.provider, "ResourceProvider") {
        DeclClass::Provider
    } else {
        DeclClass::None
    }
}

/// A classified function together with the imports of its file.
#[derive(Debug, Clone)]
pub struct DeclRef {
    pub func: FuncDecl,
    pub imports: Arc<ImportMap>,
    /// Path of the declaring file.
    pub file: String,
}

impl DeclRef {
    pub fn name(&self) -> &str {
        &self.func.name
    }
}

/// Functions of interest, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    pub resources: BTreeMap<String, DeclRef>,
    pub schemas: BTreeMap<String, DeclRef>,
    pub provider: Option<DeclRef>,
}

impl DeclarationIndex {
    /// Classify every top-level function of `files` in a single pass.
    pub fn build(
        mut files: Vec<SourceFile>,
        modules: &SchemaModules,
        scan: ScanMode,
    ) -> Result<Self, GenerateError> {
        files.sort_by(|a, b| a.path.cmp(&b.path));

        if scan == ScanMode::First {
            if let Some(package) = files.first().map(|f| f.package.clone()) {
                files.retain(|f| {
                    let keep = f.package == package;
                    if !keep {
                        debug!(file = %f.path, package = %f.package, "skipping file outside first package");
                    }
                    keep
                });
            }
        }

        let mut index = Self::default();

        for file in files {
            let imports = ImportMap::from_specs(&file.imports).map_err(|source| {
                GenerateError::Import {
                    file: file.path.clone(),
                    source,
                }
            })?;
            let imports = Arc::new(imports);

            for func in file.funcs {
                let class = classify(&func, &imports, modules);
                let name = func.name.clone();
                let decl = DeclRef {
                    func,
                    imports: Arc::clone(&imports),
                    file: file.path.clone(),
                };

                match class {
                    DeclClass::Resource => {
                        index.resources.insert(name, decl);
                    }
                    DeclClass::Schema => {
                        index.schemas.insert(name, decl);
                    }
                    DeclClass::Provider => {
                        if let Some(previous) = &index.provider {
                            warn!(
                                previous = %previous.name(),
                                replacement = %name,
                                "multiple provider constructors found"
                            );
                        }
                        index.provider = Some(decl);
                    }
                    DeclClass::None => {}
                }
            }
        }

        debug!(
            resources = index.resources.len(),
            schemas = index.schemas.len(),
            provider = index.provider.is_some(),
            "declarations classified"
        );

        Ok(index)
    }

    pub fn resource(&self, name: &str) -> Option<&DeclRef> {
        self.resources.get(name)
    }

    pub fn schema(&self, name: &str) -> Option<&DeclRef> {
        self.schemas.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ImportSpec;

    fn func(name: &str, results: Vec<Expr>) -> FuncDecl {
        FuncDecl {
            name: name.to_string(),
            doc: String::new(),
            results,
            body: Vec::new(),
            line: 1,
        }
    }

    fn imports() -> Vec<ImportSpec> {
        vec![
            ImportSpec::new(None, "\"github.com/hashicorp/terraform/helper/schema\""),
            ImportSpec::new(None, "\"github.com/hashicorp/terraform/terraform\""),
        ]
    }

    fn file(path: &str, package: &str, funcs: Vec<FuncDecl>) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            package: package.to_string(),
            imports: imports(),
            funcs,
        }
    }

    #[test]
    fn test_classify_patterns() {
        let modules = SchemaModules::default();
        let map = ImportMap::from_specs(&imports()).unwrap();

        let resource = func("r", vec![Expr::star(Expr::selector("schema", "Resource"))]);
        let schema = func("s", vec![Expr::star(Expr::selector("schema", "Schema"))]);
        let provider = func("p", vec![Expr::selector("terraform", "ResourceProvider")]);
        let plain = func("f", vec![Expr::ident("error")]);
        let none = func("g", vec![]);
        let second = func(
            "h",
            vec![Expr::ident("error"), Expr::star(Expr::selector("schema", "Resource"))],
        );

        assert_eq!(classify(&resource, &map, &modules), DeclClass::Resource);
        assert_eq!(classify(&schema, &map, &modules), DeclClass::Schema);
        assert_eq!(classify(&provider, &map, &modules), DeclClass::Provider);
        assert_eq!(classify(&plain, &map, &modules), DeclClass::None);
        assert_eq!(classify(&none, &map, &modules), DeclClass::None);
        assert_eq!(classify(&second, &map, &modules), DeclClass::None);
    }

    #[test]
    fn test_classify_requires_known_module() {
        let modules = SchemaModules::default();
        let map = ImportMap::from_specs(&[ImportSpec::new(
            Some("schema"),
            "\"example.com/local/schema\"",
        )])
        .unwrap();

        let resource = func("r", vec![Expr::star(Expr::selector("schema", "Resource"))]);
        assert_eq!(classify(&resource, &map, &modules), DeclClass::None);
    }

    #[test]
    fn test_classify_value_resource_type() {
        let modules = SchemaModules::default();
        let map = ImportMap::from_specs(&imports()).unwrap();
        let resource = func("r", vec![Expr::selector("schema", "Resource")]);
        assert_eq!(classify(&resource, &map, &modules), DeclClass::Resource);
    }

    #[test]
    fn test_build_index() {
        let files = vec![file(
            "azurerm/provider.go",
            "azurerm",
            vec![
                func("Provider", vec![Expr::selector("terraform", "ResourceProvider")]),
                func("dataSourceArmImage", vec![Expr::star(Expr::selector("schema", "Resource"))]),
                func("tagsSchema", vec![Expr::star(Expr::selector("schema", "Schema"))]),
                func("helper", vec![]),
            ],
        )];

        let index =
            DeclarationIndex::build(files, &SchemaModules::default(), ScanMode::First).unwrap();
        assert_eq!(index.provider.as_ref().map(|p| p.name()), Some("Provider"));
        assert!(index.resource("dataSourceArmImage").is_some());
        assert!(index.schema("tagsSchema").is_some());
        assert!(index.resource("helper").is_none());
        assert!(index.schema("helper").is_none());
    }

    #[test]
    fn test_scan_mode() {
        let files = || {
            vec![
                file(
                    "b/other.go",
                    "other",
                    vec![func("otherSchema", vec![Expr::star(Expr::selector("schema", "Schema"))])],
                ),
                file(
                    "a/provider.go",
                    "azurerm",
                    vec![func("tagsSchema", vec![Expr::star(Expr::selector("schema", "Schema"))])],
                ),
            ]
        };
        let modules = SchemaModules::default();

        let first = DeclarationIndex::build(files(), &modules, ScanMode::First).unwrap();
        assert!(first.schema("tagsSchema").is_some());
        assert!(first.schema("otherSchema").is_none());

        let all = DeclarationIndex::build(files(), &modules, ScanMode::All).unwrap();
        assert!(all.schema("tagsSchema").is_some());
        assert!(all.schema("otherSchema").is_some());
    }

    #[test]
    fn test_bad_import_is_reported() {
        let mut bad = file("a.go", "azurerm", vec![]);
        bad.imports.push(ImportSpec::new(None, "\"broken"));
        let err = DeclarationIndex::build(vec![bad], &SchemaModules::default(), ScanMode::All)
            .unwrap_err();
        assert!(matches!(err, GenerateError::Import { ref file, .. } if file == "a.go"));
    }

    #[test]
    fn test_scan_mode_from_str() {
        assert_eq!("first".parse::<ScanMode>().unwrap(), ScanMode::First);
        assert_eq!("ALL".parse::<ScanMode>().unwrap(), ScanMode::All);
        assert!("some".parse::<ScanMode>().is_err());
    }
}
