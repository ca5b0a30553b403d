//! Integration tests for the tree-sitter Go loader.
//!
//! These tests validate package loading, import lowering and declaration
//! classification against the testdata fixtures.

use std::path::PathBuf;

use schemadoc::analysis::{classify, DeclClass, ImportMap, SchemaModules};
use schemadoc::ast::{Expr, ImportSpec, Stmt};
use schemadoc::{load_package, parse_source, DeclarationIndex, ScanMode};

fn testdata_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

#[test]
fn test_load_package_skips_test_files() {
    let files = load_package(&testdata_path("azurerm"), |_| false).unwrap();

    let names: Vec<_> = files
        .iter()
        .map(|f| {
            PathBuf::from(&f.path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .to_string()
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "data_source_image.go",
            "provider.go",
            "resource_group.go",
            "schemas.go",
        ]
    );
    assert!(files.iter().all(|f| f.package == "azurerm"));
}

#[test]
fn test_aliased_import() {
    let files = load_package(&testdata_path("azurerm"), |_| false).unwrap();
    let schemas = files.iter().find(|f| f.path.ends_with("schemas.go")).unwrap();

    assert_eq!(
        schemas.imports,
        vec![ImportSpec::new(
            Some("hschema"),
            "\"github.com/hashicorp/terraform/helper/schema\""
        )]
    );

    let imports = ImportMap::from_specs(&schemas.imports).unwrap();
    assert_eq!(
        imports.resolve("hschema"),
        Some("github.com/hashicorp/terraform/helper/schema")
    );
    assert_eq!(imports.resolve("schema"), None);
}

#[test]
fn test_classification_of_fixture() {
    let files = load_package(&testdata_path("azurerm"), |_| false).unwrap();
    let index = DeclarationIndex::build(files, &SchemaModules::default(), ScanMode::First).unwrap();

    assert_eq!(index.provider.as_ref().map(|p| p.name()), Some("Provider"));

    let resources: Vec<_> = index.resources.keys().map(String::as_str).collect();
    assert_eq!(
        resources,
        vec![
            "dataSourceArmImage",
            "dataSourceArmResourceGroup",
            "resourceArmResourceGroup",
        ]
    );

    let schemas: Vec<_> = index.schemas.keys().map(String::as_str).collect();
    assert_eq!(
        schemas,
        vec![
            "locationForDataSourceSchema",
            "locationSchema",
            "resourceGroupNameForDataSourceSchema",
            "tagsForDataSourceSchema",
            "tagsSchema",
        ]
    );
}

#[test]
fn test_classification_requires_schema_module() {
    let file = parse_source(
        "other.go",
        br#"
package other

import (
	"github.com/hashicorp/terraform/helper/schema"
	schema2 "example.com/fake/schema"
)

func real() *schema.Resource { return nil }
func fake() *schema2.Resource { return nil }
func value() schema.Schema { return schema.Schema{} }
func plain() *Resource { return nil }
"#,
    )
    .unwrap();

    let imports = ImportMap::from_specs(&file.imports).unwrap();
    let modules = SchemaModules::default();
    let classes: Vec<_> = file
        .funcs
        .iter()
        .map(|f| classify(f, &imports, &modules))
        .collect();
    assert_eq!(
        classes,
        vec![
            DeclClass::Resource,
            DeclClass::None,
            DeclClass::Schema,
            DeclClass::None,
        ]
    );
}

#[test]
fn test_doc_comment_of_fixture() {
    let file = parse_source(
        "doc.go",
        include_bytes!("../testdata/azurerm/resource_group.go"),
    )
    .unwrap();
    let resource = file
        .funcs
        .iter()
        .find(|f| f.name == "resourceArmResourceGroup")
        .unwrap();
    assert_eq!(
        resource.doc,
        "resourceArmResourceGroup returns the resource group resource.\n\nManages a Resource Group.\n"
    );
    assert_eq!(resource.line, 23);

    let read = file
        .funcs
        .iter()
        .find(|f| f.name == "resourceArmResourceGroupRead")
        .unwrap();
    assert_eq!(read.doc, "");
    assert_eq!(read.results, vec![Expr::ident("error")]);
    assert_eq!(read.body, vec![Stmt::Return(vec![Expr::ident("nil")])]);
}
