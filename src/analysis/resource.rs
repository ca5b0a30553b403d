//! Building a documented resource from its schema constructor.

use super::attributes::{find_schema_field, SchemaResolver};
use super::classify::{DeclRef, DeclarationIndex, SchemaModules};
use super::error::{AttrPath, ResolveErrorKind, ResourceError};
use crate::model::{Resource, ResourceType};

/// Builds [`Resource`] values for one provider.
pub struct ResourceBuilder<'a> {
    index: &'a DeclarationIndex,
    modules: &'a SchemaModules,
    provider: &'a str,
    prefix: &'a str,
}

impl<'a> ResourceBuilder<'a> {
    /// `prefix` is stripped from resource names, e.g. `azurerm_`.
    pub fn new(
        index: &'a DeclarationIndex,
        modules: &'a SchemaModules,
        provider: &'a str,
        prefix: &'a str,
    ) -> Self {
        Self {
            index,
            modules,
            provider,
            prefix,
        }
    }

    /// Build the resource registered as `name`, whose schema is produced by
    /// the constructor `decl`.
    pub fn build(
        &self,
        name: &str,
        resource_type: ResourceType,
        decl: &DeclRef,
    ) -> Result<Resource, ResourceError> {
        let fail = |kind: ResolveErrorKind| {
            ResourceError::new(name, resource_type, vec![kind.at(&AttrPath::root())])
        };

        let name_suffix = name
            .strip_prefix(self.prefix)
            .ok_or_else(|| {
                fail(ResolveErrorKind::NamePrefix {
                    name: name.to_string(),
                    prefix: self.prefix.to_string(),
                })
            })?
            .to_string();

        let schema = find_schema_field(decl.func.body_nodes())
            .map_err(fail)?
            .ok_or_else(|| fail(ResolveErrorKind::SchemaFieldNotFound))?;

        let attributes = SchemaResolver::new(self.index, self.modules)
            .resolve_attributes(schema, decl, &AttrPath::root())
            .map_err(|errors| ResourceError::new(name, resource_type, errors))?;

        Ok(Resource {
            provider: self.provider.to_string(),
            name: name.to_string(),
            name_suffix,
            short_description: String::new(),
            description: doc_description(&decl.func.doc),
            resource_type,
            attributes,
        })
    }
}

/// Doc text without its first (summary) line, trimmed.
pub fn doc_description(doc: &str) -> String {
    match doc.split_once('\n') {
        Some((_, rest)) => rest.trim().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::{index_from, wrap_resource};

    fn build(source: &str, name: &str) -> Result<Resource, ResourceError> {
        let index = index_from(source);
        let modules = SchemaModules::default();
        let decl = index.resource("resourceThing").expect("constructor");
        ResourceBuilder::new(&index, &modules, "azurerm", "azurerm_").build(
            name,
            ResourceType::Resource,
            decl,
        )
    }

    #[test]
    fn test_doc_description() {
        assert_eq!(doc_description(""), "");
        assert_eq!(doc_description("summary only\n"), "");
        assert_eq!(
            doc_description("resourceThing is a thing.\n\nManages a thing.\n"),
            "Manages a thing."
        );
    }

    #[test]
    fn test_build_resource() {
        let source = wrap_resource(
            r#"
            "name":     {Type: schema.TypeString, Required: true, Description: "Name."},
            "location": {Type: schema.TypeString, Computed: true},
            "#,
            "",
        );
        let resource = build(&source, "azurerm_thing").unwrap();

        assert_eq!(resource.provider, "azurerm");
        assert_eq!(resource.name, "azurerm_thing");
        assert_eq!(resource.name_suffix, "thing");
        assert_eq!(resource.resource_type, ResourceType::Resource);
        assert_eq!(resource.description, "Manages a thing.");
        assert_eq!(resource.short_description, "");
        let names: Vec<_> = resource.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["location", "name"]);
        assert_eq!(resource.attribute("name").unwrap().description, "Name.");
    }

    #[test]
    fn test_name_without_prefix() {
        let source = wrap_resource("", "");
        let err = build(&source, "azure").unwrap_err();
        assert!(matches!(err.errors[0].kind, ResolveErrorKind::NamePrefix { .. }));

        let err = build(&source, "google_thing").unwrap_err();
        assert!(matches!(err.errors[0].kind, ResolveErrorKind::NamePrefix { .. }));
    }

    #[test]
    fn test_schema_field_missing() {
        let source = r#"
package azurerm

import "github.com/hashicorp/terraform/helper/schema"

func resourceThing() *schema.Resource {
	return &schema.Resource{Read: resourceThingRead}
}
"#;
        let err = build(source, "azurerm_thing").unwrap_err();
        assert_eq!(err.resource, "azurerm_thing");
        assert_eq!(err.errors[0].kind, ResolveErrorKind::SchemaFieldNotFound);
    }

    #[test]
    fn test_schema_field_not_literal() {
        let source = r#"
package azurerm

import "github.com/hashicorp/terraform/helper/schema"

func resourceThing() *schema.Resource {
	return &schema.Resource{Schema: thingSchema()}
}
"#;
        let err = build(source, "azurerm_thing").unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            ResolveErrorKind::UnexpectedShape { expected: "composite literal", .. }
        ));
    }

    #[test]
    fn test_build_is_idempotent() {
        let source = wrap_resource(
            r#"
            "b": {Type: schema.TypeString, Optional: true},
            "a": tagsSchema(),
            "#,
            r#"
func tagsSchema() *schema.Schema {
	return &schema.Schema{Type: schema.TypeMap, Optional: true}
}
"#,
        );
        let first = build(&source, "azurerm_thing").unwrap();
        let second = build(&source, "azurerm_thing").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
