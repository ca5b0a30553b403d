//! Top-level orchestration: from parsed source files to documented resources.
//!
//! The generator owns the error policy. A missing provider constructor
//! always aborts. A malformed registry and per-resource failures are either
//! collected (`keep_going`) or abort the run on the first one. A malformed
//! registry only affects the resources drawn from it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{
    AttrPath, DeclarationIndex, GenerateError, Registry, RegistryError, ResolveErrorKind,
    ResourceBuilder, ResourceError, ScanMode, SchemaModules,
};
use crate::ast::SourceFile;
use crate::model::{Resource, ResourceType};

/// Which registries a selection draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    Datasource,
    Resource,
    #[default]
    All,
}

impl KindFilter {
    /// Resource types passing the filter, data sources first.
    pub fn types(&self) -> &'static [ResourceType] {
        match self {
            KindFilter::Datasource => &[ResourceType::Datasource],
            KindFilter::Resource => &[ResourceType::Resource],
            KindFilter::All => &[ResourceType::Datasource, ResourceType::Resource],
        }
    }
}

impl FromStr for KindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "datasource" | "data-source" | "d" => Ok(KindFilter::Datasource),
            "resource" | "r" => Ok(KindFilter::Resource),
            "all" => Ok(KindFilter::All),
            _ => Err(format!("unknown kind: {}", s)),
        }
    }
}

/// Names to document. An empty name list selects everything registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub names: Vec<String>,
    pub kind: KindFilter,
}

impl Selection {
    /// Every registered name of every kind.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            kind: KindFilter::All,
        }
    }

    pub fn kind(mut self, kind: KindFilter) -> Self {
        self.kind = kind;
        self
    }
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct Report {
    /// Successfully built resources, in selection order.
    pub resources: Vec<Resource>,
    /// Resources that could not be built (only with `keep_going`).
    pub failures: Vec<ResourceError>,
    /// Selected registries that could not be read (only with `keep_going`).
    pub registry_failures: Vec<RegistryError>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.registry_failures.is_empty()
    }
}

/// One resource to build.
#[derive(Debug, Clone)]
struct Target {
    resource_type: ResourceType,
    name: String,
    /// `None` when the name is not registered.
    constructor: Option<String>,
}

/// Builds [`Resource`] models for a provider package.
#[derive(Debug, Clone)]
pub struct Generator {
    provider: String,
    prefix: String,
    modules: SchemaModules,
    scan: ScanMode,
    keep_going: bool,
    parallel: bool,
}

impl Generator {
    /// Create a generator for `provider`, stripping `"<provider>_"` from names.
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            prefix: format!("{}_", provider),
            modules: SchemaModules::default(),
            scan: ScanMode::default(),
            keep_going: true,
            parallel: false,
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn modules(mut self, modules: SchemaModules) -> Self {
        self.modules = modules;
        self
    }

    pub fn scan(mut self, scan: ScanMode) -> Self {
        self.scan = scan;
        self
    }

    /// Collect per-resource failures instead of aborting on the first one.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Build resources on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Classify `files` and extract the provider's registries. Malformed
    /// registries are returned inside the [`Registry`], not as an error.
    pub fn index(
        &self,
        files: Vec<SourceFile>,
    ) -> Result<(DeclarationIndex, Registry), GenerateError> {
        let index = DeclarationIndex::build(files, &self.modules, self.scan)?;
        let provider = index.provider.as_ref().ok_or(GenerateError::MissingProvider)?;
        debug!(provider = %provider.name(), file = %provider.file, "provider constructor");

        let registry = Registry::extract(&provider.func);
        info!(
            entries = registry.len(),
            malformed = registry.errors().count(),
            "registries extracted"
        );
        Ok((index, registry))
    }

    /// Build every selected resource.
    pub fn generate(
        &self,
        files: Vec<SourceFile>,
        selection: &Selection,
    ) -> Result<Report, GenerateError> {
        let (index, registry) = self.index(files)?;
        let mut report = Report::default();

        for &resource_type in selection.kind.types() {
            if let Err(err) = registry.get(resource_type) {
                if !self.keep_going {
                    return Err(err.clone().into());
                }
                warn!(registry = err.registry, "{}", err);
                report.registry_failures.push(err.clone());
            }
        }

        let targets = select(&registry, selection);
        debug!(targets = targets.len(), "resources selected");

        let builder = ResourceBuilder::new(&index, &self.modules, &self.provider, &self.prefix);
        let build = |target: &Target| build_target(&builder, &index, target);

        if self.parallel {
            use rayon::prelude::*;

            let results: Vec<_> = targets.par_iter().map(build).collect();
            for result in results {
                self.record(&mut report, result)?;
            }
        } else {
            for target in &targets {
                self.record(&mut report, build(target))?;
            }
        }

        info!(
            built = report.resources.len(),
            failed = report.failures.len(),
            malformed_registries = report.registry_failures.len(),
            "generation finished"
        );
        Ok(report)
    }

    fn record(
        &self,
        report: &mut Report,
        result: Result<Resource, ResourceError>,
    ) -> Result<(), GenerateError> {
        match result {
            Ok(resource) => {
                debug!(
                    resource = %resource.name,
                    kind = %resource.resource_type,
                    attributes = resource.attributes.len(),
                    "resource built"
                );
                report.resources.push(resource);
            }
            Err(err) if self.keep_going => {
                warn!(resource = %err.resource, kind = %err.resource_type, "{}", err);
                report.failures.push(err);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}

/// Resolve a selection against the readable registries, data sources first.
fn select(registry: &Registry, selection: &Selection) -> Vec<Target> {
    let types = selection.kind.types();
    let mut targets = Vec::new();

    if selection.names.is_empty() {
        for &resource_type in types {
            let Ok(entries) = registry.get(resource_type) else {
                continue;
            };
            for (name, constructor) in entries {
                targets.push(Target {
                    resource_type,
                    name: name.clone(),
                    constructor: Some(constructor.clone()),
                });
            }
        }
        return targets;
    }

    let mut names: Vec<&String> = Vec::new();
    for name in &selection.names {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    for &resource_type in types {
        for name in &names {
            if let Some(constructor) = registry.constructor(resource_type, name) {
                targets.push(Target {
                    resource_type,
                    name: (*name).clone(),
                    constructor: Some(constructor.to_string()),
                });
            }
        }
    }

    // a name missing from a readable registry may still live in a malformed one
    if types.iter().any(|&t| registry.get(t).is_err()) {
        return targets;
    }

    for name in names {
        let known = types
            .iter()
            .any(|&t| registry.constructor(t, name).is_some());
        if !known {
            targets.push(Target {
                resource_type: types[0],
                name: name.clone(),
                constructor: None,
            });
        }
    }

    targets
}

fn build_target(
    builder: &ResourceBuilder<'_>,
    index: &DeclarationIndex,
    target: &Target,
) -> Result<Resource, ResourceError> {
    let fail = |kind: ResolveErrorKind| {
        ResourceError::new(
            &target.name,
            target.resource_type,
            vec![kind.at(&AttrPath::root())],
        )
    };

    let constructor = target
        .constructor
        .as_deref()
        .ok_or_else(|| fail(ResolveErrorKind::UnknownResource(target.name.clone())))?;
    let decl = index
        .resource(constructor)
        .ok_or_else(|| fail(ResolveErrorKind::UnresolvedConstructor(constructor.to_string())))?;

    builder.build(&target.name, target.resource_type, decl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    const PROVIDER: &str = r#"
package azurerm

import (
	"github.com/hashicorp/terraform/helper/schema"
	"github.com/hashicorp/terraform/terraform"
)

func Provider() terraform.ResourceProvider {
	p := &schema.Provider{
		DataSourcesMap: map[string]*schema.Resource{
			"azurerm_image":    dataSourceArmImage(),
			"azurerm_broken":   dataSourceArmBroken(),
		},
		ResourcesMap: map[string]*schema.Resource{
			"azurerm_image":   resourceArmImage(),
			"azurerm_missing": resourceArmMissing(),
		},
	}
	return p
}
"#;

    const RESOURCES: &str = r#"
package azurerm

import "github.com/hashicorp/terraform/helper/schema"

// dataSourceArmImage returns the image data source.
//
// Use this data source to access information about an Image.
func dataSourceArmImage() *schema.Resource {
	return &schema.Resource{
		Schema: map[string]*schema.Schema{
			"name":     {Type: schema.TypeString, Required: true},
			"location": {Type: schema.TypeString, Computed: true},
		},
	}
}

func dataSourceArmBroken() *schema.Resource {
	return &schema.Resource{
		Schema: map[string]*schema.Schema{
			"tags": tagsSchema(),
		},
	}
}

func resourceArmImage() *schema.Resource {
	return &schema.Resource{
		Schema: map[string]*schema.Schema{
			"name": {Type: schema.TypeString, Required: true},
		},
	}
}
"#;

    fn files() -> Vec<SourceFile> {
        vec![
            parse_source("azurerm/provider.go", PROVIDER.as_bytes()).unwrap(),
            parse_source("azurerm/resources.go", RESOURCES.as_bytes()).unwrap(),
        ]
    }

    fn names(report: &Report) -> Vec<(ResourceType, &str)> {
        report
            .resources
            .iter()
            .map(|r| (r.resource_type, r.name.as_str()))
            .collect()
    }

    #[test]
    fn test_kind_filter_from_str() {
        assert_eq!("datasource".parse::<KindFilter>(), Ok(KindFilter::Datasource));
        assert_eq!("Resource".parse::<KindFilter>(), Ok(KindFilter::Resource));
        assert_eq!("all".parse::<KindFilter>(), Ok(KindFilter::All));
        assert!("module".parse::<KindFilter>().is_err());
    }

    #[test]
    fn test_generate_single_datasource() {
        let selection = Selection::names(["azurerm_image"]).kind(KindFilter::Datasource);
        let report = Generator::new("azurerm").generate(files(), &selection).unwrap();

        assert!(report.is_success());
        assert_eq!(report.resources.len(), 1);
        let image = &report.resources[0];
        assert_eq!(image.name, "azurerm_image");
        assert_eq!(image.name_suffix, "image");
        assert_eq!(image.resource_type, ResourceType::Datasource);
        assert_eq!(
            image.description,
            "Use this data source to access information about an Image."
        );
        let attrs: Vec<_> = image.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(attrs, vec!["location", "name"]);
    }

    #[test]
    fn test_name_in_both_registries() {
        let report = Generator::new("azurerm")
            .generate(files(), &Selection::names(["azurerm_image"]))
            .unwrap();
        assert_eq!(
            names(&report),
            vec![
                (ResourceType::Datasource, "azurerm_image"),
                (ResourceType::Resource, "azurerm_image"),
            ]
        );
    }

    #[test]
    fn test_keep_going_collects_failures() {
        let report = Generator::new("azurerm")
            .generate(files(), &Selection::all())
            .unwrap();

        assert_eq!(
            names(&report),
            vec![
                (ResourceType::Datasource, "azurerm_image"),
                (ResourceType::Resource, "azurerm_image"),
            ]
        );
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].resource, "azurerm_broken");
        assert_eq!(
            report.failures[0].errors[0].kind,
            ResolveErrorKind::UnresolvedSchemaReference("tagsSchema".to_string())
        );
        assert_eq!(report.failures[0].errors[0].path.to_string(), "tags");
        assert_eq!(report.failures[1].resource, "azurerm_missing");
        assert_eq!(
            report.failures[1].errors[0].kind,
            ResolveErrorKind::UnresolvedConstructor("resourceArmMissing".to_string())
        );
    }

    #[test]
    fn test_fail_fast() {
        let err = Generator::new("azurerm")
            .keep_going(false)
            .generate(files(), &Selection::all())
            .unwrap_err();
        match err {
            GenerateError::Resource(err) => assert_eq!(err.resource, "azurerm_broken"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_resource() {
        let report = Generator::new("azurerm")
            .generate(
                files(),
                &Selection::names(["azurerm_nope", "azurerm_image"]).kind(KindFilter::Resource),
            )
            .unwrap();
        assert_eq!(names(&report), vec![(ResourceType::Resource, "azurerm_image")]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].errors[0].kind,
            ResolveErrorKind::UnknownResource("azurerm_nope".to_string())
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = Generator::new("azurerm")
            .generate(files(), &Selection::all())
            .unwrap();
        let parallel = Generator::new("azurerm")
            .parallel(true)
            .generate(files(), &Selection::all())
            .unwrap();
        assert_eq!(sequential.resources, parallel.resources);
        assert_eq!(sequential.failures, parallel.failures);
    }

    const SPLIT_PROVIDER: &str = r#"
package azurerm

import (
	"github.com/hashicorp/terraform/helper/schema"
	"github.com/hashicorp/terraform/terraform"
)

func Provider() terraform.ResourceProvider {
	return &schema.Provider{
		DataSourcesMap: map[string]*schema.Resource{
			"azurerm_image": dataSourceArmImage(),
		},
		ResourcesMap: map[string]*schema.Resource{
			"azurerm_bad": resourceArmBad,
		},
	}
}
"#;

    fn split_files() -> Vec<SourceFile> {
        vec![
            parse_source("azurerm/provider.go", SPLIT_PROVIDER.as_bytes()).unwrap(),
            parse_source("azurerm/resources.go", RESOURCES.as_bytes()).unwrap(),
        ]
    }

    #[test]
    fn test_malformed_registry_spares_other_kind() {
        let selection = Selection::names(["azurerm_image"]).kind(KindFilter::Datasource);
        let report = Generator::new("azurerm")
            .keep_going(false)
            .generate(split_files(), &selection)
            .unwrap();

        assert!(report.is_success());
        assert_eq!(names(&report), vec![(ResourceType::Datasource, "azurerm_image")]);
    }

    #[test]
    fn test_malformed_registry_reported() {
        let report = Generator::new("azurerm")
            .generate(split_files(), &Selection::names(["azurerm_image"]))
            .unwrap();

        assert_eq!(names(&report), vec![(ResourceType::Datasource, "azurerm_image")]);
        assert!(report.failures.is_empty());
        assert!(!report.is_success());
        assert_eq!(report.registry_failures.len(), 1);
        let err = &report.registry_failures[0];
        assert_eq!(err.registry, "ResourcesMap");
        assert!(err.reason.contains("\"azurerm_bad\": expected call expression"), "{}", err);
    }

    #[test]
    fn test_malformed_registry_fail_fast() {
        let err = Generator::new("azurerm")
            .keep_going(false)
            .generate(split_files(), &Selection::all())
            .unwrap_err();
        match err {
            GenerateError::MalformedRegistry(err) => {
                assert_eq!(err.resource_type, ResourceType::Resource)
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_provider() {
        let files = vec![parse_source("azurerm/resources.go", RESOURCES.as_bytes()).unwrap()];
        let err = Generator::new("azurerm")
            .generate(files, &Selection::all())
            .unwrap_err();
        assert!(matches!(err, GenerateError::MissingProvider));
    }
}
