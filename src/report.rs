//! Output formatting for generated documentation.
//!
//! Supports:
//! - Markdown: Terraform website pages with YAML front matter, rendered
//!   through a replaceable minijinja template
//! - JSON: the resolved models and failures, for programmatic consumption
//! - Pretty: colored terminal summary of a run

use std::fs;
use std::path::{Path, PathBuf};

use colored::*;
use minijinja::Environment;
use serde::Serialize;

use crate::analysis::ResourceError;
use crate::generator::Report;
use crate::model::{Attribute, Resource, ResourceType};

// =============================================================================
// Markdown pages
// =============================================================================

/// Page template used when no other is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/resource.md.tmpl");

const TEMPLATE_NAME: &str = "resource";

/// Path of the page for `resource` under `root`:
/// `<root>/<d|r>/<name_suffix>.html.markdown`.
pub fn page_path(root: &Path, resource: &Resource) -> PathBuf {
    root.join(resource.resource_type.dir())
        .join(format!("{}.html.markdown", resource.name_suffix))
}

/// Render the documentation page for one resource with the default template.
pub fn render_markdown(resource: &Resource) -> anyhow::Result<String> {
    PageRenderer::new()?.render(resource)
}

/// Render and write the page for `resource` with the default template.
pub fn write_page(root: &Path, resource: &Resource) -> anyhow::Result<PathBuf> {
    PageRenderer::new()?.write_page(root, resource)
}

/// Renders resource pages through a minijinja template.
///
/// The template sees `resource` (the serialized [`Resource`]) along with
/// `title`, `noun`, `summary`, `arguments`, `exported` and `blocks`, the
/// last three holding prepared attribute items.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Renderer for the built-in template.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_template(DEFAULT_TEMPLATE.to_string())
    }

    /// Renderer for a user-supplied template file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading template {}: {}", path.display(), e))?;
        Self::with_template(source)
            .map_err(|e| anyhow::anyhow!("template {}: {}", path.display(), e))
    }

    pub fn with_template(source: String) -> anyhow::Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template_owned(TEMPLATE_NAME, source)?;
        Ok(Self { env })
    }

    pub fn render(&self, resource: &Resource) -> anyhow::Result<String> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        let page = template
            .render(PageContext::new(resource))
            .map_err(|e| anyhow::anyhow!("rendering {}: {}", resource.name, e))?;
        Ok(page)
    }

    /// Render and write the page for `resource`, creating directories as
    /// needed.
    pub fn write_page(&self, root: &Path, resource: &Resource) -> anyhow::Result<PathBuf> {
        let path = page_path(root, resource);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("creating {}: {}", parent.display(), e))?;
        }
        fs::write(&path, self.render(resource)?)
            .map_err(|e| anyhow::anyhow!("writing {}: {}", path.display(), e))?;
        Ok(path)
    }
}

#[derive(Serialize)]
struct PageContext<'a> {
    resource: &'a Resource,
    title: &'static str,
    noun: &'static str,
    summary: &'a str,
    arguments: Vec<Item<'a>>,
    exported: Vec<Item<'a>>,
    blocks: Vec<Block<'a>>,
}

impl<'a> PageContext<'a> {
    fn new(r: &'a Resource) -> Self {
        let (arguments, exported): (Vec<&Attribute>, Vec<&Attribute>) =
            r.attributes.iter().partition(|a| a.is_argument());

        let mut blocks = Vec::new();
        for attr in &r.attributes {
            collect_blocks(attr, &mut blocks);
        }

        Self {
            resource: r,
            title: r.resource_type.title(),
            noun: noun(r.resource_type),
            summary: summary(r),
            arguments: arguments.into_iter().map(Item::new).collect(),
            exported: exported.into_iter().map(Item::new).collect(),
            blocks,
        }
    }
}

/// One attribute line.
#[derive(Serialize)]
struct Item<'a> {
    name: &'a str,
    description: &'a str,
    required: bool,
    optional: bool,
    computed: bool,
    block: bool,
    min: i64,
    max: i64,
    bounds: Option<String>,
}

impl<'a> Item<'a> {
    fn new(attr: &'a Attribute) -> Self {
        Self {
            name: &attr.name,
            description: &attr.description,
            required: attr.required,
            optional: attr.optional,
            computed: attr.computed,
            block: attr.is_block(),
            min: attr.min,
            max: attr.max,
            bounds: bounds(attr),
        }
    }
}

/// A nested block section.
#[derive(Serialize)]
struct Block<'a> {
    name: &'a str,
    /// `supports` for arguments, `exports` otherwise.
    verb: &'static str,
    items: Vec<Item<'a>>,
}

/// One section per nested block, depth first.
fn collect_blocks<'a>(attr: &'a Attribute, blocks: &mut Vec<Block<'a>>) {
    if !attr.is_block() {
        return;
    }

    blocks.push(Block {
        name: &attr.name,
        verb: if attr.is_argument() { "supports" } else { "exports" },
        items: attr.attributes.iter().map(Item::new).collect(),
    });
    for child in &attr.attributes {
        collect_blocks(child, blocks);
    }
}

fn noun(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Datasource => "data source",
        ResourceType::Resource => "resource",
    }
}

/// Front matter description: the short description, or the first line of
/// the long one.
fn summary(r: &Resource) -> &str {
    if !r.short_description.is_empty() {
        return &r.short_description;
    }
    r.description.lines().next().unwrap_or("")
}

fn bounds(attr: &Attribute) -> Option<String> {
    match (attr.min, attr.max) {
        (0, 0) => None,
        (min, 0) => Some(format!("At least {} must be specified.", min)),
        (0, max) => Some(format!("At most {} may be specified.", max)),
        (min, max) if min == max => Some(format!("Exactly {} must be specified.", min)),
        (min, max) => Some(format!("Between {} and {} must be specified.", min, max)),
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Serialize)]
pub struct JsonReport<'a> {
    pub version: &'static str,
    pub provider: &'a str,
    pub resources: &'a [Resource],
    pub failures: Vec<JsonFailure>,
    pub registry_failures: Vec<JsonRegistryFailure>,
}

/// A resource that failed to build.
#[derive(Serialize)]
pub struct JsonFailure {
    pub resource: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub errors: Vec<JsonError>,
}

/// A registry that could not be read.
#[derive(Serialize)]
pub struct JsonRegistryFailure {
    pub registry: &'static str,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub message: String,
}

#[derive(Serialize)]
pub struct JsonError {
    pub path: String,
    pub message: String,
}

fn failure_to_json(err: &ResourceError) -> JsonFailure {
    JsonFailure {
        resource: err.resource.clone(),
        resource_type: err.resource_type,
        errors: err
            .errors
            .iter()
            .map(|e| JsonError {
                path: e.path.to_string(),
                message: e.kind.to_string(),
            })
            .collect(),
    }
}

/// Render a run as pretty-printed JSON.
pub fn render_json(provider: &str, report: &Report) -> anyhow::Result<String> {
    let json = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        provider,
        resources: &report.resources,
        failures: report.failures.iter().map(failure_to_json).collect(),
        registry_failures: report
            .registry_failures
            .iter()
            .map(|e| JsonRegistryFailure {
                registry: e.registry,
                resource_type: e.resource_type,
                message: e.reason.clone(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Write a run in JSON format to stdout.
pub fn write_json(provider: &str, report: &Report) -> anyhow::Result<()> {
    println!("{}", render_json(provider, report)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Output root as shown in the summary.
fn output_label(output: &str, dry_run: bool) -> String {
    if dry_run {
        format!("{} (dry run)", output)
    } else {
        output.to_string()
    }
}

/// Write a colored summary of a run. `written` holds the page path of each
/// resource in `report.resources` that was written.
pub fn write_pretty(
    source: &str,
    output: &str,
    report: &Report,
    written: &[PathBuf],
    dry_run: bool,
) {
    println!();
    print!("  ");
    print!("{}", "schemadoc".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Source: ".dimmed());
    println!("{}", source);
    print!("  {}", "Output: ".dimmed());
    let label = output_label(output, dry_run);
    if dry_run {
        println!("{}", label.dimmed());
    } else {
        println!("{}", label);
    }
    println!();

    if !report.resources.is_empty() {
        println!("  {} ({}):", "Generated".bold(), report.resources.len());
        println!();
        for (i, resource) in report.resources.iter().enumerate() {
            print!("    {} ", "✓".green());
            print!("{:<12}", resource.resource_type.as_str().dimmed());
            print!("{}", resource.name);
            if let Some(path) = written.get(i) {
                print!("  {}", path.display().to_string().blue());
            }
            println!();
        }
        println!();
    }

    if !report.registry_failures.is_empty() {
        println!(
            "  {} ({}):",
            "Unreadable registries".bold(),
            report.registry_failures.len()
        );
        println!();
        for err in &report.registry_failures {
            print!("    {} ", "✗".red());
            print!("{:<12}", err.resource_type.as_str().dimmed());
            println!("{}", err.registry);
            println!("            {}", err.reason.dimmed());
        }
        println!();
    }

    if !report.failures.is_empty() {
        println!("  {} ({}):", "Failed".bold(), report.failures.len());
        println!();
        for failure in &report.failures {
            print!("    {} ", "✗".red());
            print!("{:<12}", failure.resource_type.as_str().dimmed());
            println!("{}", failure.resource);
            for err in &failure.errors {
                println!("            {}", err.to_string().dimmed());
            }
        }
        println!();
    }

    if report.is_success() {
        println!("  {}", "PASSED".green());
    } else {
        println!("  {}", "FAILED".red());
    }
    println!();
}
