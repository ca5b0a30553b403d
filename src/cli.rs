//! Command-line interface for schemadoc.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analysis::ScanMode;
use crate::config::{Config, DEFAULT_CONFIG_NAMES};
use crate::generator::KindFilter;
use crate::model::ResourceType;
use crate::parser;
use crate::report::{self, PageRenderer};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Generate Terraform provider website documentation from Go schema
/// definitions.
///
/// schemadoc reads the provider package's Go source, finds the provider
/// constructor and its data source and resource registries, resolves every
/// schema into an attribute tree and renders one Markdown page per
/// resource.
#[derive(Parser)]
#[command(name = "schemadoc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate documentation pages
    #[command(visible_alias = "gen")]
    Generate(GenerateArgs),
    /// List the data sources and resources a provider registers
    List(ListArgs),
}

/// Arguments for the generate command.
#[derive(Parser)]
pub struct GenerateArgs {
    /// Provider package directory (default: `source` from the config)
    pub path: Option<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only document these names (repeatable)
    #[arg(short, long = "resource")]
    pub resources: Vec<String>,

    /// Registries to document: datasource, resource, or all
    #[arg(short, long)]
    pub kind: Option<KindFilter>,

    /// Output root for pages
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Page template file (minijinja)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Output format: markdown or json
    #[arg(short, long, default_value = "markdown")]
    pub format: String,

    /// Packages to scan: first or all
    #[arg(long)]
    pub scan: Option<ScanMode>,

    /// Stop at the first resource that fails to build
    #[arg(long)]
    pub fail_fast: bool,

    /// Build resources in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Resolve everything but write no pages
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the list command.
#[derive(Parser)]
pub struct ListArgs {
    /// Provider package directory (default: `source` from the config)
    pub path: Option<PathBuf>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Registries to list: datasource, resource, or all
    #[arg(short, long)]
    pub kind: Option<KindFilter>,
}

/// Load the explicit config, a discovered one, or the defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(Path::new(".")),
    };

    let config = match path {
        Some(path) => {
            debug!(config = %path.display(), "loading config");
            Config::parse_file(&path)
                .map_err(|e| anyhow::anyhow!("parsing config {}: {}", path.display(), e))?
        }
        None => {
            debug!(
                "no config file found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Config::default()
        }
    };

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;
    Ok(config)
}

/// Run the generate command.
pub fn run_generate(args: &GenerateArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "markdown" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'markdown' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    // Flags override the config
    if let Some(path) = &args.path {
        config.source = path.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(template) = &args.template {
        config.template = Some(template.clone());
    }
    if !args.resources.is_empty() {
        config.resources = args.resources.clone();
    }
    if let Some(kind) = args.kind {
        config.kind = kind;
    }
    if let Some(scan) = args.scan {
        config.scan = scan;
    }
    if args.fail_fast {
        config.keep_going = false;
    }
    if args.parallel {
        config.parallel = true;
    }

    let renderer = match &config.template {
        Some(path) => PageRenderer::from_file(path),
        None => PageRenderer::new(),
    };
    let renderer = match renderer {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let files = match parser::load_package(&config.source, |p| config.is_path_excluded(p)) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    info!(files = files.len(), source = %config.source.display(), "package loaded");

    let report = match config.generator().generate(files, &config.selection()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let mut written = Vec::new();
    if !args.dry_run && args.format == "markdown" {
        for resource in &report.resources {
            let path = renderer.write_page(&config.output, resource)?;
            debug!(resource = %resource.name, page = %path.display(), "page written");
            written.push(path);
        }
    }

    match args.format.as_str() {
        "json" => report::write_json(&config.provider, &report)?,
        _ => report::write_pretty(
            &config.source.to_string_lossy(),
            &config.output.to_string_lossy(),
            &report,
            &written,
            args.dry_run,
        ),
    }

    if report.is_success() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the list command.
pub fn run_list(args: &ListArgs) -> anyhow::Result<i32> {
    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Some(path) = &args.path {
        config.source = path.clone();
    }
    let kind = args.kind.unwrap_or(config.kind);

    let files = match parser::load_package(&config.source, |p| config.is_path_excluded(p)) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let (_, registry) = match config.generator().index(files) {
        Ok(indexed) => indexed,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let mut code = EXIT_SUCCESS;
    for &resource_type in kind.types() {
        let heading = match resource_type {
            ResourceType::Datasource => "Data sources",
            ResourceType::Resource => "Resources",
        };
        match registry.get(resource_type) {
            Ok(entries) => {
                println!("{} ({}):", heading, entries.len());
                for (name, constructor) in entries {
                    println!("  {:<40} {}", name, constructor);
                }
            }
            Err(err) => {
                println!("{}: unreadable", heading);
                eprintln!("Error: {}", err);
                code = EXIT_FAILED;
            }
        }
        println!();
    }

    Ok(code)
}
