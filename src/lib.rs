//! schemadoc - Terraform provider documentation generator.
//!
//! schemadoc reads the Go source of a Terraform provider package and
//! produces website documentation for its data sources and resources. It
//! works on syntax alone: functions are recognized by their declared
//! result types, and schemas are followed through calls into
//! schema-builder functions.
//!
//! # Architecture
//!
//! - `parser`: tree-sitter Go parsing, lowered into `ast`
//! - `ast`: the owned syntax tree the analysis matches on
//! - `analysis`: declaration classification, registry extraction and
//!   recursive schema resolution
//! - `model`: resolved `Resource` and `Attribute` values
//! - `generator`: orchestration and error policy
//! - `config`: YAML configuration
//! - `report`: Markdown pages, JSON and terminal output

pub mod analysis;
pub mod ast;
pub mod cli;
pub mod config;
pub mod generator;
pub mod model;
pub mod parser;
pub mod report;

pub use analysis::{
    DeclarationIndex, GenerateError, Registry, RegistryError, ResourceError, ScanMode,
    SchemaModules,
};
pub use config::Config;
pub use generator::{Generator, KindFilter, Report, Selection};
pub use model::{Attribute, Resource, ResourceType};
pub use parser::{load_package, parse_source, GoParser};
