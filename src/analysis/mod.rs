//! Schema analysis over the Go syntax tree.
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌──────────────────┐
//! │ SourceFiles │──▶│ ImportMap  │──▶│ DeclarationIndex │
//! └─────────────┘   │ (per file) │   │ (classified fns) │
//!                   └────────────┘   └──────────────────┘
//!                                             │
//!                         ┌───────────────────┴────────┐
//!                         ▼                            ▼
//!                  ┌──────────────┐           ┌─────────────────┐
//!                  │  Registry    │──────────▶│ ResourceBuilder │
//!                  │ (provider fn)│           │ + SchemaResolver│
//!                  └──────────────┘           └─────────────────┘
//!                                                      │
//!                                                      ▼
//!                                                  Resource
//! ```
//!
//! Everything here works on syntax alone: a function is a resource
//! constructor because its first result is `*schema.Resource` from the
//! schema module, not because anything was type-checked.

mod attributes;
mod classify;
mod error;
mod fields;
mod imports;
pub mod literal;
mod registry;
mod resource;

pub use attributes::{find_schema_field, SchemaResolver};
pub use classify::{classify, DeclClass, DeclRef, DeclarationIndex, ScanMode, SchemaModules};
pub use error::{
    AttrPath, GenerateError, RegistryError, ResolveError, ResolveErrorKind, ResourceError,
};
pub use fields::{bool_field, int_field, key_value, string_field};
pub use imports::ImportMap;
pub use registry::Registry;
pub use resource::{doc_description, ResourceBuilder};
