//! Scalar field lookup in composite literals.
//!
//! A field is found by key (identifier or quoted string); an absent field
//! yields the type's default. A present field with the wrong shape is an
//! error, never a default.

use super::error::ResolveErrorKind;
use super::literal::{parse_int, unquote};
use crate::ast::{BasicLit, CompositeLit, Expr, LitKind};

/// Value of the first element keyed `name`, if any.
pub fn key_value<'a>(lit: &'a CompositeLit, name: &str) -> Result<Option<&'a Expr>, ResolveErrorKind> {
    for elt in &lit.elts {
        let kv = match elt {
            Expr::KeyValue(kv) => kv,
            other => return Err(ResolveErrorKind::shape("key-value pair", other)),
        };

        let matches = match &kv.key {
            Expr::Ident(key) => key == name,
            Expr::BasicLit(BasicLit {
                kind: LitKind::String,
                value,
            }) => unquote(value)? == name,
            other => return Err(ResolveErrorKind::shape("identifier or string key", other)),
        };

        if matches {
            return Ok(Some(&kv.value));
        }
    }

    Ok(None)
}

/// String field; `""` when absent.
pub fn string_field(lit: &CompositeLit, name: &str) -> Result<String, ResolveErrorKind> {
    match key_value(lit, name)? {
        None => Ok(String::new()),
        Some(Expr::BasicLit(BasicLit {
            kind: LitKind::String,
            value,
        })) => Ok(unquote(value)?),
        Some(other) => Err(ResolveErrorKind::shape("string literal", other)),
    }
}

/// Boolean field; `false` when absent.
pub fn bool_field(lit: &CompositeLit, name: &str) -> Result<bool, ResolveErrorKind> {
    match key_value(lit, name)? {
        None => Ok(false),
        Some(Expr::Ident(value)) if value == "true" => Ok(true),
        Some(Expr::Ident(value)) if value == "false" => Ok(false),
        Some(other) => Err(ResolveErrorKind::shape("boolean literal", other)),
    }
}

/// Integer field; `0` when absent.
pub fn int_field(lit: &CompositeLit, name: &str) -> Result<i64, ResolveErrorKind> {
    match key_value(lit, name)? {
        None => Ok(0),
        Some(Expr::BasicLit(BasicLit {
            kind: LitKind::Int,
            value,
        })) => Ok(parse_int(value)?),
        Some(other) => Err(ResolveErrorKind::shape("integer literal", other)),
    }
}
