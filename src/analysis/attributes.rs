//! Recursive resolution of schema literals into attribute trees.
//!
//! A schema literal maps field names to field schemas. A field schema is
//! either written inline (`"name": {Type: ..., Required: true}`) or produced
//! by a call to a schema-builder function (`"tags": tagsSchema()`), in which
//! case the builder's body is searched for the `schema.Schema` literal it
//! returns. Nested `Schema` keys inside a field schema (e.g. an `Elem`
//! resource) become child attributes.

use tracing::trace;

use super::classify::{DeclRef, DeclarationIndex, SchemaModules};
use super::error::{AttrPath, ResolveError, ResolveErrorKind};
use super::fields::{bool_field, int_field, string_field};
use super::literal::unquote;
use crate::ast::{self, BasicLit, CompositeLit, Expr, LitKind, Node};
use crate::model::{sort_attributes, Attribute};

/// Find the first `Schema: {...}` element under `roots`.
///
/// Returns `Ok(None)` when there is none; a `Schema` key whose value is
/// not a composite literal is an error.
pub fn find_schema_field<'a>(
    roots: impl IntoIterator<Item = Node<'a>>,
) -> Result<Option<&'a CompositeLit>, ResolveErrorKind> {
    let found = ast::search(roots, |node| match node {
        Node::Expr(Expr::KeyValue(kv)) if kv.key.as_ident() == Some("Schema") => {
            Some(match &kv.value {
                Expr::Composite(lit) => Ok(lit),
                other => Err(ResolveErrorKind::shape("composite literal", other)),
            })
        }
        _ => None,
    });
    found.transpose()
}

/// Resolves schema literals against a declaration index.
///
/// Holds the chain of schema-builder functions currently being expanded so
/// that self-referencing builders fail instead of recursing forever.
pub struct SchemaResolver<'a> {
    index: &'a DeclarationIndex,
    modules: &'a SchemaModules,
    in_progress: Vec<String>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(index: &'a DeclarationIndex, modules: &'a SchemaModules) -> Self {
        Self {
            index,
            modules,
            in_progress: Vec::new(),
        }
    }

    /// Resolve every field of `schema` into an attribute, sorted by name.
    ///
    /// All fields are attempted; failures from every field are returned
    /// together.
    pub fn resolve_attributes(
        &mut self,
        schema: &CompositeLit,
        ctx: &DeclRef,
        path: &AttrPath,
    ) -> Result<Vec<Attribute>, Vec<ResolveError>> {
        trace!(
            function = %ctx.name(),
            file = %ctx.file,
            attribute = %path,
            fields = schema.elts.len(),
            "resolving schema literal"
        );

        let mut attributes = Vec::with_capacity(schema.elts.len());
        let mut errors = Vec::new();

        for elt in &schema.elts {
            match self.resolve_element(elt, ctx, path) {
                Ok(attribute) => attributes.push(attribute),
                Err(mut errs) => errors.append(&mut errs),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        sort_attributes(&mut attributes);
        Ok(attributes)
    }

    fn resolve_element(
        &mut self,
        elt: &Expr,
        ctx: &DeclRef,
        path: &AttrPath,
    ) -> Result<Attribute, Vec<ResolveError>> {
        let kv = match elt {
            Expr::KeyValue(kv) => kv,
            other => {
                return Err(vec![ResolveErrorKind::shape("key-value pair", other).at(path)]);
            }
        };

        let name = match &kv.key {
            Expr::BasicLit(BasicLit {
                kind: LitKind::String,
                value,
            }) => unquote(value).map_err(|e| vec![ResolveErrorKind::from(e).at(path)])?,
            other => {
                return Err(vec![ResolveErrorKind::shape("string key", other).at(path)]);
            }
        };
        let child_path = path.child(&name);

        match &kv.value {
            Expr::Composite(field_schema) => {
                self.build_attribute(&name, field_schema, ctx, &child_path)
            }
            Expr::Call(call) => match call.fun.as_ref() {
                Expr::Ident(builder) => self.resolve_builder(&name, builder, &child_path),
                other => Err(vec![
                    ResolveErrorKind::shape("call to a schema function", other).at(&child_path)
                ]),
            },
            other => Err(vec![
                ResolveErrorKind::shape("composite literal or call", other).at(&child_path)
            ]),
        }
    }

    /// Resolve a field whose schema comes from a schema-builder call.
    fn resolve_builder(
        &mut self,
        name: &str,
        builder: &str,
        path: &AttrPath,
    ) -> Result<Attribute, Vec<ResolveError>> {
        let index = self.index;
        let callee = index.schema(builder).ok_or_else(|| {
            vec![ResolveErrorKind::UnresolvedSchemaReference(builder.to_string()).at(path)]
        })?;

        if self.in_progress.iter().any(|b| b == builder) {
            return Err(vec![
                ResolveErrorKind::CyclicSchemaReference(builder.to_string()).at(path)
            ]);
        }

        let field_schema = self.builder_literal(callee).ok_or_else(|| {
            vec![ResolveErrorKind::SchemaLiteralNotFound(builder.to_string()).at(path)]
        })?;

        trace!(attribute = %path, builder, file = %callee.file, "expanding schema builder");

        self.in_progress.push(builder.to_string());
        let result = self.build_attribute(name, field_schema, callee, path);
        self.in_progress.pop();
        result
    }

    /// The first `schema.Schema{...}` literal in a builder's body, matched
    /// through the builder's own imports.
    fn builder_literal<'d>(&self, callee: &'d DeclRef) -> Option<&'d CompositeLit> {
        let module = self.modules.schema.as_str();
        ast::search(callee.func.body_nodes(), |node| match node {
            Node::Expr(Expr::Composite(lit)) => match &lit.ty {
                Some(ty) if callee.imports.is_qualified(ty, module, "Schema") => Some(lit),
                _ => None,
            },
            _ => None,
        })
    }

    /// Build one attribute from a field schema literal.
    pub fn build_attribute(
        &mut self,
        name: &str,
        field_schema: &CompositeLit,
        ctx: &DeclRef,
        path: &AttrPath,
    ) -> Result<Attribute, Vec<ResolveError>> {
        let mut errors = Vec::new();
        let mut collect = |kind: ResolveErrorKind| errors.push(kind.at(path));

        let description = string_field(field_schema, "Description")
            .map(|d| d.trim().to_string())
            .unwrap_or_else(|e| {
                collect(e);
                String::new()
            });
        let mut flag = |field: &str| {
            bool_field(field_schema, field).unwrap_or_else(|e| {
                collect(e);
                false
            })
        };
        let required = flag("Required");
        let optional = flag("Optional");
        let computed = flag("Computed");
        let mut bound = |field: &str| {
            int_field(field_schema, field).unwrap_or_else(|e| {
                collect(e);
                0
            })
        };
        let min = bound("MinItems");
        let max = bound("MaxItems");

        let attributes = match find_schema_field(field_schema.elts.iter().map(Node::Expr)) {
            Ok(Some(nested)) => match self.resolve_attributes(nested, ctx, path) {
                Ok(children) => children,
                Err(mut errs) => {
                    errors.append(&mut errs);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(kind) => {
                errors.push(kind.at(path));
                Vec::new()
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Attribute {
            name: name.to_string(),
            description,
            required,
            optional,
            computed,
            attributes,
            min,
            max,
        })
    }
}
