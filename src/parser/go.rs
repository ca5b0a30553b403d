//! Go source lowering using tree-sitter.
//!
//! Produces:
//! - Package name
//! - Import specs (with explicit names, including `_` and `.`)
//! - Top-level function declarations with doc comments, result types
//!   and bodies lowered into [`crate::ast`]

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tracing::warn;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::ParsedFile;
use crate::ast::{BasicLit, CallExpr, CompositeLit, Expr, FuncDecl, ImportSpec, KeyValue, LitKind, SourceFile, Stmt};

/// Tree-sitter query for the package clause.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Tree-sitter query for import specs, grouped or not.
const IMPORT_QUERY: &str = r#"
(import_spec
  name: (_)? @alias
  path: (_) @path
) @import
"#;

/// Go source parser.
pub struct GoParser {
    language: Language,
}

impl GoParser {
    /// Create a new Go parser.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Create a new tree-sitter parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Parse a source file into a tree-sitter tree.
    pub fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Go source: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Lower a parsed file into a [`SourceFile`].
    ///
    /// Syntax errors are tolerated: tree-sitter recovers around them and
    /// the rest of the file is still lowered. Go source must be UTF-8, so
    /// any other encoding is rejected.
    pub fn lower(&self, parsed: &ParsedFile) -> anyhow::Result<SourceFile> {
        if let Err(e) = std::str::from_utf8(&parsed.source) {
            anyhow::bail!("{} is not valid UTF-8: {}", parsed.path, e);
        }
        if parsed.tree.root_node().has_error() {
            warn!(file = %parsed.path, "source contains syntax errors");
        }

        let package = self.extract_package(parsed).unwrap_or_default();
        let imports = self.extract_imports(parsed)?;
        let funcs = Lowerer { parsed }.functions(parsed.tree.root_node());

        Ok(SourceFile {
            path: parsed.path.clone(),
            package,
            imports,
            funcs,
        })
    }

    /// Extract the package name from a parsed file.
    fn extract_package(&self, parsed: &ParsedFile) -> Option<String> {
        let query = Query::new(&self.language, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(parsed.node_text(capture.node).to_string());
                }
            }
        }
        None
    }

    /// Extract import specs in source order.
    fn extract_imports(&self, parsed: &ParsedFile) -> anyhow::Result<Vec<ImportSpec>> {
        let query = Query::new(&self.language, IMPORT_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut imports = Vec::new();
        let mut seen_specs = std::collections::HashSet::new();

        while let Some(m) = matches.next() {
            let mut path = None;
            let mut alias = None;
            let mut spec_id = None;

            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                match name {
                    "path" => path = Some(parsed.node_text(capture.node).to_string()),
                    "alias" => alias = Some(parsed.node_text(capture.node).to_string()),
                    "import" => spec_id = Some(capture.node.id()),
                    _ => {}
                }
            }

            if let (Some(path), Some(id)) = (path, spec_id) {
                if seen_specs.insert(id) {
                    imports.push(ImportSpec { name: alias, path });
                }
            }
        }

        Ok(imports)
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Named children, comments excluded.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    children
}

/// Whether a grammar kind lowers to a statement.
fn is_statement_kind(kind: &str) -> bool {
    kind.ends_with("_statement")
        || kind.ends_with("_declaration")
        || kind.ends_with("_case")
        || kind.ends_with("_clause")
        || kind.ends_with("_spec")
        || matches!(kind, "block" | "statement_list" | "var_spec_list" | "import_spec_list")
}

/// Converts tree-sitter nodes of one file into AST nodes.
struct Lowerer<'p> {
    parsed: &'p ParsedFile,
}

impl Lowerer<'_> {
    fn text(&self, node: Node<'_>) -> String {
        self.parsed.node_text(node).to_string()
    }

    /// Top-level functions with their doc comment groups.
    fn functions(&self, root: Node<'_>) -> Vec<FuncDecl> {
        let mut funcs = Vec::new();
        let mut group: Vec<Node<'_>> = Vec::new();
        let mut last_code_row: Option<usize> = None;

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    let row = child.start_position().row;
                    let trailing = last_code_row == Some(row);
                    let adjacent = group
                        .last()
                        .map_or(false, |prev| prev.end_position().row + 1 >= row);
                    if trailing {
                        group.clear();
                    } else if adjacent {
                        group.push(child);
                    } else {
                        group = vec![child];
                    }
                }
                "function_declaration" => {
                    let attached = group
                        .last()
                        .map_or(false, |c| c.end_position().row + 1 == child.start_position().row);
                    let doc = if attached {
                        let texts: Vec<&str> =
                            group.iter().map(|c| self.parsed.node_text(*c)).collect();
                        doc_text(&texts)
                    } else {
                        String::new()
                    };
                    funcs.push(self.function(child, doc));
                    group.clear();
                    last_code_row = Some(child.end_position().row);
                }
                _ => {
                    group.clear();
                    last_code_row = Some(child.end_position().row);
                }
            }
        }

        funcs
    }

    fn function(&self, node: Node<'_>, doc: String) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();

        let results = match node.child_by_field_name("result") {
            None => Vec::new(),
            Some(result) if result.kind() == "parameter_list" => named_children(result)
                .into_iter()
                .filter_map(|param| param.child_by_field_name("type"))
                .map(|ty| self.expr(ty))
                .collect(),
            Some(result) => vec![self.expr(result)],
        };

        let body = node
            .child_by_field_name("body")
            .map(|b| self.block(b))
            .unwrap_or_default();

        FuncDecl {
            name,
            doc,
            results,
            body,
            line: node.start_position().row + 1,
        }
    }

    /// Statements of a block, flattening the grammar's statement list.
    fn block(&self, node: Node<'_>) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for child in named_children(node) {
            if child.kind() == "statement_list" {
                stmts.extend(named_children(child).into_iter().map(|s| self.stmt(s)));
            } else {
                stmts.push(self.stmt(child));
            }
        }
        stmts
    }

    fn stmt(&self, node: Node<'_>) -> Stmt {
        match node.kind() {
            "expression_statement" => match named_children(node).first() {
                Some(expr) => Stmt::Expr(self.expr(*expr)),
                None => Stmt::Block(Vec::new()),
            },
            "return_statement" => Stmt::Return(
                named_children(node)
                    .into_iter()
                    .flat_map(|n| self.expr_list(n))
                    .collect(),
            ),
            "short_var_declaration" | "assignment_statement" => Stmt::Assign {
                lhs: self.field_list(node, "left"),
                rhs: self.field_list(node, "right"),
            },
            "var_spec" => {
                let mut lhs = Vec::new();
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    lhs.push(self.expr(name));
                }
                Stmt::Assign {
                    lhs,
                    rhs: self.field_list(node, "value"),
                }
            }
            "var_declaration" | "var_spec_list" => Stmt::Block(
                named_children(node).into_iter().map(|s| self.stmt(s)).collect(),
            ),
            "block" | "statement_list" => Stmt::Block(self.block(node)),
            kind => {
                let mut exprs = Vec::new();
                let mut stmts = Vec::new();
                for child in named_children(node) {
                    if is_statement_kind(child.kind()) {
                        stmts.push(self.stmt(child));
                    } else {
                        exprs.push(self.expr(child));
                    }
                }
                Stmt::Other {
                    kind: kind.to_string(),
                    exprs,
                    stmts,
                }
            }
        }
    }

    fn field_list(&self, node: Node<'_>, field: &str) -> Vec<Expr> {
        node.child_by_field_name(field)
            .map(|n| self.expr_list(n))
            .unwrap_or_default()
    }

    fn expr_list(&self, node: Node<'_>) -> Vec<Expr> {
        if node.kind() == "expression_list" {
            named_children(node).into_iter().map(|e| self.expr(e)).collect()
        } else {
            vec![self.expr(node)]
        }
    }

    fn basic(&self, node: Node<'_>, kind: LitKind) -> Expr {
        Expr::BasicLit(BasicLit {
            kind,
            value: self.text(node),
        })
    }

    fn expr(&self, node: Node<'_>) -> Expr {
        match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier"
            | "blank_identifier" | "true" | "false" | "nil" | "iota" => {
                Expr::Ident(self.text(node))
            }
            "interpreted_string_literal" | "raw_string_literal" => {
                self.basic(node, LitKind::String)
            }
            "int_literal" => self.basic(node, LitKind::Int),
            "float_literal" => self.basic(node, LitKind::Float),
            "imaginary_literal" => self.basic(node, LitKind::Imaginary),
            "rune_literal" => self.basic(node, LitKind::Char),
            "selector_expression" => Expr::Selector {
                x: Box::new(self.child_expr(node, "operand")),
                sel: node
                    .child_by_field_name("field")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
            },
            "qualified_type" => Expr::Selector {
                x: Box::new(self.child_expr(node, "package")),
                sel: node
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
            },
            "pointer_type" => Expr::Star(Box::new(self.first_named(node))),
            "unary_expression" => Expr::Unary {
                op: node
                    .child_by_field_name("operator")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
                x: Box::new(self.child_expr(node, "operand")),
            },
            "parenthesized_expression" | "literal_element" => self.first_named(node),
            "composite_literal" => Expr::Composite(CompositeLit {
                ty: node.child_by_field_name("type").map(|t| Box::new(self.expr(t))),
                elts: node
                    .child_by_field_name("body")
                    .map(|b| self.elements(b))
                    .unwrap_or_default(),
            }),
            "literal_value" => Expr::Composite(CompositeLit {
                ty: None,
                elts: self.elements(node),
            }),
            "keyed_element" => {
                let parts = named_children(node);
                match (parts.first(), parts.get(1)) {
                    (Some(key), Some(value)) => Expr::KeyValue(Box::new(KeyValue {
                        key: self.expr(*key),
                        value: self.expr(*value),
                    })),
                    _ => self.other(node),
                }
            }
            "call_expression" => Expr::Call(CallExpr {
                fun: Box::new(self.child_expr(node, "function")),
                args: node
                    .child_by_field_name("arguments")
                    .map(|a| named_children(a).into_iter().map(|e| self.expr(e)).collect())
                    .unwrap_or_default(),
            }),
            "func_literal" => Expr::FuncLit(
                node.child_by_field_name("body")
                    .map(|b| self.block(b))
                    .unwrap_or_default(),
            ),
            _ => self.other(node),
        }
    }

    fn other(&self, node: Node<'_>) -> Expr {
        Expr::Other {
            kind: node.kind().to_string(),
            children: named_children(node).into_iter().map(|c| self.expr(c)).collect(),
        }
    }

    fn elements(&self, literal_value: Node<'_>) -> Vec<Expr> {
        named_children(literal_value)
            .into_iter()
            .map(|e| self.expr(e))
            .collect()
    }

    fn child_expr(&self, node: Node<'_>, field: &str) -> Expr {
        match node.child_by_field_name(field) {
            Some(child) => self.expr(child),
            None => self.other(node),
        }
    }

    fn first_named(&self, node: Node<'_>) -> Expr {
        match named_children(node).first() {
            Some(child) => self.expr(*child),
            None => self.other(node),
        }
    }
}

/// Text of a comment group, following Go's doc comment rules: comment
/// markers and the first space of line comments are removed, directives
/// are dropped, blank line runs collapse to one and leading and trailing
/// blank lines are removed. Non-empty results end with a newline.
pub fn doc_text(comments: &[&str]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for comment in comments {
        if let Some(rest) = comment.strip_prefix("//") {
            if is_directive(rest) {
                continue;
            }
            lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        } else if let Some(body) = comment.strip_prefix("/*") {
            let body = body.strip_suffix("*/").unwrap_or(body);
            lines.extend(body.split('\n'));
        }
    }

    let mut out: Vec<&str> = Vec::new();
    for line in lines {
        let line = line.trim_end();
        if line.is_empty() && out.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        out.push(line);
    }
    while out.last().map_or(false, |l| l.is_empty()) {
        out.pop();
    }

    if out.is_empty() {
        return String::new();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// `//go:generate`, `//line file:1`, `//export Name` and friends.
fn is_directive(rest: &str) -> bool {
    if ["line ", "extern ", "export "].iter().any(|p| rest.starts_with(p)) {
        return true;
    }
    match rest.split_once(':') {
        Some((tool, tail)) => {
            !tool.is_empty()
                && tool.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                && tail.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        }
        None => false,
    }
}
