//! Syntax tree consumed by the schema analysis.
//!
//! The loader in [`crate::parser`] lowers tree-sitter's concrete syntax tree
//! into these types. Only the node kinds the analysis matches on get their own
//! variant; everything else is kept as `Other` so that searches still reach
//! the literals nested inside it.

use std::fmt;
use std::ops::ControlFlow;

/// One parsed Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File path (for diagnostics and deterministic ordering).
    pub path: String,
    /// Package name from the package clause.
    pub package: String,
    /// Import specs in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level function declarations (methods excluded).
    pub funcs: Vec<FuncDecl>,
}

/// A single import spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit import name: an alias, `_` or `.`.
    pub name: Option<String>,
    /// Path literal as written, including its quotes.
    pub path: String,
}

impl ImportSpec {
    pub fn new(name: Option<&str>, path: &str) -> Self {
        Self {
            name: name.map(str::to_string),
            path: path.to_string(),
        }
    }
}

/// A top-level function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: String,
    /// Text of the doc comment group with comment markers removed.
    /// Empty when the function has no doc comment.
    pub doc: String,
    /// Declared result types, in order.
    pub results: Vec<Expr>,
    /// Statements of the body (empty for external functions).
    pub body: Vec<Stmt>,
    /// Line of the `func` keyword (1-indexed).
    pub line: usize,
}

impl FuncDecl {
    /// Root nodes of the body, for use with [`walk`] and [`search`].
    pub fn body_nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.body.iter().map(Node::Stmt)
    }
}

/// Kind of a basic literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    String,
    Int,
    Float,
    Imaginary,
    Char,
}

/// A basic literal; `value` is the source text, quotes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicLit {
    pub kind: LitKind,
    pub value: String,
}

/// A composite (structured) literal such as `schema.Schema{...}` or an
/// elided `{...}` inside a map literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLit {
    /// Literal type; `None` when elided.
    pub ty: Option<Box<Expr>>,
    pub elts: Vec<Expr>,
}

/// A `key: value` element of a composite literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Expr,
    pub value: Expr,
}

/// A call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub args: Vec<Expr>,
}

/// Expression and type nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Identifier, including `true`, `false` and `nil`.
    Ident(String),
    BasicLit(BasicLit),
    /// `x.sel`, which also covers qualified types such as `schema.Schema`.
    Selector { x: Box<Expr>, sel: String },
    /// Pointer type or dereference.
    Star(Box<Expr>),
    Unary { op: String, x: Box<Expr> },
    Composite(CompositeLit),
    KeyValue(Box<KeyValue>),
    Call(CallExpr),
    /// Function literal with its body.
    FuncLit(Vec<Stmt>),
    /// Any other node, identified by its grammar kind.
    Other { kind: String, children: Vec<Expr> },
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    /// A string literal; `raw` must include the quotes.
    pub fn string(raw: &str) -> Self {
        Expr::BasicLit(BasicLit {
            kind: LitKind::String,
            value: raw.to_string(),
        })
    }

    pub fn int(raw: &str) -> Self {
        Expr::BasicLit(BasicLit {
            kind: LitKind::Int,
            value: raw.to_string(),
        })
    }

    /// A qualified reference `pkg.sel`.
    pub fn selector(pkg: &str, sel: &str) -> Self {
        Expr::Selector {
            x: Box::new(Expr::ident(pkg)),
            sel: sel.to_string(),
        }
    }

    pub fn star(x: Expr) -> Self {
        Expr::Star(Box::new(x))
    }

    pub fn key_value(key: Expr, value: Expr) -> Self {
        Expr::KeyValue(Box::new(KeyValue { key, value }))
    }

    pub fn composite(ty: Option<Expr>, elts: Vec<Expr>) -> Self {
        Expr::Composite(CompositeLit {
            ty: ty.map(Box::new),
            elts,
        })
    }

    /// A call to a bare identifier with no arguments.
    pub fn call(fun: &str) -> Self {
        Expr::Call(CallExpr {
            fun: Box::new(Expr::ident(fun)),
            args: Vec::new(),
        })
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeLit> {
        match self {
            Expr::Composite(lit) => Some(lit),
            _ => None,
        }
    }

    /// Human-readable node kind for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Ident(_) => "identifier",
            Expr::BasicLit(lit) => match lit.kind {
                LitKind::String => "string literal",
                LitKind::Int => "integer literal",
                LitKind::Float => "float literal",
                LitKind::Imaginary => "imaginary literal",
                LitKind::Char => "rune literal",
            },
            Expr::Selector { .. } => "selector expression",
            Expr::Star(_) => "pointer expression",
            Expr::Unary { .. } => "unary expression",
            Expr::Composite(_) => "composite literal",
            Expr::KeyValue(_) => "key-value pair",
            Expr::Call(_) => "call expression",
            Expr::FuncLit(_) => "function literal",
            Expr::Other { .. } => "expression",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::BasicLit(lit) => write!(f, "{}", lit.value),
            Expr::Selector { x, sel } => write!(f, "{}.{}", x, sel),
            Expr::Star(x) => write!(f, "*{}", x),
            Expr::Unary { op, x } => write!(f, "{}{}", op, x),
            Expr::Composite(lit) => match &lit.ty {
                Some(ty) => write!(f, "{}{{...}}", ty),
                None => write!(f, "{{...}}"),
            },
            Expr::KeyValue(kv) => write!(f, "{}: {}", kv.key, kv.value),
            Expr::Call(call) => write!(f, "{}(...)", call.fun),
            Expr::FuncLit(_) => write!(f, "func(...) {{...}}"),
            Expr::Other { kind, .. } => write!(f, "<{}>", kind),
        }
    }
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Expr(Expr),
    Return(Vec<Expr>),
    /// `=`, `:=` and `var` declarations with values.
    Assign { lhs: Vec<Expr>, rhs: Vec<Expr> },
    Block(Vec<Stmt>),
    /// Any other statement (if, for, switch, ...), with its nested
    /// expressions and statements in source order.
    Other {
        kind: String,
        exprs: Vec<Expr>,
        stmts: Vec<Stmt>,
    },
}

/// A borrowed tree node, the unit of traversal.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Expr(&'a Expr),
    Stmt(&'a Stmt),
}

/// Preorder traversal. `visit` is called for a node before its children;
/// returning `Break` stops the whole traversal.
pub fn walk<'a, B>(
    node: Node<'a>,
    visit: &mut impl FnMut(Node<'a>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    visit(node)?;
    match node {
        Node::Expr(expr) => match expr {
            Expr::Ident(_) | Expr::BasicLit(_) => {}
            Expr::Selector { x, .. } | Expr::Star(x) | Expr::Unary { x, .. } => {
                walk(Node::Expr(x), visit)?;
            }
            Expr::Composite(lit) => {
                if let Some(ty) = &lit.ty {
                    walk(Node::Expr(ty), visit)?;
                }
                walk_exprs(&lit.elts, visit)?;
            }
            Expr::KeyValue(kv) => {
                walk(Node::Expr(&kv.key), visit)?;
                walk(Node::Expr(&kv.value), visit)?;
            }
            Expr::Call(call) => {
                walk(Node::Expr(&call.fun), visit)?;
                walk_exprs(&call.args, visit)?;
            }
            Expr::FuncLit(body) => walk_stmts(body, visit)?,
            Expr::Other { children, .. } => walk_exprs(children, visit)?,
        },
        Node::Stmt(stmt) => match stmt {
            Stmt::Expr(expr) => walk(Node::Expr(expr), visit)?,
            Stmt::Return(exprs) => walk_exprs(exprs, visit)?,
            Stmt::Assign { lhs, rhs } => {
                walk_exprs(lhs, visit)?;
                walk_exprs(rhs, visit)?;
            }
            Stmt::Block(stmts) => walk_stmts(stmts, visit)?,
            Stmt::Other { exprs, stmts, .. } => {
                walk_exprs(exprs, visit)?;
                walk_stmts(stmts, visit)?;
            }
        },
    }
    ControlFlow::Continue(())
}

fn walk_exprs<'a, B>(
    exprs: &'a [Expr],
    visit: &mut impl FnMut(Node<'a>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    for expr in exprs {
        walk(Node::Expr(expr), visit)?;
    }
    ControlFlow::Continue(())
}

fn walk_stmts<'a, B>(
    stmts: &'a [Stmt],
    visit: &mut impl FnMut(Node<'a>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    for stmt in stmts {
        walk(Node::Stmt(stmt), visit)?;
    }
    ControlFlow::Continue(())
}

/// Depth-first search over several roots, returning the first value `f`
/// produces.
pub fn search<'a, T>(
    roots: impl IntoIterator<Item = Node<'a>>,
    mut f: impl FnMut(Node<'a>) -> Option<T>,
) -> Option<T> {
    for root in roots {
        let flow = walk(root, &mut |node| match f(node) {
            Some(found) => ControlFlow::Break(found),
            None => ControlFlow::Continue(()),
        });
        if let ControlFlow::Break(found) = flow {
            return Some(found);
        }
    }
    None
}
