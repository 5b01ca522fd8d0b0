// quirrel-ast - Expression nodes and node handles
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Expression nodes of the elaborated Quirrel AST.
//!
//! Every node carries the attributes computed by the upstream passes:
//! source location, provenance, and an optional constraining expression.
//! Nodes are held behind [`ExprRef`] handles.
//!
//! # Node identity
//!
//! `ExprRef` compares and hashes by node identity (the address of the
//! shared allocation), not by structure. Two occurrences of `count(foo)`
//! in a query are distinct nodes; a binder back-edge and the node it
//! points at are the same node. The emitter's mark table relies on this.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;

use crate::binding::Binding;
use crate::bucket::Bucket;
use crate::provenance::Provenance;

/// A source position: the 1-indexed line number and the text of that line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loc {
    pub line: u32,
    pub text: String,
}

impl Loc {
    pub fn new(line: u32, text: impl Into<String>) -> Self {
        Loc {
            line,
            text: text.into(),
        }
    }
}

/// Binary operators that appear as AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    Or,
    And,
}

/// Identity of a `let` definition, assigned by the binder.
///
/// References from a definition's own body back to the definition (tic
/// variables, recursive mentions) would be cyclic as node handles; the
/// binder instead hands out these side-table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LetId(pub u32);

impl fmt::Display for LetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "let#{}", self.0)
    }
}

/// A `name := left right` definition.
///
/// `left` is the bound expression (the function body for parameterised
/// lets); `right` is the remainder of the query in which the name is in
/// scope. Only `right` is lowered when the `Let` itself is reached; `left`
/// is lowered lazily at each dispatch site.
#[derive(Debug, Clone)]
pub struct LetDef {
    pub id: LetId,
    pub name: String,
    pub params: Vec<String>,
    pub left: ExprRef,
    pub right: ExprRef,
}

/// An elaborated expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub loc: Loc,
    pub provenance: Provenance,
    /// The expression this node's value is constrained to, if any.
    pub constraining: Option<ExprRef>,
    pub kind: ExprKind,
}

/// The node kinds of the Quirrel expression grammar.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// String literal.
    StrLit(String),
    /// Numeric literal, carried as its uninterpreted source text.
    NumLit(String),
    /// Boolean literal.
    BoolLit(bool),
    /// `new e`, minting a fresh row identity.
    New(ExprRef),
    /// Arithmetic negation.
    Neg(ExprRef),
    /// Boolean complement.
    Comp(ExprRef),
    /// Parenthesised expression, preserved by the parser.
    Paren(ExprRef),
    /// `in from ~ to` provenance relation; only `in` carries a value.
    Relate {
        from: ExprRef,
        to: ExprRef,
        in_: ExprRef,
    },
    /// `name := left right` definition.
    Let(LetDef),
    /// A tic-variable reference, `'name`.
    TicVar { name: String, binding: Binding },
    /// A binary operation.
    Binary {
        op: BinOp,
        left: ExprRef,
        right: ExprRef,
    },
    /// Property descent, `e.property`.
    Descent { child: ExprRef, property: String },
    /// Array dereference, `left[right]`.
    Deref { left: ExprRef, right: ExprRef },
    /// Object merge, `left with right`.
    With { left: ExprRef, right: ExprRef },
    /// Row filter, `left where right`.
    Where { left: ExprRef, right: ExprRef },
    /// Set union.
    Union { left: ExprRef, right: ExprRef },
    /// Set intersection.
    Intersect { left: ExprRef, right: ExprRef },
    /// Object literal.
    ObjectDef(Vec<(String, ExprRef)>),
    /// Array literal.
    ArrayDef(Vec<ExprRef>),
    /// A named application site: built-in, stdlib or user-defined.
    Dispatch {
        name: String,
        actuals: Vec<ExprRef>,
        binding: Binding,
        /// Solver output for grouping dispatches, ordered by tic-var name.
        buckets: Vec<(String, Bucket)>,
    },
}

impl Expr {
    pub fn new(loc: Loc, provenance: Provenance, kind: ExprKind) -> Self {
        Expr {
            loc,
            provenance,
            constraining: None,
            kind,
        }
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::StrLit(_) => "string literal",
            ExprKind::NumLit(_) => "numeric literal",
            ExprKind::BoolLit(_) => "boolean literal",
            ExprKind::New(_) => "new",
            ExprKind::Neg(_) => "negation",
            ExprKind::Comp(_) => "complement",
            ExprKind::Paren(_) => "parenthesised expression",
            ExprKind::Relate { .. } => "relate",
            ExprKind::Let(_) => "let",
            ExprKind::TicVar { .. } => "tic variable",
            ExprKind::Binary { .. } => "binary operation",
            ExprKind::Descent { .. } => "descent",
            ExprKind::Deref { .. } => "dereference",
            ExprKind::With { .. } => "with",
            ExprKind::Where { .. } => "where",
            ExprKind::Union { .. } => "union",
            ExprKind::Intersect { .. } => "intersect",
            ExprKind::ObjectDef(_) => "object literal",
            ExprKind::ArrayDef(_) => "array literal",
            ExprKind::Dispatch { .. } => "dispatch",
        }
    }

    /// The `LetDef` of a `Let` node, if this is one.
    pub fn as_let(&self) -> Option<&LetDef> {
        match &self.kind {
            ExprKind::Let(def) => Some(def),
            _ => None,
        }
    }

    /// Direct subexpressions, in source order.
    pub fn children(&self) -> Vec<ExprRef> {
        match &self.kind {
            ExprKind::StrLit(_) | ExprKind::NumLit(_) | ExprKind::BoolLit(_) => vec![],
            ExprKind::TicVar { .. } => vec![],
            ExprKind::New(child) | ExprKind::Neg(child) | ExprKind::Comp(child) => {
                vec![child.clone()]
            }
            ExprKind::Paren(child) => vec![child.clone()],
            ExprKind::Descent { child, .. } => vec![child.clone()],
            ExprKind::Relate { from, to, in_ } => vec![from.clone(), to.clone(), in_.clone()],
            ExprKind::Let(def) => vec![def.left.clone(), def.right.clone()],
            ExprKind::Binary { left, right, .. }
            | ExprKind::Deref { left, right }
            | ExprKind::With { left, right }
            | ExprKind::Where { left, right }
            | ExprKind::Union { left, right }
            | ExprKind::Intersect { left, right } => vec![left.clone(), right.clone()],
            ExprKind::ObjectDef(fields) => fields.iter().map(|(_, v)| v.clone()).collect(),
            ExprKind::ArrayDef(values) => values.to_vec(),
            ExprKind::Dispatch { actuals, .. } => actuals.to_vec(),
        }
    }

    /// Structural equality over the expression syntax, ignoring source
    /// locations and computed attributes.
    pub fn equals_ignoring_loc(&self, other: &Expr) -> bool {
        use ExprKind::*;
        match (&self.kind, &other.kind) {
            (StrLit(a), StrLit(b)) => a == b,
            (NumLit(a), NumLit(b)) => a == b,
            (BoolLit(a), BoolLit(b)) => a == b,
            (New(a), New(b)) | (Neg(a), Neg(b)) | (Comp(a), Comp(b)) | (Paren(a), Paren(b)) => {
                a.equals_ignoring_loc(b)
            }
            (
                Relate { from, to, in_ },
                Relate {
                    from: f2,
                    to: t2,
                    in_: i2,
                },
            ) => {
                from.equals_ignoring_loc(f2)
                    && to.equals_ignoring_loc(t2)
                    && in_.equals_ignoring_loc(i2)
            }
            (Let(a), Let(b)) => {
                a.name == b.name
                    && a.params == b.params
                    && a.left.equals_ignoring_loc(&b.left)
                    && a.right.equals_ignoring_loc(&b.right)
            }
            (TicVar { name: a, .. }, TicVar { name: b, .. }) => a == b,
            (
                Binary { op, left, right },
                Binary {
                    op: op2,
                    left: l2,
                    right: r2,
                },
            ) => op == op2 && left.equals_ignoring_loc(l2) && right.equals_ignoring_loc(r2),
            (
                Descent { child, property },
                Descent {
                    child: c2,
                    property: p2,
                },
            ) => property == p2 && child.equals_ignoring_loc(c2),
            (Deref { left, right }, Deref { left: l2, right: r2 })
            | (With { left, right }, With { left: l2, right: r2 })
            | (Where { left, right }, Where { left: l2, right: r2 })
            | (Union { left, right }, Union { left: l2, right: r2 })
            | (
                Intersect { left, right },
                Intersect {
                    left: l2,
                    right: r2,
                },
            ) => left.equals_ignoring_loc(l2) && right.equals_ignoring_loc(r2),
            (ObjectDef(a), ObjectDef(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.equals_ignoring_loc(vb))
            }
            (ArrayDef(a), ArrayDef(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(va, vb)| va.equals_ignoring_loc(vb))
            }
            (
                Dispatch { name, actuals, .. },
                Dispatch {
                    name: n2,
                    actuals: a2,
                    ..
                },
            ) => {
                name == n2
                    && actuals.len() == a2.len()
                    && actuals
                        .iter()
                        .zip(a2)
                        .all(|(va, vb)| va.equals_ignoring_loc(vb))
            }
            _ => false,
        }
    }
}

/// A shared, immutable handle to an expression node.
///
/// Cloning is cheap. Equality and hashing are by node identity: a handle
/// equals exactly the handles cloned from the same allocation.
#[derive(Clone)]
pub struct ExprRef(Rc<Expr>);

impl ExprRef {
    pub fn new(expr: Expr) -> Self {
        ExprRef(Rc::new(expr))
    }

    /// Structural comparison, delegating to [`Expr::equals_ignoring_loc`].
    pub fn equals_ignoring_loc(&self, other: &ExprRef) -> bool {
        Expr::equals_ignoring_loc(self, other)
    }
}

impl Deref for ExprRef {
    type Target = Expr;

    fn deref(&self) -> &Expr {
        &self.0
    }
}

impl PartialEq for ExprRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ExprRef {}

impl Hash for ExprRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for ExprRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ line {}", self.kind_name(), self.loc.line)
    }
}

impl From<Expr> for ExprRef {
    fn from(expr: Expr) -> Self {
        ExprRef::new(expr)
    }
}
