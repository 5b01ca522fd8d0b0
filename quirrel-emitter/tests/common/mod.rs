// quirrel-emitter - Shared test helpers
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Test helpers: AST builders standing in for the upstream passes, and a
//! symbolic evaluator that runs emitted bytecode against an abstract
//! stack.
//!
//! The builders produce the elaborated nodes the real parser/binder/
//! checker pipeline would: every node carries a location and provenance,
//! dispatches carry bindings, and references to a user-defined function
//! name its `Let` through the binder-assigned side-table id.

#![allow(dead_code)]

use quirrel_ast::{
    BinOp, Binding, Bucket, Expr, ExprKind, ExprRef, LetDef, LetId, Loc, Op1, Op2, Provenance,
    Solution,
};
use quirrel_emitter::Instruction;

// =============================================================================
// Locations and provenance
// =============================================================================

pub fn loc(line: u32, text: &str) -> Loc {
    Loc::new(line, text)
}

pub fn static_prov(path: &str) -> Provenance {
    Provenance::Static(path.to_string())
}

// =============================================================================
// Node builders
// =============================================================================

pub fn node(loc: Loc, provenance: Provenance, kind: ExprKind) -> ExprRef {
    Expr::new(loc, provenance, kind).into()
}

pub fn num(loc: Loc, value: &str) -> ExprRef {
    node(loc, Provenance::Value, ExprKind::NumLit(value.to_string()))
}

pub fn str_lit(loc: Loc, value: &str) -> ExprRef {
    node(loc, Provenance::Value, ExprKind::StrLit(value.to_string()))
}

pub fn bool_lit(loc: Loc, value: bool) -> ExprRef {
    node(loc, Provenance::Value, ExprKind::BoolLit(value))
}

pub fn binary(loc: Loc, prov: Provenance, op: BinOp, left: ExprRef, right: ExprRef) -> ExprRef {
    node(loc, prov, ExprKind::Binary { op, left, right })
}

/// `left + right` with the provenance the checker would assign: the
/// non-value side, or value when both sides are values.
pub fn add(loc: Loc, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = combine_prov(&left.provenance, &right.provenance);
    binary(loc, prov, BinOp::Add, left, right)
}

pub fn combine_prov(left: &Provenance, right: &Provenance) -> Provenance {
    match (left, right) {
        (Provenance::Value, other) | (other, Provenance::Value) => other.clone(),
        (l, r) if l == r => l.clone(),
        (l, r) => Provenance::Union(Box::new(l.clone()), Box::new(r.clone())),
    }
}

pub fn new_(loc: Loc, id: u64, child: ExprRef) -> ExprRef {
    node(loc, Provenance::Dynamic(id), ExprKind::New(child))
}

pub fn neg(loc: Loc, child: ExprRef) -> ExprRef {
    let prov = child.provenance.clone();
    node(loc, prov, ExprKind::Neg(child))
}

pub fn comp(loc: Loc, child: ExprRef) -> ExprRef {
    let prov = child.provenance.clone();
    node(loc, prov, ExprKind::Comp(child))
}

pub fn paren(loc: Loc, child: ExprRef) -> ExprRef {
    let prov = child.provenance.clone();
    node(loc, prov, ExprKind::Paren(child))
}

pub fn relate(loc: Loc, from: ExprRef, to: ExprRef, in_: ExprRef) -> ExprRef {
    let prov = in_.provenance.clone();
    node(loc, prov, ExprKind::Relate { from, to, in_ })
}

pub fn descent(loc: Loc, child: ExprRef, property: &str) -> ExprRef {
    let prov = child.provenance.clone();
    node(
        loc,
        prov,
        ExprKind::Descent {
            child,
            property: property.to_string(),
        },
    )
}

pub fn deref(loc: Loc, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = combine_prov(&left.provenance, &right.provenance);
    node(loc, prov, ExprKind::Deref { left, right })
}

pub fn with_(loc: Loc, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = combine_prov(&left.provenance, &right.provenance);
    node(loc, prov, ExprKind::With { left, right })
}

pub fn where_(loc: Loc, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = left.provenance.clone();
    node(loc, prov, ExprKind::Where { left, right })
}

pub fn union_(loc: Loc, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = Provenance::Union(
        Box::new(left.provenance.clone()),
        Box::new(right.provenance.clone()),
    );
    node(loc, prov, ExprKind::Union { left, right })
}

pub fn intersect_(loc: Loc, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = left.provenance.clone();
    node(loc, prov, ExprKind::Intersect { left, right })
}

pub fn object(loc: Loc, prov: Provenance, fields: Vec<(&str, ExprRef)>) -> ExprRef {
    node(
        loc,
        prov,
        ExprKind::ObjectDef(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ),
    )
}

pub fn array(loc: Loc, prov: Provenance, values: Vec<ExprRef>) -> ExprRef {
    node(loc, prov, ExprKind::ArrayDef(values))
}

// =============================================================================
// Dispatch builders
// =============================================================================

/// `//path`: a `load` dispatch over the path literal.
pub fn load(loc: Loc, path: &str) -> ExprRef {
    let actual = str_lit(loc.clone(), path);
    node(
        loc,
        static_prov(path),
        ExprKind::Dispatch {
            name: "load".to_string(),
            actuals: vec![actual],
            binding: Binding::BuiltIn {
                name: "load".to_string(),
                arity: 1,
                reduction: false,
            },
            buckets: vec![],
        },
    )
}

/// A reduction built-in such as `count(actual)`.
pub fn reduce(loc: Loc, name: &str, actual: ExprRef) -> ExprRef {
    node(
        loc,
        Provenance::Value,
        ExprKind::Dispatch {
            name: name.to_string(),
            actuals: vec![actual],
            binding: Binding::BuiltIn {
                name: name.to_string(),
                arity: 1,
                reduction: true,
            },
            buckets: vec![],
        },
    )
}

pub fn stdlib1(loc: Loc, name: &str, actual: ExprRef) -> ExprRef {
    let prov = actual.provenance.clone();
    node(
        loc,
        prov,
        ExprKind::Dispatch {
            name: name.to_string(),
            actuals: vec![actual],
            binding: Binding::StdlibBuiltIn1(Op1::new(name)),
            buckets: vec![],
        },
    )
}

pub fn stdlib2(loc: Loc, name: &str, left: ExprRef, right: ExprRef) -> ExprRef {
    let prov = combine_prov(&left.provenance, &right.provenance);
    node(
        loc,
        prov,
        ExprKind::Dispatch {
            name: name.to_string(),
            actuals: vec![left, right],
            binding: Binding::StdlibBuiltIn2(Op2::new(name)),
            buckets: vec![],
        },
    )
}

/// The `Let` node for `name := left right`, with the binder-assigned id.
///
/// References to the definition (built before this node) use the same id.
pub fn let_def(
    loc: Loc,
    id: u32,
    name: &str,
    params: &[&str],
    left: ExprRef,
    right: ExprRef,
) -> ExprRef {
    let prov = right.provenance.clone();
    node(
        loc,
        prov,
        ExprKind::Let(LetDef {
            id: LetId(id),
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            left,
            right,
        }),
    )
}

/// A dispatch resolving to the user-defined `let` with side-table id `id`.
pub fn dispatch_let(
    loc: Loc,
    prov: Provenance,
    id: u32,
    name: &str,
    actuals: Vec<ExprRef>,
) -> ExprRef {
    node(
        loc,
        prov,
        ExprKind::Dispatch {
            name: name.to_string(),
            actuals,
            binding: Binding::UserDef(LetId(id)),
            buckets: vec![],
        },
    )
}

/// A grouping dispatch: no actuals, one bucket per solved tic var.
pub fn dispatch_solve(
    loc: Loc,
    prov: Provenance,
    id: u32,
    name: &str,
    buckets: Vec<(&str, Bucket)>,
) -> ExprRef {
    node(
        loc,
        prov,
        ExprKind::Dispatch {
            name: name.to_string(),
            actuals: vec![],
            binding: Binding::UserDef(LetId(id)),
            buckets: buckets
                .into_iter()
                .map(|(n, b)| (n.to_string(), b))
                .collect(),
        },
    )
}

pub fn ticvar(loc: Loc, prov: Provenance, id: u32, name: &str) -> ExprRef {
    node(
        loc,
        prov,
        ExprKind::TicVar {
            name: name.to_string(),
            binding: Binding::UserDef(LetId(id)),
        },
    )
}

/// Rebuild `expr` with a constraining expression attached.
pub fn with_constraint(expr: &ExprRef, constraint: &ExprRef) -> ExprRef {
    let mut e = (**expr).clone();
    e.constraining = Some(constraint.clone());
    e.into()
}

pub fn group(origin: &ExprRef, target: &ExprRef, forest: Solution) -> Bucket {
    Bucket::Group {
        origin: origin.clone(),
        target: target.clone(),
        forest,
        extras: vec![],
    }
}

pub fn definition(expr: &ExprRef) -> Solution {
    Solution::Definition(expr.clone())
}

// =============================================================================
// Symbolic evaluation
// =============================================================================

/// A value on the abstract stack: enough structure to tell which
/// computation produced it, with dup copies comparing equal to their
/// original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sym {
    Str(String),
    Num(String),
    Bool(bool),
    Unary(String, Box<Sym>),
    /// form ("cross" / "match"), operator, left, right.
    Binary(String, String, Box<Sym>, Box<Sym>),
    Filter(String, Box<Sym>, Box<Sym>),
    Reduce(String, Box<Sym>),
    Load(Box<Sym>),
    SetOp(String, Box<Sym>, Box<Sym>),
    Zip(bool, Box<Sym>, Box<Sym>),
    /// A value introduced by `Split`: (frame serial, push position).
    FrameVal(usize, usize),
    Merge(Box<Sym>),
}

/// Run `code` against an abstract stack and return the single final
/// value.
///
/// Panics if any instruction underflows the stack, if a `Merge` has no
/// open frame, or if the final stack holds anything but one value, so a
/// successful run checks the depth invariants independently of the
/// emitter's own bookkeeping.
pub fn sym_eval(code: &[Instruction]) -> Sym {
    let mut stack: Vec<Sym> = Vec::new();
    let mut frames: Vec<usize> = Vec::new();
    let mut splits = 0usize;

    let pop = |stack: &mut Vec<Sym>| stack.pop().expect("symbolic stack underflow");

    for instr in code {
        match instr {
            Instruction::PushString(s) => stack.push(Sym::Str(s.clone())),
            Instruction::PushNum(s) => stack.push(Sym::Num(s.clone())),
            Instruction::PushTrue => stack.push(Sym::Bool(true)),
            Instruction::PushFalse => stack.push(Sym::Bool(false)),
            Instruction::Dup => {
                let top = stack.last().expect("dup on empty stack").clone();
                stack.push(top);
            }
            Instruction::Swap(n) => {
                let len = stack.len();
                assert!(*n < len, "swap {} beyond stack depth {}", n, len);
                stack.swap(len - 1, len - 1 - n);
            }
            Instruction::Line(..) => {}
            Instruction::Map1(op) => {
                let value = pop(&mut stack);
                stack.push(Sym::Unary(op.to_string(), Box::new(value)));
            }
            Instruction::Map2Cross(op) => {
                let right = pop(&mut stack);
                let left = pop(&mut stack);
                stack.push(Sym::Binary(
                    "cross".to_string(),
                    op.to_string(),
                    Box::new(left),
                    Box::new(right),
                ));
            }
            Instruction::Map2Match(op) => {
                let right = pop(&mut stack);
                let left = pop(&mut stack);
                stack.push(Sym::Binary(
                    "match".to_string(),
                    op.to_string(),
                    Box::new(left),
                    Box::new(right),
                ));
            }
            Instruction::FilterCross { depth, .. } | Instruction::FilterMatch { depth, .. } => {
                assert_eq!(*depth, 0, "emitter only issues depth-0 filters");
                let form = if matches!(instr, Instruction::FilterCross { .. }) {
                    "cross"
                } else {
                    "match"
                };
                let pred = pop(&mut stack);
                let target = pop(&mut stack);
                stack.push(Sym::Filter(
                    form.to_string(),
                    Box::new(target),
                    Box::new(pred),
                ));
            }
            Instruction::Reduce(r) => {
                let value = pop(&mut stack);
                stack.push(Sym::Reduce(r.to_string(), Box::new(value)));
            }
            Instruction::SetReduce(r) => {
                let value = pop(&mut stack);
                stack.push(Sym::Reduce(r.to_string(), Box::new(value)));
            }
            Instruction::LoadLocal(_) => {
                let path = pop(&mut stack);
                stack.push(Sym::Load(Box::new(path)));
            }
            Instruction::IUnion | Instruction::IIntersect => {
                let right = pop(&mut stack);
                let left = pop(&mut stack);
                let name = if matches!(instr, Instruction::IUnion) {
                    "iunion"
                } else {
                    "iintersect"
                };
                stack.push(Sym::SetOp(
                    name.to_string(),
                    Box::new(left),
                    Box::new(right),
                ));
            }
            Instruction::ZipBuckets { disjoint } => {
                let right = pop(&mut stack);
                let left = pop(&mut stack);
                stack.push(Sym::Zip(*disjoint, Box::new(left), Box::new(right)));
            }
            Instruction::Split { n, k } => {
                assert!(stack.len() >= *n, "split underflow");
                for _ in 0..*n {
                    stack.pop();
                }
                for pos in 0..*k {
                    stack.push(Sym::FrameVal(splits, pos));
                }
                frames.push(*k);
                splits += 1;
            }
            Instruction::Merge => {
                let body = pop(&mut stack);
                let k = frames.pop().expect("merge without an open split frame");
                assert!(stack.len() >= k, "merge reclaims more than the stack holds");
                for _ in 0..k {
                    stack.pop();
                }
                stack.push(Sym::Merge(Box::new(body)));
            }
        }
    }

    assert!(frames.is_empty(), "unclosed split frame");
    assert_eq!(stack.len(), 1, "final stack must hold exactly one value");
    stack.pop().expect("final value")
}

/// Count instructions satisfying `pred`.
pub fn count_instrs(code: &[Instruction], pred: impl Fn(&Instruction) -> bool) -> usize {
    code.iter().filter(|i| pred(i)).count()
}

/// The non-`Line` instructions of `code`, for expectations that ignore
/// source markers.
pub fn without_lines(code: &[Instruction]) -> Vec<Instruction> {
    code.iter().filter(|i| !i.is_line()).cloned().collect()
}
