// quirrel-ast - Solver output for grouping constructs
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Bucket and solution trees produced by the grouping solver.
//!
//! A grouping dispatch carries one [`Bucket`] per solved tic variable.
//! Each bucket describes how rows are grouped: a leaf [`Bucket::Group`]
//! names the `where` clause the group originates from and the solved
//! [`Solution`] forest defining its key set; unions and intersections
//! combine subgroups.

use crate::ast::ExprRef;

/// How rows are grouped for one solved tic variable.
#[derive(Debug, Clone)]
pub enum Bucket {
    /// Rows grouped by either branch.
    Union(Box<Bucket>, Box<Bucket>),
    /// Rows grouped by both branches.
    Intersect(Box<Bucket>, Box<Bucket>),
    /// A leaf group.
    Group {
        /// The `Where` node this group originates from.
        origin: ExprRef,
        /// The grouped row set.
        target: ExprRef,
        /// The solved condition forest defining the group keys.
        forest: Solution,
        /// Filter predicates associated with the group beyond its
        /// defining condition, carried for later reference.
        extras: Vec<ExprRef>,
    },
}

impl Bucket {
    /// The origins of every `Group` leaf under this bucket, in pre-order
    /// (left before right), first occurrence only.
    pub fn origins(&self) -> Vec<ExprRef> {
        let mut out = Vec::new();
        self.collect_origins(&mut out);
        out
    }

    fn collect_origins(&self, out: &mut Vec<ExprRef>) {
        match self {
            Bucket::Union(left, right) | Bucket::Intersect(left, right) => {
                left.collect_origins(out);
                right.collect_origins(out);
            }
            Bucket::Group { origin, .. } => {
                if !out.contains(origin) {
                    out.push(origin.clone());
                }
            }
        }
    }
}

/// The solved condition forest attached to a group.
#[derive(Debug, Clone)]
pub enum Solution {
    /// Both conditions hold.
    Conjunction(Box<Solution>, Box<Solution>),
    /// Either condition holds.
    Disjunction(Box<Solution>, Box<Solution>),
    /// A leaf: the expression whose value set defines the group keys.
    Definition(ExprRef),
}
