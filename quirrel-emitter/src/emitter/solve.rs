// quirrel-emitter - Grouping dispatch lowering
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Lowering of grouping dispatches into `Split`/`Merge` frames.
//!
//! A grouping dispatch carries one bucket per solved tic variable. The
//! buckets are lowered first, then `Split(n, k)` trades the `n` bucket
//! values for `k` positional frame values: each bucket contributes its
//! tic-var key set followed by one row set per group origin. The frame
//! layout, top to bottom, is
//!
//! ```text
//! group[n][last] .. group[n][first]  ticvar[n]
//!   ...
//! group[1][last] .. group[1][first]  ticvar[1]
//! ```
//!
//! so the first bucket's tic var sits deepest. Marks for the frame values
//! record their depth below the top at the post-`Split` position; the body
//! then reuses them through the ordinary dup engine, and `Merge` closes
//! the frame.

use std::collections::HashSet;

use tracing::trace;

use quirrel_ast::{Bucket, ExprRef, LetDef, LetId, Solution};

use crate::instruction::{BinaryOp, Instruction};

use super::state::{Mark, MarkKey};
use super::{Emitter, Result};

impl Emitter {
    /// Lower a grouping dispatch of `let_id` with the given buckets.
    pub(crate) fn emit_solve(
        &mut self,
        let_id: LetId,
        def: &LetDef,
        buckets: &[(String, Bucket)],
    ) -> Result<()> {
        // One origin list per bucket, first occurrence only, so the frame
        // arity k agrees with the number of marked positions.
        let mut seen = HashSet::new();
        let origin_lists: Vec<Vec<(ExprRef, Vec<ExprRef>)>> = buckets
            .iter()
            .map(|(_, bucket)| first_seen_groups(bucket, &mut seen))
            .collect();

        let n = buckets.len();
        let k = n + origin_lists.iter().map(Vec::len).sum::<usize>();
        trace!(n, k, "assembling split frame");

        for (_, bucket) in buckets {
            self.emit_bucket(bucket)?;
        }
        self.state.emit(Instruction::Split { n, k });

        // Mark every frame value at its depth below the frame top. A
        // later frame over the same let rebinds the keys of an earlier
        // one, so stale marks are dropped first.
        let split_end = self.state.len();
        let mut push_pos = 0usize;
        for ((name, _), origins) in buckets.iter().zip(&origin_lists) {
            let tic_key = MarkKey::TicVar(let_id, name.clone());
            self.state.unmark(&tic_key);
            self.state
                .mark(tic_key, Mark::new(split_end, k - 1 - push_pos));
            push_pos += 1;
            for (origin, extras) in origins {
                let group_key = MarkKey::Group(origin.clone());
                self.state.unmark(&group_key);
                self.state
                    .mark(group_key, Mark::new(split_end, k - 1 - push_pos));
                self.state.record_bucket(origin.clone(), extras.clone());
                push_pos += 1;
            }
        }

        self.emit_expr(&def.left)?;
        self.state.emit(Instruction::Merge);
        Ok(())
    }

    /// Lower one bucket to a single value.
    fn emit_bucket(&mut self, bucket: &Bucket) -> Result<()> {
        match bucket {
            Bucket::Union(left, right) => {
                self.emit_bucket(left)?;
                self.emit_bucket(right)?;
                self.state
                    .emit(Instruction::ZipBuckets { disjoint: false });
            }
            Bucket::Intersect(left, right) => {
                self.emit_bucket(left)?;
                self.emit_bucket(right)?;
                self.state.emit(Instruction::ZipBuckets { disjoint: true });
            }
            Bucket::Group { forest, .. } => self.emit_solution(forest)?,
        }
        Ok(())
    }

    /// Lower one solution tree to a single value.
    fn emit_solution(&mut self, solution: &Solution) -> Result<()> {
        match solution {
            Solution::Conjunction(left, right) => {
                self.emit_solution(left)?;
                self.emit_solution(right)?;
                self.state.emit(Instruction::Map2Match(BinaryOp::And));
            }
            Solution::Disjunction(left, right) => {
                self.emit_solution(left)?;
                self.emit_solution(right)?;
                self.state.emit(Instruction::Map2Match(BinaryOp::Or));
            }
            Solution::Definition(expr) => self.emit_expr(expr)?,
        }
        Ok(())
    }
}

/// The groups under `bucket` in pre-order, skipping origins already seen
/// by earlier buckets of the same frame.
fn first_seen_groups(
    bucket: &Bucket,
    seen: &mut HashSet<ExprRef>,
) -> Vec<(ExprRef, Vec<ExprRef>)> {
    let mut out = Vec::new();
    collect_groups(bucket, seen, &mut out);
    out
}

fn collect_groups(
    bucket: &Bucket,
    seen: &mut HashSet<ExprRef>,
    out: &mut Vec<(ExprRef, Vec<ExprRef>)>,
) {
    match bucket {
        Bucket::Union(left, right) | Bucket::Intersect(left, right) => {
            collect_groups(left, seen, out);
            collect_groups(right, seen, out);
        }
        Bucket::Group { origin, extras, .. } => {
            if seen.insert(origin.clone()) {
                out.push((origin.clone(), extras.clone()));
            }
        }
    }
}
