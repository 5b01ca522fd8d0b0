// quirrel-emitter - Expression lowering
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Structural lowering of expression nodes.
//!
//! Each node first emits a line marker for its location, then its
//! node-specific instructions, then the constraint filter if one applies.
//! Binary operations choose between cross and match opcodes by the
//! provenance overlap of their operands; object and array literals group
//! their parts by provenance before joining them.

use quirrel_ast::{BinOp, Binding, ExprKind, ExprRef, Provenance};

use crate::instruction::{
    BinaryOp, Instruction, LoadType, PredicateInstr, Reduction, SetReduction, UnaryOp,
};

use super::state::{Mark, MarkKey};
use super::types::EmitError;
use super::{Emitter, Result};

/// Which join form a binary site takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinKind {
    Cross,
    Match,
}

/// Decide cross vs. match from the operand provenances: a shared concrete
/// possibility selects the match form. Null provenance is an upstream
/// failure and rejects the emission.
fn join_kind(left: &Provenance, right: &Provenance) -> Result<JoinKind> {
    if matches!(left, Provenance::Null) || matches!(right, Provenance::Null) {
        return Err(EmitError::NullProvenance);
    }
    if left.overlaps(right) {
        Ok(JoinKind::Match)
    } else {
        Ok(JoinKind::Cross)
    }
}

fn binop_instr(op: BinOp) -> BinaryOp {
    match op {
        BinOp::Add => BinaryOp::Add,
        BinOp::Sub => BinaryOp::Sub,
        BinOp::Mul => BinaryOp::Mul,
        BinOp::Div => BinaryOp::Div,
        BinOp::Lt => BinaryOp::Lt,
        BinOp::LtEq => BinaryOp::LtEq,
        BinOp::Gt => BinaryOp::Gt,
        BinOp::GtEq => BinaryOp::GtEq,
        BinOp::Eq => BinaryOp::Eq,
        BinOp::NotEq => BinaryOp::NotEq,
        BinOp::Or => BinaryOp::Or,
        BinOp::And => BinaryOp::And,
    }
}

fn reduction_for(name: &str) -> Option<Reduction> {
    Some(match name {
        "count" => Reduction::Count,
        "geometricMean" => Reduction::GeometricMean,
        "max" => Reduction::Max,
        "mean" => Reduction::Mean,
        "median" => Reduction::Median,
        "min" => Reduction::Min,
        "mode" => Reduction::Mode,
        "stdDev" => Reduction::StdDev,
        "sum" => Reduction::Sum,
        "sumSq" => Reduction::SumSq,
        "variance" => Reduction::Variance,
        _ => return None,
    })
}

impl Emitter {
    /// Lower one expression, leaving exactly one value on the stack.
    pub fn emit_expr(&mut self, expr: &ExprRef) -> Result<()> {
        self.state.emit_line(expr.loc.line, &expr.loc.text);

        match &expr.kind {
            ExprKind::StrLit(value) => {
                self.state.emit(Instruction::PushString(value.clone()));
            }
            ExprKind::NumLit(value) => {
                self.state.emit(Instruction::PushNum(value.clone()));
            }
            ExprKind::BoolLit(true) => self.state.emit(Instruction::PushTrue),
            ExprKind::BoolLit(false) => self.state.emit(Instruction::PushFalse),

            ExprKind::New(child) => {
                self.emit_expr(child)?;
                self.state.emit(Instruction::Map1(UnaryOp::New));
            }
            ExprKind::Neg(child) => {
                self.emit_expr(child)?;
                self.state.emit(Instruction::Map1(UnaryOp::Neg));
            }
            ExprKind::Comp(child) => {
                self.emit_expr(child)?;
                self.state.emit(Instruction::Map1(UnaryOp::Comp));
            }

            // Transparent: the parser keeps the node, the bytecode doesn't.
            ExprKind::Paren(child) => self.emit_expr(child)?,

            // The from/to clauses only carry provenance for earlier passes.
            ExprKind::Relate { in_, .. } => self.emit_expr(in_)?,

            // The bound expression is lowered lazily at each dispatch site.
            ExprKind::Let(def) => {
                self.register_let(def);
                self.emit_expr(&def.right)?;
            }

            ExprKind::TicVar { name, binding } => match binding {
                Binding::UserDef(let_id) => {
                    let key = MarkKey::TicVar(*let_id, name.clone());
                    if self.state.is_marked(&key) {
                        // Solve frames mark their tic vars up front; a
                        // full application marks on first use.
                        self.emit_dup(&key);
                    } else {
                        let Some(actual) = self.tic_binding(*let_id, name) else {
                            return Err(EmitError::NotImplemented(expr.clone()));
                        };
                        self.emit_expr(&actual)?;
                        let end = self.state.len();
                        self.state.mark(key, Mark::new(end, 0));
                    }
                }
                _ => return Err(EmitError::NotImplemented(expr.clone())),
            },

            ExprKind::Binary { op, left, right } => {
                self.emit_map(left, right, binop_instr(*op))?;
            }

            ExprKind::Descent { child, property } => {
                let kind = join_kind(&child.provenance, &Provenance::Value)?;
                self.emit_expr(child)?;
                self.state.emit(Instruction::PushString(property.clone()));
                self.emit_join(kind, BinaryOp::DerefObject);
            }

            ExprKind::Deref { left, right } => {
                self.emit_map(left, right, BinaryOp::DerefArray)?;
            }

            ExprKind::With { left, right } => {
                self.emit_map(left, right, BinaryOp::JoinObject)?;
            }

            ExprKind::Where { left, right } => {
                let group_key = MarkKey::Group(expr.clone());
                if self.state.is_marked(&group_key) {
                    // The enclosing split frame already carries this
                    // group's value.
                    self.emit_dup(&group_key);
                } else {
                    self.emit_filter(left, right, 0, None)?;
                }
            }

            ExprKind::Union { left, right } => {
                self.emit_expr(left)?;
                self.emit_expr(right)?;
                self.state.emit(Instruction::IUnion);
            }
            ExprKind::Intersect { left, right } => {
                self.emit_expr(left)?;
                self.emit_expr(right)?;
                self.state.emit(Instruction::IIntersect);
            }

            ExprKind::ObjectDef(fields) => self.emit_object(expr, fields)?,
            ExprKind::ArrayDef(values) => self.emit_array(expr, values)?,

            ExprKind::Dispatch {
                actuals,
                binding,
                buckets,
                ..
            } => self.emit_dispatch(expr, actuals, binding, buckets)?,
        }

        self.emit_constraint(expr)
    }

    fn emit_join(&mut self, kind: JoinKind, op: BinaryOp) {
        self.state.emit(match kind {
            JoinKind::Cross => Instruction::Map2Cross(op),
            JoinKind::Match => Instruction::Map2Match(op),
        });
    }

    /// Lower `left` and `right`, then combine them with the cross or match
    /// form of `op` as their provenances dictate.
    pub(crate) fn emit_map(
        &mut self,
        left: &ExprRef,
        right: &ExprRef,
        op: BinaryOp,
    ) -> Result<()> {
        let kind = join_kind(&left.provenance, &right.provenance)?;
        self.emit_expr(left)?;
        self.emit_expr(right)?;
        self.emit_join(kind, op);
        Ok(())
    }

    /// Lower `left` and `right`, then filter with the cross or match form
    /// as their provenances dictate.
    pub(crate) fn emit_filter(
        &mut self,
        left: &ExprRef,
        right: &ExprRef,
        depth: usize,
        pred: Option<Vec<PredicateInstr>>,
    ) -> Result<()> {
        let kind = join_kind(&left.provenance, &right.provenance)?;
        self.emit_expr(left)?;
        self.emit_expr(right)?;
        self.state.emit(match kind {
            JoinKind::Cross => Instruction::FilterCross { depth, pred },
            JoinKind::Match => Instruction::FilterMatch { depth, pred },
        });
        Ok(())
    }

    /// Apply the constraining expression attached to `expr`, unless the
    /// node itself is the constraint or a child already applied it.
    fn emit_constraint(&mut self, expr: &ExprRef) -> Result<()> {
        let Some(constraint) = expr.constraining.clone() else {
            return Ok(());
        };
        if constraint.equals_ignoring_loc(expr) {
            return Ok(());
        }
        let child_applied = expr.children().iter().any(|child| {
            child
                .constraining
                .as_ref()
                .is_some_and(|c| c.equals_ignoring_loc(&constraint))
        });
        if child_applied {
            return Ok(());
        }

        self.emit_expr(&constraint)?;
        self.state.emit(Instruction::Dup);
        self.state.emit(Instruction::Map2Match(BinaryOp::Eq));
        self.state.emit(Instruction::FilterMatch {
            depth: 0,
            pred: None,
        });
        Ok(())
    }

    /// Object literal: wrap each field, join within provenance groups,
    /// cross-join across groups. Field order in the emitted object follows
    /// the grouping, not the source; objects are unordered in the data
    /// model.
    fn emit_object(&mut self, expr: &ExprRef, fields: &[(String, ExprRef)]) -> Result<()> {
        if fields.is_empty() {
            return Err(EmitError::NotImplemented(expr.clone()));
        }

        let groups = group_by_provenance(fields.iter().map(|(_, value)| value));
        for (group_idx, (provenance, members)) in groups.iter().enumerate() {
            let join = if *provenance == Provenance::Value {
                JoinKind::Cross
            } else {
                JoinKind::Match
            };
            for (member_idx, &field_idx) in members.iter().enumerate() {
                let (key, value) = &fields[field_idx];
                self.state.emit(Instruction::PushString(key.clone()));
                self.emit_expr(value)?;
                self.state
                    .emit(Instruction::Map2Cross(BinaryOp::WrapObject));
                if member_idx > 0 {
                    self.emit_join(join, BinaryOp::JoinObject);
                }
            }
            if group_idx > 0 {
                self.state
                    .emit(Instruction::Map2Cross(BinaryOp::JoinObject));
            }
        }
        Ok(())
    }

    /// Array literal: wrap each element, join within provenance groups,
    /// cross-join across groups, then restore source order with pairwise
    /// `ArraySwap`s.
    fn emit_array(&mut self, expr: &ExprRef, values: &[ExprRef]) -> Result<()> {
        if values.is_empty() {
            return Err(EmitError::NotImplemented(expr.clone()));
        }

        let groups = group_by_provenance(values.iter());
        for (group_idx, (provenance, members)) in groups.iter().enumerate() {
            let join = if *provenance == Provenance::Value {
                JoinKind::Cross
            } else {
                JoinKind::Match
            };
            for (member_idx, &value_idx) in members.iter().enumerate() {
                self.emit_expr(&values[value_idx])?;
                self.state.emit(Instruction::Map1(UnaryOp::WrapArray));
                if member_idx > 0 {
                    self.emit_join(join, BinaryOp::JoinArray);
                }
            }
            if group_idx > 0 {
                self.state.emit(Instruction::Map2Cross(BinaryOp::JoinArray));
            }
        }

        // The joined array holds elements in group order; bubble each
        // source index into place, one ArraySwap per adjacent step.
        let mut perm: Vec<usize> = groups
            .iter()
            .flat_map(|(_, members)| members.iter().copied())
            .collect();
        for target in 0..perm.len() {
            let current = perm
                .iter()
                .position(|&idx| idx == target)
                .expect("permutation covers every index");
            for pos in (target + 1..=current).rev() {
                self.state.emit(Instruction::PushNum(pos.to_string()));
                self.state.emit(Instruction::Map2Cross(BinaryOp::ArraySwap));
                perm.swap(pos, pos - 1);
            }
        }
        Ok(())
    }

    /// Lower a dispatch site according to its binding.
    fn emit_dispatch(
        &mut self,
        expr: &ExprRef,
        actuals: &[ExprRef],
        binding: &Binding,
        buckets: &[(String, quirrel_ast::Bucket)],
    ) -> Result<()> {
        match binding {
            Binding::BuiltIn { name, .. } => match (reduction_for(name), actuals) {
                (Some(reduction), [actual]) => {
                    self.emit_expr(actual)?;
                    self.state.emit(Instruction::Reduce(reduction));
                    Ok(())
                }
                (None, [actual]) if name.as_str() == "distinct" => {
                    self.emit_expr(actual)?;
                    self.state
                        .emit(Instruction::SetReduce(SetReduction::Distinct));
                    Ok(())
                }
                (None, [actual]) if name.as_str() == "load" => {
                    self.emit_expr(actual)?;
                    self.state.emit(Instruction::LoadLocal(LoadType::Het));
                    Ok(())
                }
                _ => Err(EmitError::NotImplemented(expr.clone())),
            },

            Binding::StdlibBuiltIn1(op) => match actuals {
                [actual] => {
                    self.emit_expr(actual)?;
                    self.state
                        .emit(Instruction::Map1(UnaryOp::BuiltIn(op.clone())));
                    Ok(())
                }
                _ => Err(EmitError::NotImplemented(expr.clone())),
            },

            Binding::StdlibBuiltIn2(op) => match actuals {
                [left, right] => self.emit_map(left, right, BinaryOp::BuiltIn(op.clone())),
                _ => Err(EmitError::NotImplemented(expr.clone())),
            },

            Binding::UserDef(let_id) => {
                let Some(def) = self.let_def(*let_id).cloned() else {
                    return Err(EmitError::NotImplemented(expr.clone()));
                };

                if def.params.is_empty() {
                    // A bare name is a memoized reference to its body.
                    self.emit_or_dup(MarkKey::Expr(def.left.clone()), |emitter| {
                        emitter.emit_expr(&def.left)
                    })
                } else if actuals.len() == def.params.len() {
                    let key = MarkKey::Dispatch(*let_id, actuals.to_vec());
                    if self.state.is_marked(&key) {
                        self.emit_dup(&key);
                        return Ok(());
                    }
                    // Bind each tic var to its actual and lower the body;
                    // each actual is emitted and marked at its first use.
                    self.state.unmark_tic_vars(*let_id, &def.params);
                    let bindings = def
                        .params
                        .iter()
                        .cloned()
                        .zip(actuals.iter().cloned())
                        .collect();
                    self.with_tic_bindings(*let_id, bindings, |emitter| {
                        emitter.emit_expr(&def.left)
                    })?;
                    let end = self.state.len();
                    self.state.mark(key, Mark::new(end, 0));
                    Ok(())
                } else {
                    self.emit_solve(*let_id, &def, buckets)
                }
            }

            Binding::Null => Err(EmitError::NotImplemented(expr.clone())),
        }
    }
}

/// Group items by provenance, preserving first-occurrence group order and
/// source order within each group. Returns `(provenance, member indices)`.
fn group_by_provenance<'a>(
    items: impl Iterator<Item = &'a ExprRef>,
) -> Vec<(Provenance, Vec<usize>)> {
    let mut groups: Vec<(Provenance, Vec<usize>)> = Vec::new();
    for (idx, item) in items.enumerate() {
        match groups.iter_mut().find(|(p, _)| *p == item.provenance) {
            Some((_, members)) => members.push(idx),
            None => groups.push((item.provenance.clone(), vec![idx])),
        }
    }
    groups
}
