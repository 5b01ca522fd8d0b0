// quirrel-emitter - Emission state: bytecode, marks, buckets, line tracking
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! The accumulating emission state.
//!
//! [`Emission`] owns the growing bytecode and the side tables the lowering
//! maintains: the mark table locating previously produced values, the
//! bucket table of group extras, and the most recent source-line marker.
//!
//! Bytecode only grows, and splices preserve the relative order of the
//! instructions already emitted; marks are kept coherent across splices by
//! shifting every mark that points past the splice position.

use std::collections::HashMap;

use quirrel_ast::{ExprRef, LetId};

use crate::instruction::Instruction;

/// The location of a previously emitted value.
///
/// `index` is the bytecode position immediately after the value was
/// produced; splices before it shift it by the splice length. `offset` is
/// the value's depth below the top of stack at that position: 0 for
/// expression-level marks, the frame-layout depth for grouping marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub index: usize,
    pub offset: usize,
}

impl Mark {
    pub fn new(index: usize, offset: usize) -> Self {
        Mark { index, offset }
    }
}

/// What a mark identifies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkKey {
    /// The result of a subexpression (zero-arity `let` bodies).
    Expr(ExprRef),
    /// The value bound to a tic variable of a user-defined `let`.
    TicVar(LetId, String),
    /// The complete result of dispatching a `let` with specific actuals.
    Dispatch(LetId, Vec<ExprRef>),
    /// The per-group value of a `Split` frame, keyed by the originating
    /// `where` clause.
    Group(ExprRef),
}

/// The accumulating emission: bytecode plus mark/bucket/line side tables.
#[derive(Debug, Default)]
pub struct Emission {
    bytecode: Vec<Instruction>,
    marks: HashMap<MarkKey, Mark>,
    buckets: HashMap<ExprRef, Vec<ExprRef>>,
    cur_line: Option<(u32, String)>,
}

impl Emission {
    /// Create an empty emission.
    pub fn new() -> Self {
        Emission::default()
    }

    /// The current bytecode length, which is also the append point.
    pub fn len(&self) -> usize {
        self.bytecode.len()
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.bytecode.is_empty()
    }

    /// The instructions emitted so far.
    pub fn bytecode(&self) -> &[Instruction] {
        &self.bytecode
    }

    /// Append one instruction. Appending never moves a mark.
    pub fn emit(&mut self, instr: Instruction) {
        self.bytecode.push(instr);
    }

    /// Splice `instrs` in at position `idx`; a negative `idx` counts back
    /// from the append point. Every mark past the splice position shifts
    /// by the splice length.
    pub fn emit_at(&mut self, instrs: Vec<Instruction>, idx: isize) {
        let idx = if idx < 0 {
            self.bytecode.len() - idx.unsigned_abs()
        } else {
            idx as usize
        };
        debug_assert!(idx <= self.bytecode.len(), "splice past the append point");

        let len = instrs.len();
        self.bytecode.splice(idx..idx, instrs);
        for mark in self.marks.values_mut() {
            if mark.index > idx {
                mark.index += len;
            }
        }
    }

    /// Emit a `Line` marker unless it repeats the most recent one.
    pub fn emit_line(&mut self, line: u32, text: &str) {
        if self
            .cur_line
            .as_ref()
            .is_some_and(|(n, t)| *n == line && t.as_str() == text)
        {
            return;
        }
        self.cur_line = Some((line, text.to_string()));
        self.emit(Instruction::Line(line, text.to_string()));
    }

    /// Record a mark. Marking the same key twice without an intervening
    /// rebind is a programmer error.
    pub fn mark(&mut self, key: MarkKey, mark: Mark) {
        let prior = self.marks.insert(key, mark);
        debug_assert!(prior.is_none(), "mark key inserted twice");
    }

    /// Look up a mark.
    pub fn mark_for(&self, key: &MarkKey) -> Option<Mark> {
        self.marks.get(key).copied()
    }

    /// Whether `key` has been marked.
    pub fn is_marked(&self, key: &MarkKey) -> bool {
        self.marks.contains_key(key)
    }

    /// Drop a mark so the key can be bound afresh. Used when a function
    /// is applied again with new actuals or driven by a new split frame.
    pub fn unmark(&mut self, key: &MarkKey) {
        self.marks.remove(key);
    }

    /// Drop the tic-var marks of `let_id` for `params`, so a later full
    /// application of the same function can bind them afresh.
    pub fn unmark_tic_vars(&mut self, let_id: LetId, params: &[String]) {
        for param in params {
            self.marks.remove(&MarkKey::TicVar(let_id, param.clone()));
        }
    }

    /// Record the extras of a group origin.
    pub fn record_bucket(&mut self, origin: ExprRef, extras: Vec<ExprRef>) {
        self.buckets.insert(origin, extras);
    }

    /// The group-extras table accumulated so far.
    pub fn buckets(&self) -> &HashMap<ExprRef, Vec<ExprRef>> {
        &self.buckets
    }

    /// Finalize, extracting the bytecode.
    pub fn into_bytecode(self) -> Vec<Instruction> {
        self.bytecode
    }
}
