// quirrel-emitter - Emitter: AST in, instruction vector out
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! The bytecode emitter.
//!
//! One downward traversal of the elaborated AST, threading an [`Emission`]
//! through every step:
//!
//! 1. The expression lowerer walks the tree, emitting instructions per
//!    node kind (`lower`).
//! 2. The mark-and-dup engine realizes value reuse by splicing into the
//!    already-emitted stream (`dup`).
//! 3. Grouping dispatches assemble `Split`/`Merge` frames (`solve`).
//!
//! The traversal is deterministic and purely a function of the input:
//! identical ASTs yield byte-identical output.

pub mod depth;
pub mod state;
pub mod types;

mod dup;
mod lower;
mod solve;

use std::collections::HashMap;

use tracing::debug;

use quirrel_ast::{ExprRef, LetDef, LetId};

use crate::instruction::Instruction;

pub use state::{Emission, Mark, MarkKey};
pub use types::{EmitError, Result};

/// The emitter. Owns the accumulating [`Emission`] and the side table of
/// `let` definitions encountered so far.
///
/// Dispatches and tic variables reference their definition by [`LetId`];
/// a definition is registered when its `Let` node is reached, which always
/// precedes every reference (references only occur inside the `Let`'s own
/// scope).
#[derive(Debug, Default)]
pub struct Emitter {
    state: Emission,
    lets: HashMap<LetId, LetDef>,
    /// Actuals of the full application currently being lowered, per `let`.
    /// A tic variable's first use lowers its actual from here and marks
    /// it; later uses dup the mark. Deferring the actual to its first use
    /// keeps the one-value-per-expression invariant: the instruction set
    /// has no way to discard an eagerly pushed actual.
    tic_bindings: HashMap<LetId, HashMap<String, ExprRef>>,
}

impl Emitter {
    /// Create an emitter with an empty emission.
    pub fn new() -> Self {
        Emitter::default()
    }

    /// The emission accumulated so far.
    pub fn emission(&self) -> &Emission {
        &self.state
    }

    /// The definition registered for `id`, if its `Let` has been reached.
    pub(crate) fn let_def(&self, id: LetId) -> Option<&LetDef> {
        self.lets.get(&id)
    }

    /// Register a `let` definition under its side-table id.
    pub(crate) fn register_let(&mut self, def: &LetDef) {
        self.lets.insert(def.id, def.clone());
    }

    /// Bind the tic vars of `id` to `actuals` for the duration of `body`,
    /// restoring any outer binding afterwards.
    pub(crate) fn with_tic_bindings(
        &mut self,
        id: LetId,
        actuals: HashMap<String, ExprRef>,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let saved = self.tic_bindings.insert(id, actuals);
        let result = body(self);
        match saved {
            Some(outer) => {
                self.tic_bindings.insert(id, outer);
            }
            None => {
                self.tic_bindings.remove(&id);
            }
        }
        result
    }

    /// The actual bound to tic var `name` of `id`, if a full application
    /// of `id` is being lowered.
    pub(crate) fn tic_binding(&self, id: LetId, name: &str) -> Option<ExprRef> {
        self.tic_bindings.get(&id).and_then(|b| b.get(name)).cloned()
    }

    /// Finalize, extracting the bytecode.
    pub fn finish(self) -> Vec<Instruction> {
        self.state.into_bytecode()
    }
}

/// Lower a complete expression to bytecode.
///
/// This is the emitter's single entry point: it builds an empty emission,
/// lowers `expr`, and returns the accumulated instruction vector.
pub fn emit(expr: &ExprRef) -> Result<Vec<Instruction>> {
    let mut emitter = Emitter::new();
    emitter.emit_expr(expr)?;
    let bytecode = emitter.finish();
    debug_assert_eq!(
        depth::final_depth(&bytecode),
        1,
        "a complete expression leaves exactly one value"
    );
    debug!(instructions = bytecode.len(), "emission complete");
    Ok(bytecode)
}
