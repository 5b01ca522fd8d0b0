// quirrel-emitter - Mark-and-dup engine for value reuse
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Retroactive value reuse.
//!
//! A stack machine has no names: reusing a value produced earlier means
//! editing the already-emitted stream. [`Emitter::emit_dup`] splices a
//! pull/dup/restore/sink sequence at the value's production point, parking
//! the duplicate at the bottom of the stack where nothing emitted since
//! can disturb it, then retrieves it at the current end of the bytecode.
//!
//! The splice sequences are pure stack rotations built from `Swap`, so the
//! net effect at the production point is exactly one extra value: the
//! depth seen by every instruction between production and reuse shifts
//! uniformly, and mark indices are kept coherent by the splice rule in
//! [`Emission::emit_at`](super::state::Emission::emit_at).

use tracing::trace;

use crate::instruction::Instruction;

use super::depth::stack_depths;
use super::state::{Mark, MarkKey};
use super::{Emitter, Result};

impl Emitter {
    /// Reuse the value located by `key`'s mark: splice a duplication at
    /// the production point and surface the duplicate at the append point.
    ///
    /// The caller must have checked that `key` is marked.
    pub(crate) fn emit_dup(&mut self, key: &MarkKey) {
        let Mark {
            index: insert_idx,
            offset,
        } = self
            .state
            .mark_for(key)
            .expect("emit_dup of an unmarked key");

        let depths = stack_depths(self.state.bytecode());
        let insert_stack = depths[insert_idx];
        let final_stack = depths[self.state.len()] + 1;
        trace!(insert_idx, offset, insert_stack, final_stack, "dup splice");

        // Pull the marked value to the top, duplicate it, restore the
        // original to its prior depth, then sink the duplicate to the
        // bottom of the stack for safekeeping.
        let mut splice = Vec::new();
        for n in 1..=offset {
            splice.push(Instruction::Swap(n));
        }
        splice.push(Instruction::Dup);
        if offset > 0 {
            for n in (1..=offset + 1).rev() {
                splice.push(Instruction::Swap(n));
            }
        }
        if insert_stack > 1 {
            for n in (1..=insert_stack).rev() {
                splice.push(Instruction::Swap(n));
            }
        }
        self.state.emit_at(splice, insert_idx as isize);

        // Retrieve the parked duplicate at the point of reuse.
        for n in 1..final_stack {
            self.state.emit(Instruction::Swap(n));
        }
    }

    /// Reuse the value for `key` if it is marked; otherwise run `lower`
    /// and mark its result at the append point.
    pub(crate) fn emit_or_dup(
        &mut self,
        key: MarkKey,
        lower: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        if self.state.is_marked(&key) {
            self.emit_dup(&key);
        } else {
            lower(self)?;
            let end = self.state.len();
            self.state.mark(key, Mark::new(end, 0));
        }
        Ok(())
    }
}
