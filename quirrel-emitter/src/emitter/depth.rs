// quirrel-emitter - Operand-stack depth computation
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Running operand-stack depth over a bytecode prefix.
//!
//! The dup engine needs the stack depth at arbitrary positions of the
//! already-emitted stream, and the emitter asserts the depth invariants
//! (never negative, one value per completed expression). `Split`/`Merge`
//! pairs are tracked as frames: `Split(n, k)` trades `n` bucket values for
//! `k` frame values, and `Merge` consumes the body value together with the
//! frame it closes.

use crate::instruction::Instruction;

/// Depth of the operand stack after each prefix of `code`.
///
/// `depths[i]` is the depth after the first `i` instructions, so the
/// returned vector has `code.len() + 1` entries and starts at 0.
pub fn stack_depths(code: &[Instruction]) -> Vec<usize> {
    let mut depths = Vec::with_capacity(code.len() + 1);
    let mut depth = 0usize;
    let mut frames: Vec<usize> = Vec::new();
    depths.push(depth);

    for instr in code {
        match instr {
            Instruction::Split { n, k } => {
                debug_assert!(depth >= *n, "split underflows the operand stack");
                depth = depth - n + k;
                frames.push(*k);
            }
            Instruction::Merge => {
                let k = frames.pop();
                debug_assert!(k.is_some(), "merge without an open split frame");
                let k = k.unwrap_or(0);
                debug_assert!(depth >= k + 1, "merge underflows the operand stack");
                depth = depth - k - 1 + 1;
            }
            _ => {
                let (pops, pushes) = instr.operand_stack_delta();
                debug_assert!(
                    depth >= pops,
                    "instruction {} underflows the operand stack",
                    instr
                );
                depth = depth - pops + pushes;
            }
        }
        depths.push(depth);
    }

    depths
}

/// Depth of the operand stack after all of `code`.
pub fn final_depth(code: &[Instruction]) -> usize {
    stack_depths(code)[code.len()]
}
