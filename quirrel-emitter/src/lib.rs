// quirrel-emitter - Bytecode emitter for the Quirrel query language
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Bytecode emitter for Quirrel.
//!
//! This crate is the final stage of the Quirrel compiler: it consumes a
//! fully elaborated AST (see `quirrel-ast`) and lowers it into a linear
//! instruction sequence for the stack-based query VM. The VM has no
//! registers and no local variables, so every value flow (function
//! parameters, grouped values, reuse of a named result) is realized by
//! positional stack manipulation, spliced retroactively into the emitted
//! stream where needed.

pub mod emitter;
pub mod instruction;

pub use emitter::{emit, EmitError, Emission, Emitter, Mark, MarkKey, Result};
pub use instruction::{
    BinaryOp, Instruction, LoadType, PredicateInstr, Reduction, SetReduction, UnaryOp,
};
