// quirrel-ast - Elaborated AST and static attributes for the Quirrel compiler
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! # quirrel-ast
//!
//! The input data model of the Quirrel bytecode emitter: an abstract syntax
//! tree that has already been parsed, name-bound, provenance-checked and
//! (for grouping constructs) solved into bucket/solution trees.
//!
//! The passes that populate this model (parser, binder, provenance checker,
//! grouping solver) live upstream and are not part of this workspace. Every
//! node arrives fully elaborated: it carries its source location, its
//! [`Provenance`], an optional constraining expression, and (for dispatch
//! sites) the [`Binding`] and bucket forest the emitter consumes.
//!
//! Binder back-edges (a tic variable pointing at its `let`, a dispatch
//! pointing at its definition) are shared immutable [`ExprRef`] handles that
//! compare and hash by node identity, never by structure.

pub mod ast;
pub mod binding;
pub mod bucket;
pub mod provenance;

pub use ast::{BinOp, Expr, ExprKind, ExprRef, LetDef, LetId, Loc};
pub use binding::{Binding, Op1, Op2};
pub use bucket::{Bucket, Solution};
pub use provenance::Provenance;
