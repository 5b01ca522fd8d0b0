// quirrel-emitter - Shared types for the bytecode emitter
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Shared types for the bytecode emitter.

use quirrel_ast::ExprRef;

/// Error during emission.
///
/// Both variants mark upstream invariant violations: an AST that passed
/// the binder, provenance checker and solver cleanly never produces them.
#[derive(Debug, Clone)]
pub enum EmitError {
    /// Null provenance reached a site that requires a real provenance.
    NullProvenance,
    /// An AST shape the emitter does not lower.
    NotImplemented(ExprRef),
}

impl std::fmt::Display for EmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitError::NullProvenance => write!(f, "null provenance"),
            EmitError::NotImplemented(expr) => {
                write!(
                    f,
                    "not implemented: {} at line {}",
                    expr.kind_name(),
                    expr.loc.line
                )
            }
        }
    }
}

impl std::error::Error for EmitError {}

/// Result type for emission.
pub type Result<T> = std::result::Result<T, EmitError>;
