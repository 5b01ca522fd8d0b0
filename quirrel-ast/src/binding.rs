// quirrel-ast - Binder results for dispatch and tic-variable sites
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Name-binding results.
//!
//! The binder resolves every dispatch and tic-variable to one of these
//! tags before the AST reaches the emitter.

use std::fmt;

use crate::ast::LetId;

/// A unary standard-library operator tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Op1 {
    pub name: String,
}

impl Op1 {
    pub fn new(name: impl Into<String>) -> Self {
        Op1 { name: name.into() }
    }
}

impl fmt::Display for Op1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A binary standard-library operator tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Op2 {
    pub name: String,
}

impl Op2 {
    pub fn new(name: impl Into<String>) -> Self {
        Op2 { name: name.into() }
    }
}

impl fmt::Display for Op2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// What a name resolved to.
#[derive(Debug, Clone)]
pub enum Binding {
    /// A core built-in such as `count` or `load`, recognised by name.
    BuiltIn {
        name: String,
        arity: usize,
        reduction: bool,
    },
    /// A unary function from the standard library.
    StdlibBuiltIn1(Op1),
    /// A binary function from the standard library.
    StdlibBuiltIn2(Op2),
    /// A user-defined `let`, referenced through its side-table id.
    UserDef(LetId),
    /// The binder failed to resolve the name.
    Null,
}
