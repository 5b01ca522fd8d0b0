// quirrel-ast - Provenance labels for expression values
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Static provenance of expression values.
//!
//! Provenance records which dataset(s) a value originates from. The
//! provenance checker computes one label per expression; the emitter only
//! interprets labels at binary-operation sites, where the overlap between
//! the two operands decides between cross-product and matched-join opcodes.

use std::collections::HashSet;
use std::fmt;

/// The provenance of an expression value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Rows drawn from a statically known dataset path.
    Static(String),

    /// Rows drawn from a dynamically introduced identity (e.g. `new`),
    /// distinguished by a solver-assigned id.
    Dynamic(u64),

    /// Rows drawn from either of two provenances (e.g. a `union`).
    Union(Box<Provenance>, Box<Provenance>),

    /// A pure value with no row identity. Excluded from overlap checks.
    Value,

    /// The error sentinel assigned by the provenance checker. A clean AST
    /// never carries it into the emitter.
    Null,
}

impl Provenance {
    /// The set of provenances this label may stand for: the label itself
    /// plus, for unions, every component.
    pub fn possibilities(&self) -> HashSet<Provenance> {
        let mut set = HashSet::new();
        self.collect_possibilities(&mut set);
        set
    }

    fn collect_possibilities(&self, set: &mut HashSet<Provenance>) {
        set.insert(self.clone());
        if let Provenance::Union(left, right) = self {
            left.collect_possibilities(set);
            right.collect_possibilities(set);
        }
    }

    /// Whether two provenances share a concrete row identity. Value and
    /// Null possibilities never count as shared.
    pub fn overlaps(&self, other: &Provenance) -> bool {
        let ours = self.possibilities();
        other
            .possibilities()
            .iter()
            .any(|p| !matches!(p, Provenance::Value | Provenance::Null) && ours.contains(p))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Static(path) => write!(f, "{}", path),
            Provenance::Dynamic(id) => write!(f, "@{}", id),
            Provenance::Union(left, right) => write!(f, "({} | {})", left, right),
            Provenance::Value => write!(f, "<value>"),
            Provenance::Null => write!(f, "<null>"),
        }
    }
}
