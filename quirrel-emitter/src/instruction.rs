// quirrel-emitter - Bytecode instruction definitions
// Copyright (c) 2026 Quirrel contributors. MIT licensed.

//! Bytecode instruction definitions.
//!
//! Instructions operate on the VM's operand stack. Every instruction has a
//! fixed operand-stack effect, exposed by
//! [`Instruction::operand_stack_delta`]; the only exception is [`Merge`],
//! which additionally reclaims the values of the `Split` frame it closes
//! (see [`Instruction::Merge`]).

use std::fmt;

use quirrel_ast::{Op1, Op2};

/// Bytecode instructions for the Quirrel VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // =========================================================================
    // Push & stack manipulation
    // =========================================================================
    /// Push a string constant.
    PushString(String),

    /// Push a numeric constant, carried as its uninterpreted literal text.
    PushNum(String),

    /// Push the boolean true.
    PushTrue,

    /// Push the boolean false.
    PushFalse,

    /// Duplicate the top of stack.
    Dup,

    /// Swap the top of stack with the value `n` below it.
    Swap(usize),

    /// Source marker: line number and line text. No stack effect.
    Line(u32, String),

    // =========================================================================
    // Map, filter & reduce
    // =========================================================================
    /// Apply a unary operation to every row of the top value.
    Map1(UnaryOp),

    /// Apply a binary operation over the Cartesian product of the top two
    /// values.
    Map2Cross(BinaryOp),

    /// Apply a binary operation over the provenance-aligned join of the top
    /// two values.
    Map2Match(BinaryOp),

    /// Filter the value `depth + 1` deep by the boolean on top, pairing rows
    /// across the Cartesian product.
    FilterCross {
        depth: usize,
        pred: Option<Vec<PredicateInstr>>,
    },

    /// Filter the value `depth + 1` deep by the boolean on top, pairing rows
    /// by aligned provenance.
    FilterMatch {
        depth: usize,
        pred: Option<Vec<PredicateInstr>>,
    },

    /// Reduce the top value to a scalar.
    Reduce(Reduction),

    /// Reduce the top value to a set.
    SetReduce(SetReduction),

    /// Replace the dataset path on top of the stack with its rows.
    LoadLocal(LoadType),

    // =========================================================================
    // Set operations
    // =========================================================================
    /// Identity-based union of the top two values.
    IUnion,

    /// Identity-based intersection of the top two values.
    IIntersect,

    // =========================================================================
    // Grouping
    // =========================================================================
    /// Combine two bucket values; `disjoint` distinguishes intersection
    /// from union semantics.
    ZipBuckets { disjoint: bool },

    /// Open a grouping frame: consume `n` bucket values, yield `k`
    /// positional values (tic-var keys and per-group row sets).
    Split { n: usize, k: usize },

    /// Close the innermost grouping frame, merging the per-group body
    /// results. Consumes the body value and reclaims the frame's `k`
    /// values; the reported delta covers the body value only.
    Merge,
}

/// Unary operation selectors for [`Instruction::Map1`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    New,
    Neg,
    Comp,
    WrapArray,
    BuiltIn(Op1),
}

/// Binary operation selectors for the `Map2*` instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    Or,
    And,
    WrapObject,
    JoinObject,
    JoinArray,
    ArraySwap,
    DerefObject,
    DerefArray,
    BuiltIn(Op2),
}

/// Scalar reduction tags for [`Instruction::Reduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Count,
    GeometricMean,
    Max,
    Mean,
    Median,
    Min,
    Mode,
    StdDev,
    Sum,
    SumSq,
    Variance,
}

/// Set reduction tags for [`Instruction::SetReduce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetReduction {
    Distinct,
}

/// Row type expected by [`Instruction::LoadLocal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
    /// Heterogeneous rows.
    Het,
}

/// The filter-predicate sublanguage. Reserved by the instruction set; the
/// emitter always passes `None` for the `pred` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateInstr {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Or,
    And,
    Comp,
    DerefObject,
    DerefArray,
    Range,
}

impl Instruction {
    /// The instruction's operand-stack effect as `(pops, pushes)`.
    ///
    /// [`Merge`](Instruction::Merge) reports `(1, 1)`: the `k` frame values
    /// it reclaims belong to the matching `Split` and are accounted for by
    /// frame-aware depth computations, not by this pair.
    pub fn operand_stack_delta(&self) -> (usize, usize) {
        match self {
            Instruction::PushString(_)
            | Instruction::PushNum(_)
            | Instruction::PushTrue
            | Instruction::PushFalse => (0, 1),
            Instruction::Dup => (1, 2),
            Instruction::Swap(n) => (n + 1, n + 1),
            Instruction::Line(..) => (0, 0),
            Instruction::Map1(_) => (1, 1),
            Instruction::Map2Cross(_) | Instruction::Map2Match(_) => (2, 1),
            Instruction::FilterCross { depth, .. } | Instruction::FilterMatch { depth, .. } => {
                (2 + depth, 1)
            }
            Instruction::Reduce(_) | Instruction::SetReduce(_) => (1, 1),
            Instruction::LoadLocal(_) => (1, 1),
            Instruction::IUnion | Instruction::IIntersect => (2, 1),
            Instruction::ZipBuckets { .. } => (2, 1),
            Instruction::Split { n, k } => (*n, *k),
            Instruction::Merge => (1, 1),
        }
    }

    /// Whether this is a `Line` source marker.
    pub fn is_line(&self) -> bool {
        matches!(self, Instruction::Line(..))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushString(s) => write!(f, "push_str {:?}", s),
            Instruction::PushNum(s) => write!(f, "push_num {}", s),
            Instruction::PushTrue => write!(f, "push_true"),
            Instruction::PushFalse => write!(f, "push_false"),
            Instruction::Dup => write!(f, "dup"),
            Instruction::Swap(n) => write!(f, "swap {}", n),
            Instruction::Line(n, text) => write!(f, "line {} {:?}", n, text),
            Instruction::Map1(op) => write!(f, "map1 {}", op),
            Instruction::Map2Cross(op) => write!(f, "map2_cross {}", op),
            Instruction::Map2Match(op) => write!(f, "map2_match {}", op),
            Instruction::FilterCross { depth, .. } => write!(f, "filter_cross {}", depth),
            Instruction::FilterMatch { depth, .. } => write!(f, "filter_match {}", depth),
            Instruction::Reduce(r) => write!(f, "reduce {}", r),
            Instruction::SetReduce(r) => write!(f, "set_reduce {}", r),
            Instruction::LoadLocal(t) => write!(f, "load_local {}", t),
            Instruction::IUnion => write!(f, "iunion"),
            Instruction::IIntersect => write!(f, "iintersect"),
            Instruction::ZipBuckets { disjoint } => write!(f, "zip_buckets {}", disjoint),
            Instruction::Split { n, k } => write!(f, "split {} {}", n, k),
            Instruction::Merge => write!(f, "merge"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::New => write!(f, "new"),
            UnaryOp::Neg => write!(f, "neg"),
            UnaryOp::Comp => write!(f, "comp"),
            UnaryOp::WrapArray => write!(f, "wrap_array"),
            UnaryOp::BuiltIn(op) => write!(f, "lib:{}", op),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "add"),
            BinaryOp::Sub => write!(f, "sub"),
            BinaryOp::Mul => write!(f, "mul"),
            BinaryOp::Div => write!(f, "div"),
            BinaryOp::Lt => write!(f, "lt"),
            BinaryOp::LtEq => write!(f, "lteq"),
            BinaryOp::Gt => write!(f, "gt"),
            BinaryOp::GtEq => write!(f, "gteq"),
            BinaryOp::Eq => write!(f, "eq"),
            BinaryOp::NotEq => write!(f, "noteq"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::WrapObject => write!(f, "wrap_object"),
            BinaryOp::JoinObject => write!(f, "join_object"),
            BinaryOp::JoinArray => write!(f, "join_array"),
            BinaryOp::ArraySwap => write!(f, "array_swap"),
            BinaryOp::DerefObject => write!(f, "deref_object"),
            BinaryOp::DerefArray => write!(f, "deref_array"),
            BinaryOp::BuiltIn(op) => write!(f, "lib:{}", op),
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reduction::Count => "count",
            Reduction::GeometricMean => "geometric_mean",
            Reduction::Max => "max",
            Reduction::Mean => "mean",
            Reduction::Median => "median",
            Reduction::Min => "min",
            Reduction::Mode => "mode",
            Reduction::StdDev => "std_dev",
            Reduction::Sum => "sum",
            Reduction::SumSq => "sum_sq",
            Reduction::Variance => "variance",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for SetReduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetReduction::Distinct => write!(f, "distinct"),
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadType::Het => write!(f, "het"),
        }
    }
}
