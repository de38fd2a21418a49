//! Alphabet VM instructions.
//!
//! Every instruction is an opcode plus at most one operand, resolved at
//! compile time. Jump operands are absolute indexes into the same
//! instruction sequence.
//!
//! # Stack Discipline
//!
//! Stack effect notation: `[..., operand1, operand2] -> [..., result]`
//!
//! The net effect of each instruction is fixed (see
//! [`Instruction::stack_effect`]), which lets the compiler track the
//! operand stack depth of every sequence exactly.

use ecow::EcoString;

use super::ClassId;

/// Operand of [`Instruction::PushConst`].
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Nil,
    Number(f64),
    Str(EcoString),
    Class(ClassId),
    /// The built-in system object `z`.
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // ========================================================================
    // Special
    // ========================================================================
    /// Stop the current run, discarding any frames it started.
    Halt,

    // ========================================================================
    // Stack & Constants
    // ========================================================================
    /// Stack: [...] -> [..., constant]
    PushConst(Constant),

    /// Stack: [..., a] -> [...]
    Pop,

    // ========================================================================
    // Variables
    // ========================================================================
    /// Load a declared global by slot. Unset slots read as `0`.
    /// Stack: [...] -> [..., value]
    LoadSlot(u32),

    /// Store into a declared global slot, keeping the value.
    /// Stack: [..., value] -> [..., value]
    StoreSlot(u32),

    /// Load by name: frame locals first, then the named globals, else `0`.
    /// Stack: [...] -> [..., value]
    LoadName(EcoString),

    /// Store by name: into the frame local if it exists, else the named
    /// global. Stack: [..., value] -> [..., value]
    StoreName(EcoString),

    // ========================================================================
    // Members
    // ========================================================================
    /// Stack: [..., instance] -> [..., value]
    LoadField(EcoString),

    /// Stack: [..., instance, value] -> [..., value]
    StoreField(EcoString),

    /// Stack: [..., class] -> [..., value]
    GetStatic(EcoString),

    /// Stack: [..., class, value] -> [..., value]
    SetStatic(EcoString),

    /// Stack: [..., container, index] -> [..., element]
    LoadIndex,

    /// Stack: [..., container, index, value] -> [..., value]
    StoreIndex,

    // ========================================================================
    // Operators
    // ========================================================================
    /// Stack: [..., a, b] -> [..., a op b]
    Arith(ArithOp),

    /// Stack: [..., a, b] -> [..., a op b: Bool]
    Compare(ComparisonOp),

    /// Both operands are already evaluated.
    /// Stack: [..., a, b] -> [..., if a is falsy { a } else { b }]
    And,

    /// Stack: [..., a, b] -> [..., if a is truthy { a } else { b }]
    Or,

    /// Stack: [..., a] -> [..., !a: Bool]
    Not,

    /// Stack: [..., a: Number] -> [..., -a]
    Negate,

    // ========================================================================
    // Control Flow
    // ========================================================================
    /// Operand: absolute target | Stack: [...] -> [...]
    Jump(usize),

    /// Operand: absolute target | Stack: [..., cond] -> [...]
    JumpIfFalse(usize),

    /// Call method `name` with `argc` arguments. Arguments are discarded.
    /// Stack: [..., receiver, arg1, ..., argN] -> [..., result]
    Call(EcoString, u16),

    /// Stack: [..., value] -> [...] (value is pushed for the caller)
    Return,

    /// Construct an instance; arguments are discarded.
    /// Stack: [..., arg1, ..., argN] -> [..., instance]
    New(EcoString, u16),

    /// Write the arguments separated by spaces, then a newline.
    /// Stack: [..., receiver, arg1, ..., argN] -> [..., nil]
    Print(u16),

    // ========================================================================
    // Exceptions
    // ========================================================================
    /// Push a handler at the given address, recording the stack depth.
    /// Stack: [...] -> [...]
    SetupTry(usize),

    /// Stack: [...] -> [...]
    PopTry,

    /// No statement compiles to this; only hand-assembled code raises with it.
    /// Stack: [..., value] -> unwinds to the nearest handler
    Throw,

    // ========================================================================
    // Collections
    // ========================================================================
    /// Stack: [..., e1, ..., eN] -> [..., list]
    BuildList(u32),

    /// Stack: [..., k1, v1, ..., kN, vN] -> [..., map]
    BuildMap(u32),
}

impl Instruction {
    /// Net change in operand stack depth when the instruction completes
    /// normally.
    pub fn stack_effect(&self) -> isize {
        use Instruction::*;
        match self {
            Halt | Jump(_) | SetupTry(_) | PopTry => 0,
            PushConst(_) | LoadSlot(_) | LoadName(_) => 1,
            StoreSlot(_) | StoreName(_) | LoadField(_) | GetStatic(_) | Not | Negate => 0,
            Pop | JumpIfFalse(_) | Return | Throw => -1,
            StoreField(_) | SetStatic(_) | LoadIndex | Arith(_) | Compare(_) | And | Or => -1,
            StoreIndex => -2,
            Call(_, argc) | Print(argc) => -(*argc as isize),
            New(_, argc) => 1 - *argc as isize,
            BuildList(n) => 1 - *n as isize,
            BuildMap(n) => 1 - 2 * *n as isize,
        }
    }

    /// Target address of a jump or handler setup.
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Instruction::Jump(target)
            | Instruction::JumpIfFalse(target)
            | Instruction::SetupTry(target) => Some(*target),
            _ => None,
        }
    }
}
