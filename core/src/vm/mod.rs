//! Bytecode virtual machine.
//!
//! A [`Program`] is a set of class descriptors plus a `main` instruction
//! sequence. The [`Vm`] loads the classes, runs their static initializers
//! and then `main`, using one shared operand stack and a stack of call
//! frames.

mod code;
mod error;
mod frame;
mod instruction_set;
mod object;
mod operators;
mod program;
mod runtime;
mod stack;
mod system;
mod value;


pub use code::Code;
pub use error::{ExecutionError, Fault, ResourceExceeded};
pub use frame::FrameKind;
pub use instruction_set::{ArithOp, ComparisonOp, Constant, Instruction};
pub use object::{ClassRegistry, Instance};
pub use program::{ClassDescriptor, ClassId, FieldDecl, Method, Program};
pub use runtime::Vm;
pub use stack::Stack;
pub use system::{CUSTOM_ERROR, Console};
pub use value::{Dict, Value};
