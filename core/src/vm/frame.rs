use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;

use super::{Code, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Main,
    StaticInit,
    Method,
    StaticMethod,
}

/// An installed exception handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    pub address: usize,
    /// Operand stack depth when the handler was installed.
    pub depth: usize,
}

#[derive(Debug)]
pub struct Frame {
    pub code: Rc<Code>,
    pub pc: usize,
    pub locals: HashMap<EcoString, Value>,
    pub handlers: Vec<Handler>,
    pub kind: FrameKind,
}

impl Frame {
    pub fn new(code: Rc<Code>, kind: FrameKind) -> Self {
        Self {
            code,
            pc: 0,
            locals: HashMap::new(),
            handlers: Vec::new(),
            kind,
        }
    }

    /// A method frame with `this` bound to the receiver.
    pub fn method(code: Rc<Code>, this: Value) -> Self {
        let mut frame = Self::new(code, FrameKind::Method);
        frame.locals.insert("this".into(), this);
        frame
    }

    /// Name of the class of the bound `this`, if it is an object.
    pub fn caller_class(&self) -> Option<EcoString> {
        match self.locals.get("this") {
            Some(Value::Instance(instance)) => Some(instance.class().name.clone()),
            _ => None,
        }
    }

    pub fn returns_value(&self) -> bool {
        matches!(self.kind, FrameKind::Method | FrameKind::StaticMethod)
    }
}
