//! Compiled program representation handed from the compiler to the VM.

use std::fmt;
use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;

use super::Code;
use crate::parser::{TypeCode, Visibility};

/// Runtime identity of a user class.
///
/// Identifiers start at [`ClassId::FIRST`]; smaller values are the
/// language's primitive type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const FIRST: ClassId = ClassId(15);

    pub fn next(self) -> ClassId {
        ClassId(self.0 + 1)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A compiled method body plus the metadata used for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub code: Rc<Code>,
    pub visibility: Visibility,
    /// Declared parameter names. Arguments are never bound to them.
    pub params: Vec<EcoString>,
    pub return_type: TypeCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub type_code: TypeCode,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    pub name: EcoString,
    pub id: ClassId,
    pub superclass: Option<EcoString>,
    /// Recorded only; interfaces have no runtime effect.
    pub interfaces: Vec<EcoString>,
    pub methods: HashMap<EcoString, Method>,
    pub static_methods: HashMap<EcoString, Method>,
    pub fields: HashMap<EcoString, FieldDecl>,
    /// Static fields in declaration order.
    pub static_fields: Vec<(EcoString, FieldDecl)>,
    /// Runs once when the class is loaded, before `main`.
    pub static_init: Rc<Code>,
}

/// Output of one compilation: the classes it declared and its top-level code.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Unique by name, in declaration order.
    pub classes: Vec<Rc<ClassDescriptor>>,
    pub main: Rc<Code>,
}

impl Program {
    pub fn class(&self, name: &str) -> Option<&Rc<ClassDescriptor>> {
        self.classes.iter().find(|c| c.name.as_str() == name)
    }

    /// Instruction count of `main`, every method and every static initializer.
    pub fn instruction_count(&self) -> usize {
        let classes: usize = self
            .classes
            .iter()
            .map(|class| {
                class.static_init.instructions.len()
                    + class
                        .methods
                        .values()
                        .chain(class.static_methods.values())
                        .map(|m| m.code.instructions.len())
                        .sum::<usize>()
            })
            .sum();
        self.main.instructions.len() + classes
    }
}

impl fmt::Display for Program {
    /// Full disassembly, classes first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            write!(f, "class {} #{}", class.name, class.id)?;
            if let Some(superclass) = &class.superclass {
                write!(f, " ^ {superclass}")?;
            }
            writeln!(f)?;
            if !class.static_init.instructions.is_empty() {
                writeln!(f, "static init {:?}", class.static_init)?;
            }
            let mut methods: Vec<_> = class
                .static_methods
                .iter()
                .map(|(name, m)| ("static method", name, m))
                .chain(class.methods.iter().map(|(name, m)| ("method", name, m)))
                .collect();
            methods.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
            for (kind, name, method) in methods {
                writeln!(f, "{kind} {name} {:?}", method.code)?;
            }
        }
        write!(f, "main {:?}", self.main)
    }
}
