//! Bytecode compiler implementation.

use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;
use tracing::debug;

use super::CompileError;
use crate::parser::{
    BinaryOp, Class, Expr, Function, Literal, LogicalOp, Stmt, UnaryOp, VarDecl,
};
use crate::vm::{
    ArithOp, ClassDescriptor, ClassId, Code, ComparisonOp, Constant, FieldDecl, Instruction,
    Method, Program,
};

/// Name of the system object.
const SYSTEM: &str = "z";

/// Member name that compiles to the print instruction.
const PRINT: &str = "o";

/// Builds one instruction sequence, tracking operand stack depth.
struct Emitter {
    instructions: Vec<Instruction>,

    /// Current stack depth during compilation
    current_stack_depth: usize,

    /// Maximum stack depth observed
    max_stack_size: usize,
}

impl Emitter {
    fn new() -> Self {
        Self {
            instructions: Vec::new(),
            current_stack_depth: 0,
            max_stack_size: 0,
        }
    }

    /// Appends `instruction` and returns its address.
    fn emit(&mut self, instruction: Instruction) -> usize {
        let effect = instruction.stack_effect();
        if effect >= 0 {
            self.current_stack_depth += effect as usize;
            self.max_stack_size = self.max_stack_size.max(self.current_stack_depth);
        } else {
            let popped = effect.unsigned_abs();
            debug_assert!(
                self.current_stack_depth >= popped,
                "Stack underflow: {instruction:?} pops {popped} but depth is {}",
                self.current_stack_depth
            );
            self.current_stack_depth = self.current_stack_depth.saturating_sub(popped);
        }
        let address = self.instructions.len();
        self.instructions.push(instruction);
        address
    }

    fn here(&self) -> usize {
        self.instructions.len()
    }

    /// Points the jump (or handler setup) at `address` to the next
    /// instruction to be emitted.
    fn patch(&mut self, address: usize) {
        let target = self.here();
        match self.instructions.get_mut(address) {
            Some(
                Instruction::Jump(t) | Instruction::JumpIfFalse(t) | Instruction::SetupTry(t),
            ) => *t = target,
            other => debug_assert!(false, "Cannot patch {other:?} at {address}"),
        }
    }

    fn ends_with_return(&self) -> bool {
        matches!(self.instructions.last(), Some(Instruction::Return))
    }

    fn finish(self) -> Rc<Code> {
        Rc::new(Code::new(self.instructions, self.max_stack_size))
    }
}

/// Placeholder for a jump target that is patched later.
const UNPATCHED: usize = usize::MAX;

/// Compiles parsed statements into [`Program`]s.
///
/// A compiler is reusable: class identifiers and the global slot pool carry
/// over from one `compile` call to the next.
#[derive(Debug, Clone)]
pub struct Compiler {
    class_ids: HashMap<EcoString, ClassId>,
    next_class_id: ClassId,

    /// Declared globals in slot order.
    globals: Vec<EcoString>,
    global_slots: HashMap<EcoString, u32>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            class_ids: HashMap::new(),
            next_class_id: ClassId::FIRST,
            globals: Vec::new(),
            global_slots: HashMap::new(),
        }
    }

    /// Convenience method to compile statements with a fresh compiler.
    pub fn compile_once(statements: &[Stmt]) -> Result<Program, CompileError> {
        Self::new().compile(statements)
    }

    /// Compiles a whole program, or one more REPL entry.
    ///
    /// On error the compiler state is left as it was before the call.
    pub fn compile(&mut self, statements: &[Stmt]) -> Result<Program, CompileError> {
        let snapshot = self.clone();
        let result = self.compile_program(statements);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    /// Declared globals, indexed by slot.
    pub fn globals(&self) -> &[EcoString] {
        &self.globals
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_ids.get(name).copied()
    }

    fn compile_program(&mut self, statements: &[Stmt]) -> Result<Program, CompileError> {
        // Pass 1: identifiers for every concrete class, in encounter order.
        for stmt in statements {
            if let Stmt::Class(class) = stmt
                && !class.is_interface
            {
                self.class_id_for(&class.name);
            }
        }

        // Pass 2: class bodies and main, in source order.
        let mut classes: Vec<Rc<ClassDescriptor>> = Vec::new();
        let mut main = Emitter::new();
        for stmt in statements {
            match stmt {
                Stmt::Class(class) if class.is_interface => {
                    debug!(interface = %class.name, "Skipping interface");
                }
                Stmt::Class(class) => {
                    let descriptor = Rc::new(self.class(class)?);
                    // A redeclaration replaces the earlier descriptor in place.
                    match classes.iter_mut().find(|c| c.name == descriptor.name) {
                        Some(existing) => *existing = descriptor,
                        None => classes.push(descriptor),
                    }
                }
                _ => self.statement(&mut main, stmt)?,
            }
        }
        main.emit(Instruction::Halt);
        debug_assert_eq!(main.current_stack_depth, 0, "Unbalanced main sequence");

        let program = Program {
            classes,
            main: main.finish(),
        };
        debug!(
            classes = program.classes.len(),
            instructions = program.instruction_count(),
            "Compiled program"
        );
        Ok(program)
    }

    fn class_id_for(&mut self, name: &EcoString) -> ClassId {
        if let Some(&id) = self.class_ids.get(name) {
            return id;
        }
        let id = self.next_class_id;
        self.next_class_id = id.next();
        self.class_ids.insert(name.clone(), id);
        id
    }

    fn global_slot(&mut self, name: &EcoString) -> Result<u32, CompileError> {
        if let Some(&slot) = self.global_slots.get(name) {
            return Ok(slot);
        }
        let slot = u32::try_from(self.globals.len()).map_err(|_| CompileError::TooMany {
            what: "globals",
            limit: u32::MAX as usize,
        })?;
        self.globals.push(name.clone());
        self.global_slots.insert(name.clone(), slot);
        Ok(slot)
    }

    /// A bare class name as a field receiver. Globals of the same name only
    /// shadow the class in plain reads.
    fn static_receiver(&self, expr: &Expr) -> Option<ClassId> {
        match expr {
            Expr::Variable(name) => self.class_ids.get(name).copied(),
            _ => None,
        }
    }

    // === Classes ===

    fn class(&mut self, class: &Class) -> Result<ClassDescriptor, CompileError> {
        let id = self.class_id_for(&class.name);
        debug!(class = %class.name, %id, "Compiling class");

        let mut methods = HashMap::new();
        let mut static_methods = HashMap::new();
        for function in &class.methods {
            let method = self.method(function)?;
            if function.is_static {
                static_methods.insert(function.name.clone(), method);
            } else {
                methods.insert(function.name.clone(), method);
            }
        }

        let mut fields = HashMap::new();
        let mut static_fields: Vec<(EcoString, FieldDecl)> = Vec::new();
        for field in &class.fields {
            let decl = FieldDecl {
                type_code: field.type_code,
                visibility: field.visibility.unwrap_or_default(),
            };
            if !field.is_static {
                fields.insert(field.name.clone(), decl);
                continue;
            }
            match static_fields.iter_mut().find(|(name, _)| *name == field.name) {
                Some(existing) => existing.1 = decl,
                None => static_fields.push((field.name.clone(), decl)),
            }
        }

        let static_init = self.static_initializer(id, &class.fields)?;

        Ok(ClassDescriptor {
            name: class.name.clone(),
            id,
            superclass: class.superclass.clone(),
            interfaces: class.interfaces.clone(),
            methods,
            static_methods,
            fields,
            static_fields,
            static_init,
        })
    }

    fn method(&mut self, function: &Function) -> Result<Method, CompileError> {
        let mut code = Emitter::new();
        for stmt in &function.body {
            self.statement(&mut code, stmt)?;
        }
        if !code.ends_with_return() {
            code.emit(Instruction::PushConst(Constant::Nil));
            code.emit(Instruction::Return);
        }
        Ok(Method {
            code: code.finish(),
            visibility: function.visibility.unwrap_or_default(),
            params: function.params.iter().map(|p| p.name.clone()).collect(),
            return_type: function.return_type,
        })
    }

    /// Stores each static field initializer, in declaration order.
    fn static_initializer(
        &mut self,
        id: ClassId,
        fields: &[VarDecl],
    ) -> Result<Rc<Code>, CompileError> {
        let mut code = Emitter::new();
        for field in fields {
            let (true, Some(initializer)) = (field.is_static, &field.initializer) else {
                continue;
            };
            code.emit(Instruction::PushConst(Constant::Class(id)));
            self.expression(&mut code, initializer)?;
            code.emit(Instruction::SetStatic(field.name.clone()));
            code.emit(Instruction::Pop);
        }
        Ok(code.finish())
    }

    // === Statements ===

    fn statement(&mut self, code: &mut Emitter, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.expression(code, expr)?;
                code.emit(Instruction::Pop);
            }
            Stmt::Var(decl) => {
                match &decl.initializer {
                    Some(initializer) => self.expression(code, initializer)?,
                    None => {
                        code.emit(Instruction::PushConst(Constant::Nil));
                    }
                }
                let slot = self.global_slot(&decl.name)?;
                code.emit(Instruction::StoreSlot(slot));
                code.emit(Instruction::Pop);
            }
            Stmt::Block(statements) => {
                for stmt in statements {
                    self.statement(code, stmt)?;
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(code, condition)?;
                let false_jump = code.emit(Instruction::JumpIfFalse(UNPATCHED));
                self.statement(code, then_branch)?;
                match else_branch {
                    Some(else_branch) => {
                        let exit_jump = code.emit(Instruction::Jump(UNPATCHED));
                        code.patch(false_jump);
                        self.statement(code, else_branch)?;
                        code.patch(exit_jump);
                    }
                    None => code.patch(false_jump),
                }
            }
            Stmt::Loop { condition, body } => {
                let start = code.here();
                self.expression(code, condition)?;
                let exit_jump = code.emit(Instruction::JumpIfFalse(UNPATCHED));
                self.statement(code, body)?;
                code.emit(Instruction::Jump(start));
                code.patch(exit_jump);
            }
            Stmt::Try {
                body,
                binding,
                handler,
                ..
            } => {
                let depth = code.current_stack_depth;
                let setup = code.emit(Instruction::SetupTry(UNPATCHED));
                for stmt in body {
                    self.statement(code, stmt)?;
                }
                code.emit(Instruction::PopTry);
                let exit_jump = code.emit(Instruction::Jump(UNPATCHED));

                // The handler starts with only the thrown value above the
                // depth recorded by the setup.
                code.patch(setup);
                code.current_stack_depth = depth + 1;
                code.max_stack_size = code.max_stack_size.max(code.current_stack_depth);
                let slot = self.global_slot(binding)?;
                code.emit(Instruction::StoreSlot(slot));
                code.emit(Instruction::Pop);
                for stmt in handler {
                    self.statement(code, stmt)?;
                }
                code.patch(exit_jump);
            }
            Stmt::Return(value) => {
                match value {
                    Some(value) => self.expression(code, value)?,
                    None => {
                        code.emit(Instruction::PushConst(Constant::Nil));
                    }
                }
                code.emit(Instruction::Return);
            }
            Stmt::Function(function) => {
                return Err(CompileError::MisplacedDeclaration {
                    kind: "method",
                    name: function.name.clone(),
                });
            }
            Stmt::Class(class) => {
                return Err(CompileError::MisplacedDeclaration {
                    kind: if class.is_interface { "interface" } else { "class" },
                    name: class.name.clone(),
                });
            }
        }
        Ok(())
    }

    // === Expressions ===

    fn expression(&mut self, code: &mut Emitter, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Literal(Literal::Number(n)) => {
                code.emit(Instruction::PushConst(Constant::Number(*n)));
            }
            Expr::Literal(Literal::Str(s)) => {
                code.emit(Instruction::PushConst(Constant::Str(s.clone())));
            }
            Expr::Grouping(inner) => self.expression(code, inner)?,
            Expr::Variable(name) => self.load_variable(code, name),
            Expr::Assign { name, value } => {
                self.expression(code, value)?;
                match self.global_slots.get(name) {
                    Some(&slot) => code.emit(Instruction::StoreSlot(slot)),
                    None => code.emit(Instruction::StoreName(name.clone())),
                };
            }
            Expr::Binary { left, op, right } => {
                self.expression(code, left)?;
                self.expression(code, right)?;
                code.emit(binary_instruction(*op));
            }
            Expr::Logical { left, op, right } => {
                // Both sides are always evaluated.
                self.expression(code, left)?;
                self.expression(code, right)?;
                code.emit(match op {
                    LogicalOp::And => Instruction::And,
                    LogicalOp::Or => Instruction::Or,
                });
            }
            Expr::Unary { op, operand } => {
                if *op == UnaryOp::At {
                    return Err(CompileError::Unsupported { construct: "'@'" });
                }
                self.expression(code, operand)?;
                code.emit(match op {
                    UnaryOp::Neg => Instruction::Negate,
                    _ => Instruction::Not,
                });
            }
            Expr::Call { callee, args } => self.call(code, callee, args)?,
            Expr::Get { object, name } => match self.static_receiver(object) {
                Some(id) => {
                    code.emit(Instruction::PushConst(Constant::Class(id)));
                    code.emit(Instruction::GetStatic(name.clone()));
                }
                None => {
                    self.expression(code, object)?;
                    code.emit(Instruction::LoadField(name.clone()));
                }
            },
            Expr::Set {
                object,
                name,
                value,
            } => match self.static_receiver(object) {
                Some(id) => {
                    code.emit(Instruction::PushConst(Constant::Class(id)));
                    self.expression(code, value)?;
                    code.emit(Instruction::SetStatic(name.clone()));
                }
                None => {
                    self.expression(code, object)?;
                    self.expression(code, value)?;
                    code.emit(Instruction::StoreField(name.clone()));
                }
            },
            Expr::New { class, args } => {
                let argc = self.arguments(code, args)?;
                code.emit(Instruction::New(class.clone(), argc));
            }
            Expr::List(items) => {
                for item in items {
                    self.expression(code, item)?;
                }
                code.emit(Instruction::BuildList(count(items.len(), "list elements")?));
            }
            Expr::Map(entries) => {
                for (key, value) in entries {
                    self.expression(code, key)?;
                    self.expression(code, value)?;
                }
                code.emit(Instruction::BuildMap(count(entries.len(), "map entries")?));
            }
            Expr::Index { object, index } => {
                self.expression(code, object)?;
                self.expression(code, index)?;
                code.emit(Instruction::LoadIndex);
            }
            Expr::IndexSet {
                object,
                index,
                value,
            } => {
                self.expression(code, object)?;
                self.expression(code, index)?;
                self.expression(code, value)?;
                code.emit(Instruction::StoreIndex);
            }
        }
        Ok(())
    }

    fn load_variable(&self, code: &mut Emitter, name: &EcoString) {
        let instruction = if name.as_str() == SYSTEM {
            Instruction::PushConst(Constant::System)
        } else if let Some(&slot) = self.global_slots.get(name) {
            Instruction::LoadSlot(slot)
        } else if let Some(&id) = self.class_ids.get(name) {
            Instruction::PushConst(Constant::Class(id))
        } else {
            Instruction::LoadName(name.clone())
        };
        code.emit(instruction);
    }

    /// `recv.name(args)` calls on the receiver; a bare `name(args)` calls
    /// on `this`.
    fn call(&mut self, code: &mut Emitter, callee: &Expr, args: &[Expr]) -> Result<(), CompileError> {
        let name = match callee {
            Expr::Get { object, name } => {
                self.expression(code, object)?;
                name
            }
            Expr::Variable(name) => {
                code.emit(Instruction::LoadName("this".into()));
                name
            }
            _ => {
                return Err(CompileError::Unsupported {
                    construct: "call of a computed value",
                });
            }
        };
        let argc = self.arguments(code, args)?;
        if name.as_str() == PRINT {
            code.emit(Instruction::Print(argc));
        } else {
            code.emit(Instruction::Call(name.clone(), argc));
        }
        Ok(())
    }

    fn arguments(&mut self, code: &mut Emitter, args: &[Expr]) -> Result<u16, CompileError> {
        for arg in args {
            self.expression(code, arg)?;
        }
        u16::try_from(args.len()).map_err(|_| CompileError::TooMany {
            what: "arguments",
            limit: u16::MAX as usize,
        })
    }
}

fn count(len: usize, what: &'static str) -> Result<u32, CompileError> {
    u32::try_from(len).map_err(|_| CompileError::TooMany {
        what,
        limit: u32::MAX as usize,
    })
}

fn binary_instruction(op: BinaryOp) -> Instruction {
    match op {
        BinaryOp::Add => Instruction::Arith(ArithOp::Add),
        BinaryOp::Sub => Instruction::Arith(ArithOp::Sub),
        BinaryOp::Mul => Instruction::Arith(ArithOp::Mul),
        BinaryOp::Div => Instruction::Arith(ArithOp::Div),
        BinaryOp::Rem => Instruction::Arith(ArithOp::Rem),
        BinaryOp::Eq => Instruction::Compare(ComparisonOp::Eq),
        BinaryOp::Ne => Instruction::Compare(ComparisonOp::Ne),
        BinaryOp::Gt => Instruction::Compare(ComparisonOp::Gt),
        BinaryOp::Ge => Instruction::Compare(ComparisonOp::Ge),
        BinaryOp::Lt => Instruction::Compare(ComparisonOp::Lt),
        BinaryOp::Le => Instruction::Compare(ComparisonOp::Le),
    }
}
