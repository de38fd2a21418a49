//! The Alphabet virtual machine.

use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::frame::{Frame, FrameKind, Handler};
use super::object::{ClassRegistry, Instance};
use super::operators;
use super::system::{self, Console, Outcome};
use super::{
    Code, ExecutionError, Fault, Instruction, Program, ResourceExceeded, Stack, Value,
};
use crate::api::ExecutionOptions;

type Args = SmallVec<[Value; 4]>;

enum Flow {
    Continue,
    Halt,
}

/// A stack machine executing compiled [`Program`]s.
///
/// The VM keeps its loaded classes, statics and globals between runs, so a
/// REPL can feed it one compiled snippet at a time.
pub struct Vm<'io> {
    options: ExecutionOptions,
    console: Console<'io>,
    classes: ClassRegistry,
    frames: Vec<Frame>,
    stack: Stack<Value>,
    /// Declared globals, addressed by slot.
    slots: Vec<Value>,
    /// Globals created by assignment to an undeclared name.
    globals: HashMap<EcoString, Value>,
    executed: u64,
}

impl<'io> Vm<'io> {
    pub fn new(options: ExecutionOptions, console: Console<'io>) -> Self {
        Self {
            options,
            console,
            classes: ClassRegistry::new(),
            frames: Vec::new(),
            stack: Stack::new(),
            slots: Vec::new(),
            globals: HashMap::new(),
            executed: 0,
        }
    }

    /// Loads the program's classes, runs their static initializers in
    /// declaration order, then runs `main`.
    pub fn run(&mut self, program: &Program) -> Result<(), ExecutionError> {
        self.executed = 0;

        // Every class is registered before any initializer runs, so an
        // initializer may reference a later class.
        for class in &program.classes {
            self.classes.register(Rc::clone(class));
        }
        for class in &program.classes {
            if class.static_init.is_empty() {
                continue;
            }
            debug!(class = %class.name, "Running static initializer");
            self.execute(Frame::new(
                Rc::clone(&class.static_init),
                FrameKind::StaticInit,
            ))?;
        }

        debug!(instructions = program.main.len(), "Running main");
        self.execute(Frame::new(Rc::clone(&program.main), FrameKind::Main))
    }

    /// Runs a bare instruction sequence as `main`.
    pub fn run_code(&mut self, code: Rc<Code>) -> Result<(), ExecutionError> {
        self.executed = 0;
        self.execute(Frame::new(code, FrameKind::Main))
    }

    pub fn slot(&self, index: u32) -> Option<&Value> {
        self.slots.get(index as usize)
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn static_value(&self, class: &str, field: &str) -> Option<Value> {
        let id = self.classes.by_name(class)?.id;
        self.classes.get_static(id, field).ok()
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Operand stack depth; zero between runs.
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub fn console_mut(&mut self) -> &mut Console<'io> {
        &mut self.console
    }

    /// Runs `frame` until it and every frame it called have finished.
    ///
    /// On error the frames and operands of this run are discarded, leaving
    /// the VM ready for the next run.
    fn execute(&mut self, frame: Frame) -> Result<(), ExecutionError> {
        let base = self.frames.len();
        let stack_base = self.stack.len();
        self.push_frame(frame)?;

        let result = self.run_loop(base);
        if result.is_err() {
            self.frames.truncate(base);
            self.stack.truncate(stack_base);
        }
        result
    }

    fn push_frame(&mut self, frame: Frame) -> Result<(), ExecutionError> {
        if self.frames.len() >= self.options.max_depth {
            return Err(ResourceExceeded::CallDepth {
                depth: self.frames.len() + 1,
                max_depth: self.options.max_depth,
            }
            .into());
        }
        debug!(kind = ?frame.kind, depth = self.frames.len() + 1, "Push frame");
        self.frames.push(frame);
        Ok(())
    }

    fn run_loop(&mut self, base: usize) -> Result<(), ExecutionError> {
        loop {
            if self.frames.len() <= base {
                return Ok(());
            }
            let Some(frame) = self.frames.last_mut() else {
                return Ok(());
            };

            if frame.pc >= frame.code.len() {
                let finished = self.frames.pop();
                debug!(depth = self.frames.len(), "Frame ran off its end");
                if finished.is_some_and(|f| f.returns_value()) && self.frames.len() > base {
                    self.stack.push(Value::Nil);
                }
                continue;
            }

            let code = Rc::clone(&frame.code);
            let pc = frame.pc;
            frame.pc += 1;

            self.count_instruction()?;
            let instruction = &code.instructions[pc];
            trace!(pc, ?instruction, depth = self.stack.len(), "Execute");

            match self.step(instruction, base)? {
                Flow::Continue => {}
                Flow::Halt => {
                    self.frames.truncate(base);
                    return Ok(());
                }
            }
        }
    }

    fn count_instruction(&mut self) -> Result<(), ResourceExceeded> {
        self.executed += 1;
        match self.options.max_instructions {
            Some(limit) if self.executed > limit => Err(ResourceExceeded::Instructions { limit }),
            _ => Ok(()),
        }
    }

    fn step(&mut self, instruction: &Instruction, base: usize) -> Result<Flow, ExecutionError> {
        use Instruction::*;
        match instruction {
            Halt => return Ok(Flow::Halt),

            PushConst(constant) => self.stack.push(constant.into()),
            Pop => {
                self.pop()?;
            }

            LoadSlot(index) => {
                let value = self.slots.get(*index as usize).cloned().unwrap_or(Value::ZERO);
                self.stack.push(value);
            }
            StoreSlot(index) => {
                let value = self.peek()?;
                let index = *index as usize;
                if index >= self.slots.len() {
                    self.slots.resize(index + 1, Value::ZERO);
                }
                self.slots[index] = value;
            }
            LoadName(name) => {
                let value = self
                    .current_frame()
                    .and_then(|frame| frame.locals.get(name))
                    .or_else(|| self.globals.get(name))
                    .cloned()
                    .unwrap_or(Value::ZERO);
                self.stack.push(value);
            }
            StoreName(name) => {
                let value = self.peek()?;
                match self.frames.last_mut() {
                    Some(frame) if frame.locals.contains_key(name) => {
                        frame.locals.insert(name.clone(), value);
                    }
                    _ => {
                        self.globals.insert(name.clone(), value);
                    }
                }
            }

            LoadField(field) => {
                let object = self.pop()?;
                let instance = expect_instance(&object, field)?;
                let caller = self.caller_class();
                self.classes
                    .check_field_access(instance, field, caller.as_deref())?;
                let value = instance.get(field);
                self.stack.push(value);
            }
            StoreField(field) => {
                let value = self.pop()?;
                let object = self.pop()?;
                let instance = expect_instance(&object, field)?;
                let caller = self.caller_class();
                self.classes
                    .check_field_access(instance, field, caller.as_deref())?;
                instance.set(field, value.clone());
                self.stack.push(value);
            }
            GetStatic(field) => {
                let class = self.pop()?;
                let Value::Class(id) = class else {
                    return Err(Fault::NotAClass {
                        field: field.clone(),
                        found: class.type_name(),
                    }
                    .into());
                };
                let value = self.classes.get_static(id, field)?;
                self.stack.push(value);
            }
            SetStatic(field) => {
                let value = self.pop()?;
                let class = self.pop()?;
                let Value::Class(id) = class else {
                    return Err(Fault::NotAClass {
                        field: field.clone(),
                        found: class.type_name(),
                    }
                    .into());
                };
                self.classes.set_static(id, field, value.clone())?;
                self.stack.push(value);
            }
            LoadIndex => {
                let index = self.pop()?;
                let container = self.pop()?;
                let value = operators::index_get(&container, &index)?;
                self.stack.push(value);
            }
            StoreIndex => {
                let value = self.pop()?;
                let index = self.pop()?;
                let container = self.pop()?;
                operators::index_set(&container, &index, value.clone())?;
                self.stack.push(value);
            }

            Arith(op) => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.stack.push(operators::arith(*op, &left, &right)?);
            }
            Compare(op) => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.stack.push(operators::compare(*op, &left, &right)?);
            }
            And => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.stack
                    .push(if left.is_truthy() { right } else { left });
            }
            Or => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.stack
                    .push(if left.is_truthy() { left } else { right });
            }
            Not => {
                let operand = self.pop()?;
                self.stack.push(Value::Bool(!operand.is_truthy()));
            }
            Negate => {
                let operand = self.pop()?;
                self.stack.push(operators::negate(&operand)?);
            }

            Jump(target) => self.jump(*target),
            JumpIfFalse(target) => {
                if !self.pop()?.is_truthy() {
                    self.jump(*target);
                }
            }

            Call(name, argc) => {
                let args = self.pop_args(*argc)?;
                let receiver = self.pop()?;
                self.call(name, receiver, &args, base)?;
            }
            Return => {
                let value = self.pop()?;
                self.frames.pop();
                debug!(depth = self.frames.len(), "Return");
                if self.frames.len() > base {
                    self.stack.push(value);
                }
            }
            New(class, argc) => {
                // No constructor protocol, the arguments are dropped.
                self.pop_args(*argc)?;
                let descriptor = self
                    .classes
                    .by_name(class)
                    .ok_or_else(|| Fault::UnknownClass(class.clone()))?;
                let instance = Instance::new(Rc::clone(descriptor));
                self.stack.push(Value::Instance(Rc::new(instance)));
            }
            Print(argc) => {
                let args = self.pop_args(*argc)?;
                self.pop()?;
                self.console.print(&args)?;
                self.stack.push(Value::Nil);
            }

            SetupTry(address) => {
                let depth = self.stack.len();
                if let Some(frame) = self.frames.last_mut() {
                    frame.handlers.push(Handler {
                        address: *address,
                        depth,
                    });
                }
            }
            PopTry => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.handlers.pop();
                }
            }
            Throw => {
                let value = self.pop()?;
                self.throw(value, base)?;
            }

            BuildList(count) => {
                let items = self
                    .stack
                    .pop_n(*count as usize)
                    .ok_or(Fault::StackUnderflow)?;
                self.stack.push(Value::list(items));
            }
            BuildMap(count) => {
                let items = self
                    .stack
                    .pop_n(*count as usize * 2)
                    .ok_or(Fault::StackUnderflow)?;
                let mut dict = super::Dict::new();
                let mut items = items.into_iter();
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    dict.insert(key, value)?;
                }
                self.stack.push(Value::map(dict));
            }
        }
        Ok(Flow::Continue)
    }

    fn call(
        &mut self,
        name: &EcoString,
        receiver: Value,
        args: &[Value],
        base: usize,
    ) -> Result<(), ExecutionError> {
        match receiver {
            Value::Instance(instance) => {
                let caller = self.caller_class();
                let code =
                    self.classes
                        .resolve_method(instance.class(), name, caller.as_deref())?;
                self.push_frame(Frame::method(code, Value::Instance(instance)))
            }
            Value::Class(id) => {
                let code = self.classes.resolve_static_method(id, name)?;
                self.push_frame(Frame::new(code, FrameKind::StaticMethod))
            }
            Value::System => match system::call(&mut self.console, name, args)? {
                Outcome::Return(value) => {
                    self.stack.push(value);
                    Ok(())
                }
                Outcome::Throw(value) => self.throw(value, base),
            },
            other => Err(Fault::InvalidReceiver {
                method: name.clone(),
                receiver: other.type_name(),
            }
            .into()),
        }
    }

    /// Transfers control to the innermost handler of this run, discarding
    /// frames that have none.
    fn throw(&mut self, value: Value, base: usize) -> Result<(), ExecutionError> {
        while self.frames.len() > base {
            let Some(frame) = self.frames.last_mut() else {
                break;
            };
            if let Some(handler) = frame.handlers.pop() {
                debug!(value = %value, address = handler.address, "Exception caught");
                frame.pc = handler.address;
                self.stack.truncate(handler.depth);
                self.stack.push(value);
                return Ok(());
            }
            self.frames.pop();
            debug!(depth = self.frames.len(), "Unwinding frame");
        }
        debug!(value = %value, "Exception escaped every frame");
        Err(ExecutionError::Uncaught(value.to_string()))
    }

    fn jump(&mut self, target: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.pc = target;
        }
    }

    fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    fn caller_class(&self) -> Option<EcoString> {
        self.current_frame().and_then(Frame::caller_class)
    }

    fn pop(&mut self) -> Result<Value, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow)
    }

    fn peek(&self) -> Result<Value, Fault> {
        self.stack.peek().cloned().ok_or(Fault::StackUnderflow)
    }

    /// Pops `argc` call arguments, returned in source order.
    fn pop_args(&mut self, argc: u16) -> Result<Args, Fault> {
        let mut args = Args::with_capacity(argc as usize);
        for _ in 0..argc {
            args.push(self.pop()?);
        }
        args.reverse();
        Ok(args)
    }
}

fn expect_instance<'v>(value: &'v Value, field: &str) -> Result<&'v Instance, Fault> {
    match value {
        Value::Instance(instance) => Ok(&**instance),
        other => Err(Fault::NotAnInstance {
            field: field.into(),
            found: other.type_name(),
        }),
    }
}
