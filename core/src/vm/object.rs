//! Objects and the registry of loaded classes.

use std::cell::RefCell;
use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;
use tracing::debug;

use super::{ClassDescriptor, ClassId, Code, Fault, Value};
use crate::parser::Visibility;

/// An instance of a user class. Fields start unset and read as `0`.
#[derive(Debug)]
pub struct Instance {
    class: Rc<ClassDescriptor>,
    fields: RefCell<HashMap<EcoString, Value>>,
}

impl Instance {
    pub fn new(class: Rc<ClassDescriptor>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<ClassDescriptor> {
        &self.class
    }

    pub fn get(&self, field: &str) -> Value {
        self.fields.borrow().get(field).cloned().unwrap_or(Value::ZERO)
    }

    pub fn set(&self, field: &str, value: Value) {
        self.fields.borrow_mut().insert(field.into(), value);
    }
}

struct LoadedClass {
    descriptor: Rc<ClassDescriptor>,
    statics: HashMap<EcoString, Value>,
}

/// Every class loaded into a VM, addressable by name and by id.
///
/// Loading a class whose name is already registered replaces it, which is
/// how a redeclaration (or a re-entered REPL definition) takes effect.
#[derive(Default)]
pub struct ClassRegistry {
    classes: Vec<LoadedClass>,
    by_name: HashMap<EcoString, usize>,
    by_id: HashMap<ClassId, usize>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class` with every declared static field set to `0`.
    pub fn register(&mut self, class: Rc<ClassDescriptor>) {
        let statics = class
            .static_fields
            .iter()
            .map(|(name, _)| (name.clone(), Value::ZERO))
            .collect();
        let loaded = LoadedClass {
            descriptor: Rc::clone(&class),
            statics,
        };

        match self.by_name.get(&class.name) {
            Some(&at) => {
                debug!(class = %class.name, id = %class.id, "Replacing class");
                let previous = self.classes[at].descriptor.id;
                self.by_id.remove(&previous);
                self.classes[at] = loaded;
                self.by_id.insert(class.id, at);
            }
            None => {
                debug!(class = %class.name, id = %class.id, "Loading class");
                let at = self.classes.len();
                self.by_name.insert(class.name.clone(), at);
                self.by_id.insert(class.id, at);
                self.classes.push(loaded);
            }
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&Rc<ClassDescriptor>> {
        self.by_name.get(name).map(|&at| &self.classes[at].descriptor)
    }

    pub fn by_id(&self, id: ClassId) -> Option<&Rc<ClassDescriptor>> {
        self.by_id.get(&id).map(|&at| &self.classes[at].descriptor)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn loaded(&self, id: ClassId) -> Result<&LoadedClass, Fault> {
        self.by_id
            .get(&id)
            .map(|&at| &self.classes[at])
            .ok_or(Fault::UnknownClassId(id))
    }

    /// Undeclared statics read as `0`.
    pub fn get_static(&self, id: ClassId, field: &str) -> Result<Value, Fault> {
        let class = self.loaded(id)?;
        Ok(class.statics.get(field).cloned().unwrap_or(Value::ZERO))
    }

    pub fn set_static(&mut self, id: ClassId, field: &str, value: Value) -> Result<(), Fault> {
        let at = *self.by_id.get(&id).ok_or(Fault::UnknownClassId(id))?;
        self.classes[at].statics.insert(field.into(), value);
        Ok(())
    }

    /// Finds an instance method, starting at `class` and walking up the
    /// superclass chain.
    ///
    /// A private method is only reachable when `caller` (the class of the
    /// calling frame's `this`) is exactly the class declaring it.
    pub fn resolve_method(
        &self,
        class: &Rc<ClassDescriptor>,
        name: &str,
        caller: Option<&str>,
    ) -> Result<Rc<Code>, Fault> {
        let mut current = Rc::clone(class);
        // A cyclic hierarchy visits some class twice within this many steps.
        for _ in 0..=self.classes.len() {
            if let Some(method) = current.methods.get(name) {
                if method.visibility == Visibility::Private && caller != Some(current.name.as_str())
                {
                    return Err(Fault::PrivateMethod(name.into()));
                }
                return Ok(Rc::clone(&method.code));
            }
            let Some(superclass) = &current.superclass else {
                return Err(Fault::MethodNotFound(name.into()));
            };
            let parent = self
                .by_name(superclass)
                .ok_or_else(|| Fault::UnknownClass(superclass.clone()))?;
            current = Rc::clone(parent);
        }
        Err(Fault::MethodNotFound(name.into()))
    }

    /// Static methods are looked up on the class itself only, without
    /// visibility checks.
    pub fn resolve_static_method(&self, id: ClassId, name: &str) -> Result<Rc<Code>, Fault> {
        let class = &self.loaded(id)?.descriptor;
        class
            .static_methods
            .get(name)
            .map(|method| Rc::clone(&method.code))
            .ok_or_else(|| Fault::StaticMethodNotFound {
                class: class.name.clone(),
                method: name.into(),
            })
    }

    /// Checks that `caller` may read or write `field` on `instance`.
    ///
    /// The field's declaring class is the nearest class in the hierarchy
    /// that declares it. Undeclared fields are public.
    pub fn check_field_access(
        &self,
        instance: &Instance,
        field: &str,
        caller: Option<&str>,
    ) -> Result<(), Fault> {
        let mut current = Some(Rc::clone(instance.class()));
        let mut steps = 0;
        while let Some(class) = current {
            steps += 1;
            if steps > self.classes.len() + 1 {
                break;
            }
            if let Some(decl) = class.fields.get(field) {
                if decl.visibility == Visibility::Private && caller != Some(class.name.as_str()) {
                    return Err(Fault::PrivateField(field.into()));
                }
                return Ok(());
            }
            current = class
                .superclass
                .as_ref()
                .and_then(|name| self.by_name(name))
                .cloned();
        }
        Ok(())
    }
}
