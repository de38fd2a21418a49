//! Runtime values.
//!
//! Lists, maps and instances are shared by reference: copying a value that
//! holds one aliases the same underlying collection or object.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ecow::EcoString;
use hashbrown::HashMap;

use super::{ClassId, Constant, Fault, Instance};

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Number(f64),
    Bool(bool),
    Str(EcoString),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<Dict>>),
    Instance(Rc<Instance>),
    /// Reference to a class, used as the receiver of static members.
    Class(ClassId),
    /// The built-in system object `z`.
    System,
}

impl Value {
    /// Unset variables, fields and statics read as this.
    pub const ZERO: Value = Value::Number(0.0);

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(dict: Dict) -> Self {
        Value::Map(Rc::new(RefCell::new(dict)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Instance(_) => "object",
            Value::Class(_) => "class",
            Value::System => "system",
        }
    }

    /// `null`, `false`, zero, empty strings and empty collections are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Number(n) => *n != 0.0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Map(dict) => !dict.borrow().is_empty(),
            Value::Instance(_) | Value::Class(_) | Value::System => true,
        }
    }

    /// Numeric view used by arithmetic and ordering. Booleans count as
    /// `0`/`1` and class references as their id.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Class(id) => Some(id.0 as f64),
            _ => None,
        }
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Nil => Value::Nil,
            Constant::Number(n) => Value::Number(*n),
            Constant::Str(s) => Value::Str(s.clone()),
            Constant::Class(id) => Value::Class(*id),
            Constant::System => Value::System,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

/// Collections entered by an in-progress comparison or rendering. A value
/// met again while still open is a cycle.
type Open = Vec<*const ()>;

fn address<T>(rc: &Rc<T>) -> *const () {
    Rc::as_ptr(rc).cast()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other, &mut Vec::new())
    }
}

/// Structural equality. A pair of collections compared again inside its own
/// comparison is taken as equal.
fn equal(a: &Value, b: &Value, open: &mut Vec<(*const (), *const ())>) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) | (Value::System, Value::System) => true,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(x), Value::List(y)) => {
            let pair = (address(x), address(y));
            if Rc::ptr_eq(x, y) || open.contains(&pair) {
                return true;
            }
            open.push(pair);
            let (x, y) = (x.borrow(), y.borrow());
            let same =
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| equal(a, b, open));
            open.pop();
            same
        }
        (Value::Map(x), Value::Map(y)) => {
            let pair = (address(x), address(y));
            if Rc::ptr_eq(x, y) || open.contains(&pair) {
                return true;
            }
            open.push(pair);
            let same = x.borrow().equal(&y.borrow(), open);
            open.pop();
            same
        }
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        (a, b) => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 {
        // Avoids printing negative zero.
        write!(f, "0")
    } else {
        write!(f, "{n}")
    }
}

/// Writes `value`, printing `[...]` or `{...}` for a collection that is
/// already being written further up.
fn render(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    debug: bool,
    open: &mut Open,
) -> fmt::Result {
    match value {
        Value::Nil => write!(f, "null"),
        Value::Number(n) => write_number(f, *n),
        Value::Bool(b) => write!(f, "{b}"),
        Value::Str(s) if debug => write!(f, "{s:?}"),
        Value::Str(s) => write!(f, "{s}"),
        Value::List(items) => {
            let at = address(items);
            if open.contains(&at) {
                return write!(f, "[...]");
            }
            open.push(at);
            write!(f, "[")?;
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(item, f, debug, open)?;
            }
            open.pop();
            write!(f, "]")
        }
        Value::Map(dict) => {
            let at = address(dict);
            if open.contains(&at) {
                return write!(f, "{{...}}");
            }
            open.push(at);
            write!(f, "{{")?;
            for (i, (key, value)) in dict.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(key, f, debug, open)?;
                write!(f, ": ")?;
                render(value, f, debug, open)?;
            }
            open.pop();
            write!(f, "}}")
        }
        Value::Instance(instance) => write!(f, "Object#{}", instance.class().id),
        Value::Class(id) if debug => write!(f, "Class({id})"),
        Value::Class(id) => write!(f, "{id}"),
        Value::System => write!(f, "<system>"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, false, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, true, &mut Vec::new())
    }
}

/// Insertion-ordered map from hashable values to values.
#[derive(Clone, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
    index: HashMap<MapKey, usize>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces; a replaced key keeps its original position.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), Fault> {
        let hashed = MapKey::of(&key)?;
        match self.index.get(&hashed) {
            Some(&at) => self.entries[at].1 = value,
            None => {
                self.index.insert(hashed, self.entries.len());
                self.entries.push((key, value));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &Value) -> Result<Option<&Value>, Fault> {
        let hashed = MapKey::of(key)?;
        Ok(self.index.get(&hashed).map(|&at| &self.entries[at].1))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl Dict {
    /// Same keys mapping to equal values, in any order.
    fn equal(&self, other: &Self, open: &mut Vec<(*const (), *const ())>) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, value)| match other.get(key) {
                Ok(Some(v)) => equal(value, v, open),
                _ => false,
            })
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other, &mut Vec::new())
    }
}

/// Hash identity of a map key. Values that compare equal share a key, so
/// `1`, `1.0` and `true` address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MapKey {
    Nil,
    Number(u64),
    Str(EcoString),
    Instance(usize),
    System,
}

impl MapKey {
    fn of(value: &Value) -> Result<MapKey, Fault> {
        Ok(match value {
            Value::Nil => MapKey::Nil,
            Value::Str(s) => MapKey::Str(s.clone()),
            Value::Instance(instance) => MapKey::Instance(Rc::as_ptr(instance) as usize),
            Value::System => MapKey::System,
            Value::List(_) | Value::Map(_) => return Err(Fault::UnhashableKey(value.type_name())),
            Value::Number(_) | Value::Bool(_) | Value::Class(_) => {
                let n = value.as_number().unwrap_or_default();
                // Collapse -0.0 onto 0.0.
                let n = if n == 0.0 { 0.0 } else { n };
                MapKey::Number(n.to_bits())
            }
        })
    }
}
