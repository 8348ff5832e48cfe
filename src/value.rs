// ABOUTME: Runtime value model: the tagged variant every HexScript expression produces

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A grimoire key. Restricted to the hashable scalars; potions are rejected
/// because IEEE-754 equality makes them unreliable map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl Key {
    pub fn from_value(value: &Value) -> Result<Key, HexError> {
        match value {
            Value::Int(n) => Ok(Key::Int(*n)),
            Value::Str(s) => Ok(Key::Str(s.clone())),
            Value::Bool(b) => Ok(Key::Bool(*b)),
            other => Err(HexError::forbidden(format!(
                "Grimoire keys must be runes, scrolls, or charms, not {}",
                other.type_name()
            ))),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::Int(*n),
            Key::Str(s) => Value::Str(s.clone()),
            Key::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "\"{}\"", s),
            Key::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// How many arguments a native accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Variadic,
}

/// Handler signature for natives: the realm (explicit native state) plus the
/// already-evaluated argument vector.
pub type NativeHandler = fn(&mut Realm, &[Value]) -> Result<Value, HexError>;

/// A user-defined spell or incantation.
#[derive(Debug)]
pub struct SpellFn {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub closure: Rc<Environment>,
    /// Incantations speak their non-void return value through the realm voice.
    pub auto_speak: bool,
}

/// A native function registered into the root environment.
pub struct NativeFn {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeHandler,
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// An opaque resource handle. The resource itself lives in a realm table
/// keyed by `id`; the language only passes the handle around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    pub kind: &'static str,
    pub id: u64,
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Void,
    Tome(Rc<RefCell<Vec<Value>>>),
    Grimoire(Rc<RefCell<IndexMap<Key, Value>>>),
    Spell(Rc<SpellFn>),
    Builtin(Rc<NativeFn>),
    Opaque(Rc<Handle>),
}

impl Value {
    pub fn tome(items: Vec<Value>) -> Value {
        Value::Tome(Rc::new(RefCell::new(items)))
    }

    pub fn grimoire(map: IndexMap<Key, Value>) -> Value {
        Value::Grimoire(Rc::new(RefCell::new(map)))
    }

    /// The language-level type name, used in diagnostics and by `essence`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "rune",
            Value::Float(_) => "potion",
            Value::Str(_) => "scroll",
            Value::Bool(_) => "charm",
            Value::Void => "void",
            Value::Tome(_) => "tome",
            Value::Grimoire(_) => "grimoire",
            Value::Spell(f) => {
                if f.auto_speak {
                    "incantation"
                } else {
                    "spell"
                }
            }
            Value::Builtin(_) => "builtin",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Truthiness: void is false, charms are themselves, numbers are non-zero,
    /// scrolls/tomes/grimoires are non-empty, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Void => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Tome(items) => !items.borrow().is_empty(),
            Value::Grimoire(map) => !map.borrow().is_empty(),
            _ => true,
        }
    }

    /// Structural equality. Runes and potions compare numerically; tomes and
    /// grimoires compare element-wise; callables and opaques by identity.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Void, Value::Void) => true,
            (Value::Tome(a), Value::Tome(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Grimoire(a), Value::Grimoire(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.get(k).map(|other| v.structural_eq(other)).unwrap_or(false)
                    })
            }
            (Value::Spell(a), Value::Spell(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Plain textual form: like `Display`, but a bare scroll loses its
    /// quotes. This is what `scribe`, the voice, and string concatenation use.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn fmt_value(value: &Value, seen: &mut Vec<*const ()>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Int(n) => write!(f, "{}", n),
        Value::Float(n) => {
            // A potion always reads as a potion, even when integral
            if n.fract() == 0.0 && n.is_finite() {
                write!(f, "{:.1}", n)
            } else {
                write!(f, "{}", n)
            }
        }
        Value::Str(s) => write!(f, "\"{}\"", s),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Void => write!(f, "void"),
        Value::Tome(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            if seen.contains(&ptr) {
                return write!(f, "[...]");
            }
            seen.push(ptr);
            write!(f, "tome [")?;
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                fmt_value(item, seen, f)?;
            }
            write!(f, "]")?;
            seen.pop();
            Ok(())
        }
        Value::Grimoire(map) => {
            let ptr = Rc::as_ptr(map) as *const ();
            if seen.contains(&ptr) {
                return write!(f, "{{...}}");
            }
            seen.push(ptr);
            write!(f, "grimoire {{")?;
            for (i, (key, val)) in map.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: ", key)?;
                fmt_value(val, seen, f)?;
            }
            write!(f, "}}")?;
            seen.pop();
            Ok(())
        }
        Value::Spell(func) => {
            if func.auto_speak {
                write!(f, "<incantation {}>", func.name)
            } else {
                write!(f, "<spell {}>", func.name)
            }
        }
        Value::Builtin(native) => write!(f, "<builtin {}>", native.name),
        Value::Opaque(handle) => write!(f, "<{} {}>", handle.kind, handle.id),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_value(self, &mut Vec::new(), f)
    }
}
