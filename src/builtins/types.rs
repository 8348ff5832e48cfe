//! Type inspection and conversion: essence, measure, as_rune, as_potion, as_scroll

use super::define_native;
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Value};
use std::rc::Rc;

/// Returns the type name of a value as a scroll.
pub fn builtin_essence(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    Ok(Value::Str(args[0].type_name().to_string()))
}

/// Returns the length of a scroll (characters), tome (elements), or
/// grimoire (keys).
pub fn builtin_measure(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::Tome(items) => Ok(Value::Int(items.borrow().len() as i64)),
        Value::Grimoire(map) => Ok(Value::Int(map.borrow().len() as i64)),
        other => Err(HexError::forbidden(format!(
            "measure: cannot measure a {}",
            other.type_name()
        ))),
    }
}

/// Converts to a rune: potions truncate, scrolls parse, charms become 0/1.
pub fn builtin_as_rune(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            HexError::forbidden(format!("as_rune: cannot read '{}' as a rune", s))
        }),
        other => Err(HexError::forbidden(format!(
            "as_rune: cannot convert a {}",
            other.type_name()
        ))),
    }
}

/// Converts to a potion: runes widen, scrolls parse.
pub fn builtin_as_potion(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    match &args[0] {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            HexError::forbidden(format!("as_potion: cannot read '{}' as a potion", s))
        }),
        other => Err(HexError::forbidden(format!(
            "as_potion: cannot convert a {}",
            other.type_name()
        ))),
    }
}

/// Converts any value to its plain textual form.
pub fn builtin_as_scroll(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    Ok(Value::Str(args[0].to_text()))
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "essence", Arity::Exact(1), builtin_essence);
    define_native(env, "measure", Arity::Exact(1), builtin_measure);
    define_native(env, "as_rune", Arity::Exact(1), builtin_as_rune);
    define_native(env, "as_potion", Arity::Exact(1), builtin_as_potion);
    define_native(env, "as_scroll", Arity::Exact(1), builtin_as_scroll);
}
