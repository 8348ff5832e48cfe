//! JSON conversion: weave_json, unweave_json
//!
//! Bridges interpreter values and JSON text. Runes, potions, scrolls,
//! charms, void, tomes, and grimoires round-trip; callables and opaque
//! handles have no JSON form.

use super::{define_native, expect_scroll};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Key, Value};
use indexmap::IndexMap;
use serde_json::{Map, Number};
use std::rc::Rc;

fn to_json(value: &Value, seen: &mut Vec<*const ()>) -> Result<serde_json::Value, HexError> {
    match value {
        Value::Void => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::Number((*n).into())),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| HexError::forbidden("weave_json: cannot weave a non-finite potion")),
        Value::Str(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Tome(items) => {
            let ptr = Rc::as_ptr(items) as *const ();
            if seen.contains(&ptr) {
                return Err(HexError::forbidden(
                    "weave_json: cannot weave a self-referencing tome",
                ));
            }
            seen.push(ptr);
            let array = items
                .borrow()
                .iter()
                .map(|item| to_json(item, seen))
                .collect::<Result<Vec<_>, _>>()?;
            seen.pop();
            Ok(serde_json::Value::Array(array))
        }
        Value::Grimoire(map) => {
            let ptr = Rc::as_ptr(map) as *const ();
            if seen.contains(&ptr) {
                return Err(HexError::forbidden(
                    "weave_json: cannot weave a self-referencing grimoire",
                ));
            }
            seen.push(ptr);
            let mut object = Map::new();
            for (key, val) in map.borrow().iter() {
                let key = match key {
                    Key::Str(s) => s.clone(),
                    Key::Int(n) => n.to_string(),
                    Key::Bool(b) => b.to_string(),
                };
                object.insert(key, to_json(val, seen)?);
            }
            seen.pop();
            Ok(serde_json::Value::Object(object))
        }
        other => Err(HexError::forbidden(format!(
            "weave_json: cannot weave a {}",
            other.type_name()
        ))),
    }
}

fn from_json(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Void,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => {
            Value::tome(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(object) => {
            let mut map = IndexMap::with_capacity(object.len());
            for (key, val) in object {
                map.insert(Key::Str(key), from_json(val));
            }
            Value::grimoire(map)
        }
    }
}

/// Serializes a value to JSON text.
pub fn builtin_weave_json(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let json = to_json(&args[0], &mut Vec::new())?;
    Ok(Value::Str(json.to_string()))
}

/// Parses JSON text into a value.
pub fn builtin_unweave_json(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let text = expect_scroll("unweave_json", args, 0)?;
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| HexError::scroll(format!("Damaged JSON: {}", e)))?;
    Ok(from_json(json))
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "weave_json", Arity::Exact(1), builtin_weave_json);
    define_native(env, "unweave_json", Arity::Exact(1), builtin_unweave_json);
}
