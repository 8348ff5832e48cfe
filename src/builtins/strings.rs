//! Scroll helpers: shatter, bind_scrolls, exalt, diminish

use super::{define_native, expect_scroll, expect_tome};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Value};
use std::rc::Rc;

/// Splits a scroll on a separator into a tome of scrolls. An empty
/// separator splits into individual characters.
pub fn builtin_shatter(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let text = expect_scroll("shatter", args, 0)?;
    let sep = expect_scroll("shatter", args, 1)?;

    let pieces: Vec<Value> = if sep.is_empty() {
        text.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        text.split(sep).map(|s| Value::Str(s.to_string())).collect()
    };
    Ok(Value::tome(pieces))
}

/// Joins a tome's elements into one scroll with a separator between them.
pub fn builtin_bind_scrolls(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let tome = expect_tome("bind_scrolls", args, 0)?;
    let sep = expect_scroll("bind_scrolls", args, 1)?;

    let joined = tome
        .borrow()
        .iter()
        .map(Value::to_text)
        .collect::<Vec<_>>()
        .join(sep);
    Ok(Value::Str(joined))
}

/// Uppercases a scroll.
pub fn builtin_exalt(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let text = expect_scroll("exalt", args, 0)?;
    Ok(Value::Str(text.to_uppercase()))
}

/// Lowercases a scroll.
pub fn builtin_diminish(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let text = expect_scroll("diminish", args, 0)?;
    Ok(Value::Str(text.to_lowercase()))
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "shatter", Arity::Exact(2), builtin_shatter);
    define_native(env, "bind_scrolls", Arity::Exact(2), builtin_bind_scrolls);
    define_native(env, "exalt", Arity::Exact(1), builtin_exalt);
    define_native(env, "diminish", Arity::Exact(1), builtin_diminish);
}
