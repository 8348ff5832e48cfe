//! File I/O: inscribe_scroll, decipher_scroll, scroll_exists, burn_scroll
//!
//! Whole-file operations on UTF-8 text. All failures surface as
//! `ScrollDamaged` with the offending path in the message.

use super::{define_native, expect_scroll};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Value};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Writes text to a file, replacing any existing contents. Returns void.
pub fn builtin_inscribe_scroll(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let path = expect_scroll("inscribe_scroll", args, 0)?;
    let text = args[1].to_text();
    fs::write(path, text)
        .map_err(|e| HexError::scroll(format!("Failed to inscribe '{}': {}", path, e)))?;
    Ok(Value::Void)
}

/// Reads a file's contents as a scroll.
pub fn builtin_decipher_scroll(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let path = expect_scroll("decipher_scroll", args, 0)?;
    fs::read_to_string(path)
        .map(Value::Str)
        .map_err(|e| HexError::scroll(format!("Failed to decipher '{}': {}", path, e)))
}

/// True if the path names an existing file or directory.
pub fn builtin_scroll_exists(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let path = expect_scroll("scroll_exists", args, 0)?;
    Ok(Value::Bool(Path::new(path).exists()))
}

/// Deletes a file. Returns void.
pub fn builtin_burn_scroll(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let path = expect_scroll("burn_scroll", args, 0)?;
    fs::remove_file(path)
        .map_err(|e| HexError::scroll(format!("Failed to burn '{}': {}", path, e)))?;
    Ok(Value::Void)
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "inscribe_scroll", Arity::Exact(2), builtin_inscribe_scroll);
    define_native(env, "decipher_scroll", Arity::Exact(1), builtin_decipher_scroll);
    define_native(env, "scroll_exists", Arity::Exact(1), builtin_scroll_exists);
    define_native(env, "burn_scroll", Arity::Exact(1), builtin_burn_scroll);
}
