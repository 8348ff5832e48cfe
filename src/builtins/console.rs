//! Console I/O: scribe, scribe_line, beseech
//!
//! Output goes through the realm sink so embedders and tests can capture it.
//! Values print in their plain textual form (scrolls lose their quotes),
//! space-separated.

use super::define_native;
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Value};
use std::io::{self, BufRead, Write};
use std::rc::Rc;

fn write_values(realm: &mut Realm, args: &[Value], newline: bool) -> Result<(), HexError> {
    let mut text = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(&arg.to_text());
    }
    if newline {
        text.push('\n');
    }
    realm
        .out
        .write_all(text.as_bytes())
        .and_then(|_| realm.out.flush())
        .map_err(|e| HexError::scroll(format!("Failed to scribe: {}", e)))
}

/// Writes values without a trailing newline. Returns void.
pub fn builtin_scribe(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    write_values(realm, args, false)?;
    Ok(Value::Void)
}

/// Writes values followed by a newline. Returns void.
pub fn builtin_scribe_line(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    write_values(realm, args, true)?;
    Ok(Value::Void)
}

/// Writes a prompt, then reads one line from standard input. The trailing
/// line break is stripped.
pub fn builtin_beseech(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let prompt = super::expect_scroll("beseech", args, 0)?;
    realm
        .out
        .write_all(prompt.as_bytes())
        .and_then(|_| realm.out.flush())
        .map_err(|e| HexError::scroll(format!("Failed to scribe: {}", e)))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| HexError::scroll(format!("Failed to read answer: {}", e)))?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Value::Str(line))
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "scribe", Arity::Variadic, builtin_scribe);
    define_native(env, "scribe_line", Arity::Variadic, builtin_scribe_line);
    define_native(env, "beseech", Arity::Exact(1), builtin_beseech);
}
