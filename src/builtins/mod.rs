//! # Native Function Library
//!
//! The natives published into the root environment before evaluation begins,
//! organized by category:
//!
//! - **[console]**: scribe, scribe_line, beseech
//! - **[speech]**: chant
//! - **[types]**: essence, measure, as_rune, as_potion, as_scroll
//! - **[collections]**: extend_tome, shrink_tome, scry_keys, scry_values, banish_key
//! - **[strings]**: shatter, bind_scrolls, exalt, diminish
//! - **[files]**: inscribe_scroll, decipher_scroll, scroll_exists, burn_scroll
//! - **[network]**: open_portal, send_through_portal
//! - **[database]**: awaken_oracle, decree_oracle, consult_oracle, silence_oracle
//! - **[json]**: weave_json, unweave_json
//! - **[quest]**: forge_hero, roll_destiny, inflict_wound, rest, moment
//!
//! Each category registers through its own `register` function. Handlers
//! receive the realm (the interpreter's explicit native state) plus the
//! evaluated argument vector, and raise taxonomy errors as their only
//! failure channel.

use crate::env::Environment;
use crate::error::HexError;
use crate::value::{Arity, NativeFn, NativeHandler, Value};
use std::rc::Rc;

pub mod collections;
pub mod console;
pub mod database;
pub mod files;
pub mod json;
pub mod network;
pub mod quest;
pub mod speech;
pub mod strings;
pub mod types;

/// Register every native category in the environment.
pub fn register_builtins(env: &Rc<Environment>) {
    console::register(env);
    speech::register(env);
    types::register(env);
    collections::register(env);
    strings::register(env);
    files::register(env);
    network::register(env);
    database::register(env);
    json::register(env);
    quest::register(env);
}

/// Publish one native into the environment.
pub(crate) fn define_native(
    env: &Rc<Environment>,
    name: &'static str,
    arity: Arity,
    func: NativeHandler,
) {
    env.define(name, Value::Builtin(Rc::new(NativeFn { name, arity, func })), false);
}

// ============ Argument extraction helpers ============

pub(crate) fn expect_scroll<'a>(
    function: &str,
    args: &'a [Value],
    position: usize,
) -> Result<&'a str, HexError> {
    match &args[position] {
        Value::Str(s) => Ok(s),
        other => Err(HexError::forbidden(format!(
            "{}: expected a scroll, got {}",
            function,
            other.type_name()
        ))),
    }
}

pub(crate) fn expect_rune(
    function: &str,
    args: &[Value],
    position: usize,
) -> Result<i64, HexError> {
    match &args[position] {
        Value::Int(n) => Ok(*n),
        other => Err(HexError::forbidden(format!(
            "{}: expected a rune, got {}",
            function,
            other.type_name()
        ))),
    }
}

pub(crate) fn expect_tome(
    function: &str,
    args: &[Value],
    position: usize,
) -> Result<Rc<std::cell::RefCell<Vec<Value>>>, HexError> {
    match &args[position] {
        Value::Tome(items) => Ok(items.clone()),
        other => Err(HexError::forbidden(format!(
            "{}: expected a tome, got {}",
            function,
            other.type_name()
        ))),
    }
}

pub(crate) fn expect_grimoire(
    function: &str,
    args: &[Value],
    position: usize,
) -> Result<Rc<std::cell::RefCell<indexmap::IndexMap<crate::value::Key, Value>>>, HexError> {
    match &args[position] {
        Value::Grimoire(map) => Ok(map.clone()),
        other => Err(HexError::forbidden(format!(
            "{}: expected a grimoire, got {}",
            function,
            other.type_name()
        ))),
    }
}
