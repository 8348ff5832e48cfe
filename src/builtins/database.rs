//! Database access: awaken_oracle, decree_oracle, consult_oracle, silence_oracle
//!
//! SQLite-backed. `awaken_oracle` opens a connection and returns an opaque
//! handle; the connection itself lives in the realm's handle table and is
//! released only by `silence_oracle`. Query results come back as a tome of
//! grimoires, one per row, keyed by column name.

use super::{define_native, expect_scroll};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Handle, Key, Value};
use indexmap::IndexMap;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::rc::Rc;

fn expect_oracle(function: &str, args: &[Value], position: usize) -> Result<u64, HexError> {
    match &args[position] {
        Value::Opaque(handle) if handle.kind == "oracle" => Ok(handle.id),
        other => Err(HexError::oracle(format!(
            "{}: expected an oracle handle, got {}",
            function,
            other.type_name()
        ))),
    }
}

fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Void,
        ValueRef::Integer(n) => Value::Int(n),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Str(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Str(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Opens (or creates) a SQLite database and returns an oracle handle.
pub fn builtin_awaken_oracle(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let path = expect_scroll("awaken_oracle", args, 0)?;
    let conn = Connection::open(path)
        .map_err(|e| HexError::oracle(format!("The oracle at '{}' will not wake: {}", path, e)))?;
    let id = realm.store_oracle(conn);
    Ok(Value::Opaque(Rc::new(Handle { kind: "oracle", id })))
}

/// Executes a statement (CREATE, INSERT, UPDATE, DELETE). Returns the
/// affected row count.
pub fn builtin_decree_oracle(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let id = expect_oracle("decree_oracle", args, 0)?;
    let sql = expect_scroll("decree_oracle", args, 1)?;

    let changed = realm
        .oracle(id)?
        .execute(sql, [])
        .map_err(|e| HexError::oracle(format!("The oracle rejects the decree: {}", e)))?;
    Ok(Value::Int(changed as i64))
}

/// Runs a SELECT and returns a tome of row grimoires.
pub fn builtin_consult_oracle(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let id = expect_oracle("consult_oracle", args, 0)?;
    let sql = expect_scroll("consult_oracle", args, 1)?;

    let conn = realm.oracle(id)?;
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| HexError::oracle(format!("The oracle cannot read the question: {}", e)))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = stmt
        .query([])
        .map_err(|e| HexError::oracle(format!("The oracle gives no answer: {}", e)))?;

    let mut result = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| HexError::oracle(format!("The oracle's answer broke off: {}", e)))?
    {
        let mut record = IndexMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let value = row
                .get_ref(i)
                .map_err(|e| HexError::oracle(format!("The oracle's answer broke off: {}", e)))?;
            record.insert(Key::Str(column.clone()), column_value(value));
        }
        result.push(Value::grimoire(record));
    }

    Ok(Value::tome(result))
}

/// Closes an oracle. The handle is dead afterwards.
pub fn builtin_silence_oracle(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let id = expect_oracle("silence_oracle", args, 0)?;
    realm.close_oracle(id)?;
    Ok(Value::Void)
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "awaken_oracle", Arity::Exact(1), builtin_awaken_oracle);
    define_native(env, "decree_oracle", Arity::Exact(2), builtin_decree_oracle);
    define_native(env, "consult_oracle", Arity::Exact(2), builtin_consult_oracle);
    define_native(env, "silence_oracle", Arity::Exact(1), builtin_silence_oracle);
}
