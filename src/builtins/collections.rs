//! Collection helpers: extend_tome, shrink_tome, scry_keys, scry_values, banish_key

use super::{define_native, expect_grimoire, expect_tome};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Key, Value};
use std::rc::Rc;

/// Appends a value to a tome in place. Returns the tome.
pub fn builtin_extend_tome(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let tome = expect_tome("extend_tome", args, 0)?;
    tome.borrow_mut().push(args[1].clone());
    Ok(args[0].clone())
}

/// Removes and returns the last element of a tome.
pub fn builtin_shrink_tome(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let tome = expect_tome("shrink_tome", args, 0)?;
    let popped = tome.borrow_mut().pop();
    popped.ok_or_else(|| HexError::forbidden("shrink_tome: the tome is empty"))
}

/// Returns a grimoire's keys as a fresh tome, in insertion order.
pub fn builtin_scry_keys(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let map = expect_grimoire("scry_keys", args, 0)?;
    let keys = map.borrow().keys().map(Key::to_value).collect();
    Ok(Value::tome(keys))
}

/// Returns a grimoire's values as a fresh tome, in insertion order.
pub fn builtin_scry_values(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let map = expect_grimoire("scry_values", args, 0)?;
    let values = map.borrow().values().cloned().collect();
    Ok(Value::tome(values))
}

/// Removes a key from a grimoire and returns the value it held.
pub fn builtin_banish_key(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let map = expect_grimoire("banish_key", args, 0)?;
    let key = Key::from_value(&args[1])?;
    let result = map.borrow_mut().shift_remove(&key).ok_or_else(|| {
        HexError::forbidden(format!(
            "banish_key: key '{}' not found in grimoire",
            args[1].to_text()
        ))
    });
    result
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "extend_tome", Arity::Exact(2), builtin_extend_tome);
    define_native(env, "shrink_tome", Arity::Exact(1), builtin_shrink_tome);
    define_native(env, "scry_keys", Arity::Exact(1), builtin_scry_keys);
    define_native(env, "scry_values", Arity::Exact(1), builtin_scry_values);
    define_native(env, "banish_key", Arity::Exact(2), builtin_banish_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn realm() -> Realm {
        Realm::with_parts(Box::new(std::io::sink()), Box::new(crate::realm::ConsoleVoice), 7)
    }

    fn sample_grimoire() -> Value {
        let mut map = IndexMap::new();
        map.insert(Key::Str("hp".into()), Value::Int(50));
        map.insert(Key::Str("mp".into()), Value::Int(20));
        Value::grimoire(map)
    }

    #[test]
    fn test_extend_and_shrink_mutate_in_place() {
        let mut r = realm();
        let tome = Value::tome(vec![Value::Int(1)]);

        builtin_extend_tome(&mut r, &[tome.clone(), Value::Int(2)]).unwrap();
        assert!(tome.structural_eq(&Value::tome(vec![Value::Int(1), Value::Int(2)])));

        let popped = builtin_shrink_tome(&mut r, &[tome.clone()]).unwrap();
        assert!(matches!(popped, Value::Int(2)));
        assert!(tome.structural_eq(&Value::tome(vec![Value::Int(1)])));
    }

    #[test]
    fn test_shrink_empty_tome_fails() {
        let mut r = realm();
        let err = builtin_shrink_tome(&mut r, &[Value::tome(vec![])]).unwrap_err();
        assert!(err.to_string().contains("the tome is empty"));
    }

    #[test]
    fn test_scry_keys_and_values_keep_order() {
        let mut r = realm();
        let g = sample_grimoire();

        let keys = builtin_scry_keys(&mut r, &[g.clone()]).unwrap();
        assert!(keys.structural_eq(&Value::tome(vec![
            Value::Str("hp".into()),
            Value::Str("mp".into()),
        ])));

        let values = builtin_scry_values(&mut r, &[g]).unwrap();
        assert!(values.structural_eq(&Value::tome(vec![Value::Int(50), Value::Int(20)])));
    }

    #[test]
    fn test_banish_key() {
        let mut r = realm();
        let g = sample_grimoire();

        let removed =
            builtin_banish_key(&mut r, &[g.clone(), Value::Str("hp".into())]).unwrap();
        assert!(matches!(removed, Value::Int(50)));

        let err = builtin_banish_key(&mut r, &[g, Value::Str("hp".into())]).unwrap_err();
        assert!(err.to_string().contains("key 'hp' not found"));
    }

    #[test]
    fn test_type_errors() {
        let mut r = realm();
        assert!(builtin_extend_tome(&mut r, &[Value::Int(1), Value::Int(2)]).is_err());
        assert!(builtin_scry_keys(&mut r, &[Value::tome(vec![])]).is_err());
    }
}
