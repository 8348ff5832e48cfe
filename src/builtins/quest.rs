//! Game-state helpers: forge_hero, roll_destiny, inflict_wound, rest, moment
//!
//! Dice come from the realm rng, so a seeded realm rolls deterministically.

use super::{define_native, expect_grimoire, expect_rune};
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Key, Value};
use indexmap::IndexMap;
use rand::Rng;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Creates a hero grimoire: name, 100 health, and 3d6 strength.
pub fn builtin_forge_hero(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let name = super::expect_scroll("forge_hero", args, 0)?;

    let strength: i64 = (0..3).map(|_| realm.rng.gen_range(1..=6)).sum();
    let mut hero = IndexMap::new();
    hero.insert(Key::Str("name".into()), Value::Str(name.to_string()));
    hero.insert(Key::Str("health".into()), Value::Int(100));
    hero.insert(Key::Str("strength".into()), Value::Int(strength));
    Ok(Value::grimoire(hero))
}

/// Rolls a die with the given number of sides, yielding 1..=sides.
pub fn builtin_roll_destiny(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let sides = expect_rune("roll_destiny", args, 0)?;
    if sides < 1 {
        return Err(HexError::quest("roll_destiny: the die needs at least one side"));
    }
    Ok(Value::Int(realm.rng.gen_range(1..=sides)))
}

/// Subtracts damage from a hero's health and returns the new health.
pub fn builtin_inflict_wound(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let hero = expect_grimoire("inflict_wound", args, 0)?;
    let damage = expect_rune("inflict_wound", args, 1)?;

    let health_key = Key::Str("health".into());
    let health = match hero.borrow().get(&health_key) {
        Some(Value::Int(n)) => *n,
        _ => return Err(HexError::quest("inflict_wound: the target has no health to lose")),
    };

    let remaining = health - damage;
    hero.borrow_mut().insert(health_key, Value::Int(remaining));
    Ok(Value::Int(remaining))
}

/// Sleeps for the given number of seconds (rune or potion). The whole
/// interpreter blocks for the duration.
pub fn builtin_rest(_realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    let seconds = match &args[0] {
        Value::Int(n) if *n >= 0 => *n as f64,
        Value::Float(f) if *f >= 0.0 => *f,
        _ => return Err(HexError::quest("rest: duration must be a non-negative number")),
    };
    thread::sleep(Duration::from_secs_f64(seconds));
    Ok(Value::Void)
}

/// The current Unix time in whole seconds.
pub fn builtin_moment(_realm: &mut Realm, _args: &[Value]) -> Result<Value, HexError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| HexError::quest(format!("moment: the clock ran backwards: {}", e)))?;
    Ok(Value::Int(now.as_secs() as i64))
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "forge_hero", Arity::Exact(1), builtin_forge_hero);
    define_native(env, "roll_destiny", Arity::Exact(1), builtin_roll_destiny);
    define_native(env, "inflict_wound", Arity::Exact(2), builtin_inflict_wound);
    define_native(env, "rest", Arity::Exact(1), builtin_rest);
    define_native(env, "moment", Arity::Exact(0), builtin_moment);
}
