//! Speech: chant
//!
//! Routes text through the realm voice, the same collaborator incantations
//! speak their return values through.

use super::define_native;
use crate::env::Environment;
use crate::error::HexError;
use crate::realm::Realm;
use crate::value::{Arity, Value};
use std::rc::Rc;

/// Speaks a value aloud. Returns void.
pub fn builtin_chant(realm: &mut Realm, args: &[Value]) -> Result<Value, HexError> {
    realm.voice.speak(&args[0].to_text())?;
    Ok(Value::Void)
}

pub fn register(env: &Rc<Environment>) {
    define_native(env, "chant", Arity::Exact(1), builtin_chant);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Voice;
    use std::cell::RefCell;
    use std::io;

    struct RecordingVoice(Rc<RefCell<Vec<String>>>);

    impl Voice for RecordingVoice {
        fn speak(&mut self, text: &str) -> Result<(), HexError> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    struct MuteVoice;

    impl Voice for MuteVoice {
        fn speak(&mut self, _text: &str) -> Result<(), HexError> {
            Err(HexError::silenced("The voice device is unavailable"))
        }
    }

    #[test]
    fn test_chant_speaks_plain_text() {
        let spoken = Rc::new(RefCell::new(Vec::new()));
        let mut realm = Realm::with_parts(
            Box::new(io::sink()),
            Box::new(RecordingVoice(spoken.clone())),
            7,
        );
        builtin_chant(&mut realm, &[Value::Str("by the hoary hosts".into())]).unwrap();
        builtin_chant(&mut realm, &[Value::Int(3)]).unwrap();
        assert_eq!(*spoken.borrow(), vec!["by the hoary hosts", "3"]);
    }

    #[test]
    fn test_chant_surfaces_voice_failure() {
        let mut realm = Realm::with_parts(Box::new(io::sink()), Box::new(MuteVoice), 7);
        let err = builtin_chant(&mut realm, &[Value::Str("hello".into())]).unwrap_err();
        assert!(err.to_string().contains("Voice Silenced!"));
    }
}
