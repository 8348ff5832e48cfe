// ABOUTME: The Realm: explicit state shared by native functions (output, voice, rng, handles)

use crate::error::HexError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::{self, Write};

/// The speech collaborator behind incantations and `chant`.
pub trait Voice {
    fn speak(&mut self, text: &str) -> Result<(), HexError>;
}

/// Default voice: no speech device is assumed, so spoken text is echoed to
/// stdout with a marker, the way a headless install behaves.
pub struct ConsoleVoice;

impl Voice for ConsoleVoice {
    fn speak(&mut self, text: &str) -> Result<(), HexError> {
        println!("[Speaking]: {}", text);
        Ok(())
    }
}

/// Ambient state owned by the interpreter and passed to every native
/// handler. Constructed once at startup; nothing in here is global.
pub struct Realm {
    /// Sink for console natives. Stdout normally, a buffer under test.
    pub out: Box<dyn Write>,
    pub voice: Box<dyn Voice>,
    pub rng: StdRng,
    oracles: HashMap<u64, Connection>,
    next_handle: u64,
}

impl Realm {
    pub fn new() -> Self {
        Realm {
            out: Box::new(io::stdout()),
            voice: Box::new(ConsoleVoice),
            rng: StdRng::from_entropy(),
            oracles: HashMap::new(),
            next_handle: 1,
        }
    }

    /// A realm with substituted collaborators and a fixed rng seed, for
    /// tests and embedders.
    pub fn with_parts(out: Box<dyn Write>, voice: Box<dyn Voice>, seed: u64) -> Self {
        Realm {
            out,
            voice,
            rng: StdRng::seed_from_u64(seed),
            oracles: HashMap::new(),
            next_handle: 1,
        }
    }

    // ===== Oracle (database connection) handle table =====

    pub fn store_oracle(&mut self, conn: Connection) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        self.oracles.insert(id, conn);
        id
    }

    pub fn oracle(&self, id: u64) -> Result<&Connection, HexError> {
        self.oracles
            .get(&id)
            .ok_or_else(|| HexError::oracle(format!("No awakened oracle with handle {}", id)))
    }

    pub fn close_oracle(&mut self, id: u64) -> Result<(), HexError> {
        self.oracles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| HexError::oracle(format!("No awakened oracle with handle {}", id)))
    }
}

impl Default for Realm {
    fn default() -> Self {
        Realm::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_handles_are_distinct() {
        let mut realm = Realm::new();
        let a = realm.store_oracle(Connection::open_in_memory().unwrap());
        let b = realm.store_oracle(Connection::open_in_memory().unwrap());
        assert_ne!(a, b);
        assert!(realm.oracle(a).is_ok());
        assert!(realm.oracle(b).is_ok());
    }

    #[test]
    fn test_closed_oracle_is_gone() {
        let mut realm = Realm::new();
        let id = realm.store_oracle(Connection::open_in_memory().unwrap());
        realm.close_oracle(id).unwrap();
        assert!(realm.oracle(id).is_err());
        assert!(realm.close_oracle(id).is_err());
    }
}
