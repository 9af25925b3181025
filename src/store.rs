use crate::engine::Engine;
use crate::error::Error;
use crate::token::Primitive;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A string key-value store owned by the embedding application
pub trait KeyValueStore {
    /// Get the value stored under `key`
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: String);
}

/// A [`KeyValueStore`] kept in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }
}

impl Engine {
    /// Save the program under `key`, as a JSON array of numbers and strings.
    ///
    /// JSON has no infinities nor `NaN`: a program holding such an operand is
    /// refused with [`Error::Persistence`] and the store is left untouched.
    ///
    /// ```
    /// use keycalc::{Engine, KeyValueStore, MemoryStore};
    ///
    /// let mut engine = Engine::new();
    /// engine.set_operand(7.0);
    /// engine.perform_operation("+");
    ///
    /// let mut store = MemoryStore::new();
    /// engine.save_state(&mut store, "calculator").unwrap();
    /// assert_eq!(store.get("calculator").unwrap(), r#"[7.0,"+"]"#);
    ///
    /// let mut restored = Engine::new();
    /// assert_eq!(restored.load_state(&store, "calculator"), Ok(true));
    /// assert_eq!(restored.evaluate(), engine.evaluate());
    /// ```
    pub fn save_state<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        key: &str,
    ) -> Result<(), Error> {
        let program = self.program();
        let non_finite = program.iter().find_map(|primitive| match *primitive {
            Primitive::Number(value) if !value.is_finite() => Some(value),
            _ => None,
        });
        if let Some(value) = non_finite {
            warn!(key, value, "refusing to save a non-finite operand");
            return Err(Error::Persistence(format!(
                "cannot store non-finite operand {}",
                value
            )));
        }
        let text = serde_json::to_string(&program)?;
        store.set(key, text);
        debug!(key, tokens = program.len(), "saved program");
        Ok(())
    }

    /// Replace the program with the one saved under `key`.
    ///
    /// Returns `Ok(false)` and leaves the engine untouched when nothing is
    /// stored under `key`. Variable bindings are never changed.
    pub fn load_state<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &S,
        key: &str,
    ) -> Result<bool, Error> {
        let text = match store.get(key) {
            Some(text) => text,
            None => {
                debug!(key, "no saved program");
                return Ok(false);
            }
        };
        let program: Vec<Primitive> = serde_json::from_str(&text)?;
        info!(key, tokens = program.len(), "loaded program");
        self.set_program(program);
        Ok(true)
    }
}
