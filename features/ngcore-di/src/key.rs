use std::{
    collections::HashMap,
    fmt::Display,
    hash::{Hash, Hasher},
    sync::LazyLock,
};

use parking_lot::Mutex;

use crate::token::Token;

/// Id handed out for the first token after creation or [`KeyRegistry::reset`]
pub const FIRST_KEY_ID: u32 = 1;

static GLOBAL_KEY_REGISTRY: LazyLock<Mutex<KeyRegistry>> =
    LazyLock::new(|| Mutex::new(KeyRegistry::new()));

/// Registry assigned identity of a [`Token`].
///
/// Keys compare and hash by their id only, so injectors can use them for map lookups.
#[derive(Debug, Clone)]
pub struct Key {
    id: u32,
    token: Token,
}

impl Key {
    /// Returns the key for `token` from the process wide registry
    pub fn get(token: impl Into<Token>) -> Key {
        GLOBAL_KEY_REGISTRY.lock().get(token.into())
    }

    /// Number of tokens known to the process wide registry
    pub fn number_of_keys() -> usize {
        GLOBAL_KEY_REGISTRY.lock().len()
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Key {}
impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.token, self.id)
    }
}

/// Maps tokens to keys, never reusing an id until reset
#[derive(Debug)]
pub struct KeyRegistry {
    keys: HashMap<Token, Key>,
    next_id: u32,
}
impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyRegistry {
    pub fn new() -> Self {
        KeyRegistry {
            keys: HashMap::new(),
            next_id: FIRST_KEY_ID,
        }
    }

    pub fn get(&mut self, token: Token) -> Key {
        if let Some(key) = self.keys.get(&token) {
            return key.clone();
        }

        let key = Key {
            id: self.next_id,
            token: token.clone(),
        };
        self.next_id += 1;
        tracing::trace!("Allocated key {key}");
        self.keys.insert(token, key.clone());
        key
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Forgets all tokens and restarts ids at [`FIRST_KEY_ID`].
    ///
    /// Keys handed out earlier become stale. Only meant for isolating tests.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.next_id = FIRST_KEY_ID;
    }
}

/// Resets the process wide registry, see [`KeyRegistry::reset`]
///
/// Must not run while any injector is resolving.
pub fn reset_global_registry() {
    GLOBAL_KEY_REGISTRY.lock().reset();
}
