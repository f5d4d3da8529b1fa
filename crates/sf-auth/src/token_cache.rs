//! Access-token storage keyed by profile name.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::oauth::TokenResponse;

/// Trait for token storage implementations.
pub trait TokenStorage: Send + Sync {
    /// Save a token, replacing any previous token for the key.
    fn save(&self, key: &str, token: &TokenResponse);

    /// Load a token.
    fn load(&self, key: &str) -> Option<TokenResponse>;

    /// Delete a token.
    fn delete(&self, key: &str);

    /// Check if a token exists.
    fn exists(&self, key: &str) -> bool {
        self.load(key).is_some()
    }

    /// List all stored token keys.
    fn list(&self) -> Vec<String>;
}

/// Process-memory token cache. Tokens never touch disk and are gone when
/// the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenCache {
    tokens: RwLock<HashMap<String, TokenResponse>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached token.
    pub fn clear(&self) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl TokenStorage for MemoryTokenCache {
    fn save(&self, key: &str, token: &TokenResponse) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), token.clone());
    }

    fn load(&self, key: &str) -> Option<TokenResponse> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn delete(&self, key: &str) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn exists(&self, key: &str) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn list(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}
