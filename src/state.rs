// src/state.rs
use crate::store::SharedStore;
use tower_cookies::Key;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    // Assina o cookie das mensagens flash
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(store: SharedStore, cookie_key: Key) -> Self {
        Self { store, cookie_key }
    }
}
