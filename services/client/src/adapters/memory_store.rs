//! services/client/src/adapters/memory_store.rs
//!
//! A volatile `KeyValueStore`. Handles cloned from the same `Arc` behave like
//! browser tabs sharing one origin's storage.

use scroll_saga_core::ports::{KeyValueStore, PortError, PortResult, StoreMutation};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    revision: u64,
    entries: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `entries`, e.g. keys written by an older client.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            state: RwLock::new(MemoryState {
                revision: 0,
                entries,
            }),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .map(|state| state.entries.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> PortError {
    PortError::Storage("memory store lock poisoned".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.entries.get(key).cloned())
    }

    fn apply(&self, mutations: &[StoreMutation]) -> PortResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        for mutation in mutations {
            match mutation {
                StoreMutation::Set { key, value } => {
                    state.entries.insert(key.clone(), value.clone());
                }
                StoreMutation::Remove { key } => {
                    state.entries.remove(key);
                }
            }
        }
        state.revision += 1;
        Ok(())
    }

    fn revision(&self) -> PortResult<u64> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.revision)
    }
}
