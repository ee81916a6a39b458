//! Two-phase persisted state.
//!
//! A store starts [`Hydration::Uninitialized`]; [`Persisted::hydrate`] reads
//! its record (or falls back to defaults) and moves it to `Ready`. Every
//! mutation goes through [`Persisted::update`], which writes the whole record
//! back before returning.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::StateStore;
use crate::error::{CoreError, Result};

/// Load phase of a persisted store.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydration<S> {
    Uninitialized,
    Ready(S),
}

/// State of one store bound to its record in a [`StateStore`].
pub struct Persisted<S> {
    key: &'static str,
    backend: Arc<dyn StateStore>,
    slot: Hydration<S>,
}

impl<S> Persisted<S>
where
    S: Serialize + DeserializeOwned + Default,
{
    pub fn new(key: &'static str, backend: Arc<dyn StateStore>) -> Self {
        Self {
            key,
            backend,
            slot: Hydration::Uninitialized,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn is_hydrated(&self) -> bool {
        matches!(self.slot, Hydration::Ready(_))
    }

    /// Load the record from the backend.
    ///
    /// A missing record yields defaults. A record that no longer parses is
    /// logged and replaced with defaults rather than blocking startup.
    ///
    /// # Errors
    /// Returns an error only if the backend itself fails.
    pub fn hydrate(&mut self) -> Result<()> {
        let state = match self.backend.load(self.key)? {
            Some(raw) => match serde_json::from_str::<S>(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!(key = self.key, error = %e, "discarding unreadable record");
                    S::default()
                }
            },
            None => S::default(),
        };
        debug!(key = self.key, "hydrated");
        self.slot = Hydration::Ready(state);
        Ok(())
    }

    /// Borrow the loaded state.
    ///
    /// # Errors
    /// [`CoreError::NotHydrated`] before [`Persisted::hydrate`] has run.
    pub fn get(&self) -> Result<&S> {
        match &self.slot {
            Hydration::Ready(state) => Ok(state),
            Hydration::Uninitialized => Err(self.not_hydrated()),
        }
    }

    /// Apply `f` to the state and write the result back.
    ///
    /// # Errors
    /// [`CoreError::NotHydrated`] before hydration, or a backend/serialization
    /// failure. On a write failure the in-memory change is kept.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let state = match &mut self.slot {
            Hydration::Ready(state) => state,
            Hydration::Uninitialized => {
                return Err(CoreError::NotHydrated {
                    key: self.key.to_string(),
                })
            }
        };
        let out = f(state);
        let raw = serde_json::to_string(state)?;
        self.backend.save(self.key, &raw)?;
        Ok(out)
    }

    fn not_hydrated(&self) -> CoreError {
        CoreError::NotHydrated {
            key: self.key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Counter {
        n: u32,
    }

    #[test]
    fn access_before_hydrate_fails() {
        let mut p: Persisted<Counter> = Persisted::new("counter", Arc::new(MemoryStore::new()));
        assert!(!p.is_hydrated());
        assert!(matches!(p.get(), Err(CoreError::NotHydrated { .. })));
        assert!(p.update(|c| c.n += 1).is_err());
    }

    #[test]
    fn update_is_written_through() {
        let backend = Arc::new(MemoryStore::new());
        let mut p: Persisted<Counter> = Persisted::new("counter", backend.clone());
        p.hydrate().unwrap();
        p.update(|c| c.n = 7).unwrap();

        let mut reloaded: Persisted<Counter> = Persisted::new("counter", backend);
        reloaded.hydrate().unwrap();
        assert_eq!(reloaded.get().unwrap().n, 7);
    }

    #[test]
    fn corrupt_record_falls_back_to_default() {
        let backend = Arc::new(MemoryStore::new());
        backend.save("counter", "{not json").unwrap();
        let mut p: Persisted<Counter> = Persisted::new("counter", backend);
        p.hydrate().unwrap();
        assert_eq!(p.get().unwrap(), &Counter::default());
    }
}
