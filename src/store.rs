//! The join store: a single flat map from (direction, sigtype, join) to its
//! current value and subscriber callbacks.
//!
//! Grounded on `services/receiver/src/cache.rs`'s `StreamCounts`: a small
//! `Clone`-able handle wrapping an `Arc<Mutex<HashMap<...>>>`, with plain
//! methods on `&self` so every activity can hold its own clone of the
//! handle.

use cip_protocol::{Direction, JoinValue, SigType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A subscriber callback: `(sigtype, join, value)`.
pub type Callback = Arc<dyn Fn(SigType, u32, JoinValue) + Send + Sync>;

#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug)]
struct Key {
    direction: DirectionKey,
    sig_type: SigTypeKey,
    join: u32,
}

// `Direction`/`SigType` aren't `Eq`/`Hash` in the protocol crate (no
// reason for a pure wire-format enum to carry storage-key traits), so the
// store keys on small mirror enums instead of asking upstream to grow them.
#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug)]
enum DirectionKey {
    In,
    Out,
}

#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug)]
enum SigTypeKey {
    Digital,
    Analog,
    Serial,
}

impl From<Direction> for DirectionKey {
    fn from(d: Direction) -> Self {
        match d {
            Direction::In => DirectionKey::In,
            Direction::Out => DirectionKey::Out,
        }
    }
}

impl From<SigType> for SigTypeKey {
    fn from(s: SigType) -> Self {
        match s {
            SigType::Digital => SigTypeKey::Digital,
            SigType::Analog => SigTypeKey::Analog,
            SigType::Serial => SigTypeKey::Serial,
        }
    }
}

struct Entry {
    value: JoinValue,
    callbacks: Vec<Callback>,
}

/// Shared handle to the join store.
#[derive(Clone)]
pub struct JoinStore {
    inner: Arc<Mutex<HashMap<Key, Entry>>>,
}

impl JoinStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current value for a join, or the type-appropriate zero if unknown.
    /// Does not create an entry.
    pub fn get(&self, direction: Direction, sig_type: SigType, join: u32) -> JoinValue {
        let key = Key {
            direction: direction.into(),
            sig_type: sig_type.into(),
            join,
        };
        let map = self.inner.lock().unwrap();
        map.get(&key)
            .map(|e| e.value.clone())
            .unwrap_or_else(|| JoinValue::zero(sig_type))
    }

    /// Append a subscriber callback, creating a default-valued entry if the
    /// join has never been observed.
    pub fn subscribe(&self, direction: Direction, sig_type: SigType, join: u32, callback: Callback) {
        let key = Key {
            direction: direction.into(),
            sig_type: sig_type.into(),
            join,
        };
        let mut map = self.inner.lock().unwrap();
        map.entry(key)
            .or_insert_with(|| Entry {
                value: JoinValue::zero(sig_type),
                callbacks: Vec::new(),
            })
            .callbacks
            .push(callback);
    }

    /// Upsert a join's value. Returns a snapshot of the callback list to
    /// invoke *after* the lock is released, or an empty vec if the entry
    /// was newly created (no subscriber can exist for a join nobody has
    /// seen yet).
    pub fn set_and_snapshot_callbacks(
        &self,
        direction: Direction,
        sig_type: SigType,
        join: u32,
        value: JoinValue,
    ) -> Vec<Callback> {
        let key = Key {
            direction: direction.into(),
            sig_type: sig_type.into(),
            join,
        };
        let mut map = self.inner.lock().unwrap();
        match map.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                entry.callbacks.clone()
            }
            None => {
                map.insert(
                    key,
                    Entry {
                        value,
                        callbacks: Vec::new(),
                    },
                );
                Vec::new()
            }
        }
    }

    /// All currently-known outbound joins, for replay after end-of-query.
    pub fn snapshot_outbound(&self) -> Vec<(SigType, u32, JoinValue)> {
        let map = self.inner.lock().unwrap();
        map.iter()
            .filter(|(k, _)| k.direction == DirectionKey::Out)
            .map(|(k, e)| {
                let sig_type = match k.sig_type {
                    SigTypeKey::Digital => SigType::Digital,
                    SigTypeKey::Analog => SigType::Analog,
                    SigTypeKey::Serial => SigType::Serial,
                };
                (sig_type, k.join, e.value.clone())
            })
            .collect()
    }
}

impl Default for JoinStore {
    fn default() -> Self {
        Self::new()
    }
}
