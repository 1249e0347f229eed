//! The button-repeat table: digital-join-id -> the exact outbound "press"
//! packet bytes, for joins currently held pressed via button semantics.
//!
//! Serialized under its own mutex, independent of the join store's mutex
//! (`spec.md` §3/§5), so the Sender's 500ms repeat tick never contends
//! with the Event Processor's upsert path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct ButtonTable {
    inner: Arc<Mutex<HashMap<u32, Vec<u8>>>>,
}

impl ButtonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `join` is held pressed, with the exact packet the
    /// Sender should re-transmit on every repeat tick.
    pub fn press(&self, join: u32, packet: Vec<u8>) {
        self.inner.lock().unwrap().insert(join, packet);
    }

    /// Clear `join`'s held-pressed state.
    pub fn release(&self, join: u32) {
        self.inner.lock().unwrap().remove(&join);
    }

    /// Every `(join, packet)` currently held pressed, for the Sender's
    /// repeat tick. The join id is included so the Sender can cross-check
    /// it against the outbound digital store before re-sending.
    pub fn held(&self) -> Vec<(u32, Vec<u8>)> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|(join, packet)| (*join, packet.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_then_release_clears_entry() {
        let table = ButtonTable::new();
        table.press(1, vec![0x05]);
        assert_eq!(table.held(), vec![(1, vec![0x05])]);
        table.release(1);
        assert!(table.held().is_empty());
    }

    #[test]
    fn multiple_held_joins_all_repeat() {
        let table = ButtonTable::new();
        table.press(1, vec![0x01]);
        table.press(2, vec![0x02]);
        let mut held = table.held();
        held.sort();
        assert_eq!(held, vec![(1, vec![0x01]), (2, vec![0x02])]);
    }
}
