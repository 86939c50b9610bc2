// crates/server/src/slot.rs
//! The single shared result slot behind `/infer` and `/get`.

use std::sync::RwLock;

/// Holds the text of whichever legacy recognition finished last.
///
/// Every legacy submission clears the slot and its background task writes
/// it on success. Overlapping submissions race; the last writer wins and
/// a poller cannot tell which upload the text belongs to. The job API is
/// the way around that.
#[derive(Default)]
pub struct LatestSlot {
    text: RwLock<String>,
}

impl LatestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to empty, as done on every submission.
    pub fn clear(&self) {
        self.set(String::new());
    }

    pub fn set(&self, text: String) {
        match self.text.write() {
            Ok(mut guard) => *guard = text,
            Err(e) => {
                tracing::error!("RwLock poisoned writing latest slot: {e}");
                *e.into_inner() = text;
            }
        }
    }

    /// Current text; empty before the first completion and while one is in flight.
    pub fn get(&self) -> String {
        match self.text.read() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                tracing::error!("RwLock poisoned reading latest slot: {e}");
                e.into_inner().clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_starts_empty() {
        assert_eq!(LatestSlot::new().get(), "");
    }

    #[test]
    fn test_slot_last_writer_wins() {
        let slot = LatestSlot::new();
        slot.set("B".into());
        slot.set("A".into());
        assert_eq!(slot.get(), "A");

        slot.clear();
        assert_eq!(slot.get(), "");
    }
}
