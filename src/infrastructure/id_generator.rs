// Document ID Generator - Snowflake-like IDs, rendered as fixed-width hex
// 64-bit ID format: [timestamp:42][node_id:10][sequence:12]

use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::core::strong_types::DocumentId;

const NODE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

static GLOBAL_GENERATOR: Lazy<DocumentIdGenerator> = Lazy::new(|| {
    let node_id = std::env::var("NODE_ID")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or_else(|| rand::random::<u16>())
        & MAX_NODE_ID;
    DocumentIdGenerator::new(node_id)
});

/// Process-wide generator used by `DocumentId::generate`
pub fn global_id_generator() -> &'static DocumentIdGenerator {
    &GLOBAL_GENERATOR
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Allows 1024 nodes and 4096 IDs per millisecond per node.
/// The 16-digit hex rendering keeps lexicographic order equal to numeric order.
#[derive(Debug)]
pub struct DocumentIdGenerator {
    node_id: u16,
    state: Mutex<GeneratorState>,
}

impl DocumentIdGenerator {
    pub fn new(node_id: u16) -> Self {
        assert!(node_id <= MAX_NODE_ID, "Node ID must be less than 1024");

        Self {
            node_id,
            state: Mutex::new(GeneratorState::default()),
        }
    }

    pub fn next_id(&self) -> DocumentId {
        DocumentId::new(format!("{:016x}", self.next_raw()))
    }

    /// Generate next raw 64-bit id
    pub fn next_raw(&self) -> u64 {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            // A clock that moved backwards keeps issuing from the last timestamp
            let now = current_millis().max(state.last_timestamp);

            if now == state.last_timestamp {
                if state.sequence >= MAX_SEQUENCE {
                    // Sequence exhausted for this millisecond
                    std::thread::sleep(Duration::from_millis(1));
                    if current_millis() > state.last_timestamp {
                        continue;
                    }
                    state.last_timestamp += 1;
                    state.sequence = 0;
                } else {
                    state.sequence += 1;
                }
            } else {
                state.last_timestamp = now;
                state.sequence = 0;
            }

            return ((state.last_timestamp & 0x3FF_FFFF_FFFF) << (NODE_BITS + SEQUENCE_BITS))
                | ((self.node_id as u64) << SEQUENCE_BITS)
                | (state.sequence & MAX_SEQUENCE);
        }
    }

    pub fn extract_node_id(id: u64) -> u16 {
        ((id >> SEQUENCE_BITS) & MAX_NODE_ID as u64) as u16
    }

    pub fn extract_timestamp(id: u64) -> u64 {
        id >> (NODE_BITS + SEQUENCE_BITS)
    }

    pub fn extract_sequence(id: u64) -> u16 {
        (id & MAX_SEQUENCE) as u16
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_id_generation() {
        let generator = DocumentIdGenerator::new(123);

        let id1 = generator.next_raw();
        let id2 = generator.next_raw();
        let id3 = generator.next_raw();

        assert!(id1 < id2 && id2 < id3);

        assert_eq!(DocumentIdGenerator::extract_node_id(id1), 123);
        assert_eq!(DocumentIdGenerator::extract_node_id(id2), 123);
        assert_eq!(DocumentIdGenerator::extract_node_id(id3), 123);
    }

    #[test]
    fn test_hex_ids_sort_in_creation_order() {
        let generator = DocumentIdGenerator::new(7);
        let ids: Vec<DocumentId> = (0..500).map(|_| generator.next_id()).collect();

        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(ids.iter().all(|id| id.as_str().len() == 16));
    }

    #[test]
    fn test_unique_across_threads() {
        let generator = Arc::new(DocumentIdGenerator::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || (0..2000).map(|_| generator.next_raw()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
