use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

const NODE_ID_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_LEFT_SHIFT: u64 = SEQUENCE_BITS + NODE_ID_BITS;
const EPOCH: u64 = 1288834974657;

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(EPOCH)
}

struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Snowflake style id generator: millisecond timestamp, node id and a
/// per-millisecond sequence packed into 63 bits.
///
/// Ids are strictly increasing within a process. When the sequence wraps the
/// generator waits for the next millisecond, and when the clock steps back it
/// keeps issuing ids from the last seen timestamp.
pub(crate) struct SnowflakeIdGenerator {
    node_id: u64,
    state: Mutex<GeneratorState>,
}

impl SnowflakeIdGenerator {
    pub fn new() -> Self {
        let node_id = Self::random_node_id();
        log::info!("Initialized id generator with node id: {}", node_id);
        SnowflakeIdGenerator {
            node_id,
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    pub fn get_id(&self) -> u64 {
        let mut state = self.state.lock();
        let mut timestamp = current_millis().max(EPOCH);

        if timestamp < state.last_timestamp {
            log::warn!(
                "Clock moved backwards by {} ms, reusing last timestamp",
                state.last_timestamp - timestamp
            );
            timestamp = state.last_timestamp;
        }

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // sequence exhausted for this millisecond
                while timestamp <= state.last_timestamp {
                    std::hint::spin_loop();
                    timestamp = current_millis().max(state.last_timestamp);
                    if timestamp == state.last_timestamp {
                        std::thread::yield_now();
                    }
                }
            }
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = timestamp;
        ((timestamp - EPOCH) << TIMESTAMP_LEFT_SHIFT) | (self.node_id << SEQUENCE_BITS) | state.sequence
    }

    fn random_node_id() -> u64 {
        let uuid = uuid::Uuid::new_v4();
        let bytes = uuid.as_bytes();
        let seed = u64::from(bytes[bytes.len() - 1]) | (OsRng.gen::<u64>() << 8);
        seed & MAX_NODE_ID
    }
}
