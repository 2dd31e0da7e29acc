use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{Command, Event, Snapshot};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_command(cmd: &Command) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(cmd)?)
}

pub fn deserialize_command(bytes: &[u8]) -> Result<Command, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_events(events: &[Event]) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(events)?)
}

pub fn deserialize_events(bytes: &[u8]) -> Result<Vec<Event>, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn serialize_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec_named(snapshot)?)
}

pub fn deserialize_snapshot(bytes: &[u8]) -> Result<Snapshot, WireError> {
    Ok(decode::from_slice(bytes)?)
}

pub fn encode_snapshot_json(snapshot: &Snapshot) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn decode_snapshot_json(json: &str) -> Result<Snapshot, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic snapshot hash for desync detection and replay verification.
///
/// Hashes the MessagePack-serialized snapshot using FNV-1a 64-bit.
pub fn snapshot_hash(snapshot: &Snapshot) -> Result<u64, WireError> {
    let bytes = serialize_snapshot(snapshot)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CityId, GridPos, UnitId};

    #[test]
    fn commands_survive_msgpack() {
        let cmd = Command::MoveUnit {
            unit: UnitId::new(4, 1),
            to: GridPos::new(2, 3),
        };
        let bytes = serialize_command(&cmd).unwrap();
        match deserialize_command(&bytes).unwrap() {
            Command::MoveUnit { unit, to } => {
                assert_eq!(unit, UnitId::new(4, 1));
                assert_eq!(to, GridPos::new(2, 3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn production_commands_keep_their_item_string() {
        let cmd = Command::SetProduction {
            city: CityId::new(0, 0),
            item: "granary".to_string(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"SetProduction\""));
        assert!(json.contains("granary"));
    }

    #[test]
    fn fnv_hash_is_stable() {
        assert_eq!(hash_bytes_fnv1a64(b""), 0xcbf29ce484222325);
        assert_ne!(hash_bytes_fnv1a64(b"a"), hash_bytes_fnv1a64(b"b"));
    }
}
