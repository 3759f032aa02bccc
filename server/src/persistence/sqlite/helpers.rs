//! Shared encode/decode helpers for SQLite ↔ domain type conversions.

use crate::game::TimeClass;
use crate::persistence::PersistenceError;

// ── Position hash ──────────────────────────────────────────────────────

/// Reinterpret a Zobrist hash as the signed integer SQLite stores.
pub fn encode_hash(hash: u64) -> i64 {
    hash as i64
}

pub fn decode_hash(value: i64) -> u64 {
    value as u64
}

// ── Booleans ───────────────────────────────────────────────────────────

pub fn encode_bool(value: bool) -> i64 {
    i64::from(value)
}

pub fn decode_bool(value: i64) -> bool {
    value != 0
}

// ── Time controls ──────────────────────────────────────────────────────

/// Encode an optional time-class allow-list as a JSON array. `None` stays NULL.
pub fn encode_time_controls(
    time_controls: Option<&[TimeClass]>,
) -> Result<Option<String>, PersistenceError> {
    time_controls
        .map(serde_json::to_string)
        .transpose()
        .map_err(PersistenceError::from)
}

pub fn decode_time_controls(
    value: Option<&str>,
) -> Result<Option<Vec<TimeClass>>, PersistenceError> {
    value
        .map(serde_json::from_str)
        .transpose()
        .map_err(PersistenceError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_bit_pattern_survives() {
        for hash in [0, 1, u64::MAX, 0x8000_0000_0000_0000, 0xdead_beef_cafe_f00d] {
            assert_eq!(decode_hash(encode_hash(hash)), hash);
        }
        assert!(encode_hash(u64::MAX) < 0);
    }

    #[test]
    fn bools() {
        assert_eq!(encode_bool(true), 1);
        assert_eq!(encode_bool(false), 0);
        assert!(decode_bool(1));
        assert!(!decode_bool(0));
    }

    #[test]
    fn time_controls_as_json() {
        let encoded = encode_time_controls(Some(&[TimeClass::Rapid, TimeClass::Classical]))
            .unwrap()
            .unwrap();
        assert_eq!(encoded, r#"["rapid","classical"]"#);
        assert_eq!(
            decode_time_controls(Some(&encoded)).unwrap(),
            Some(vec![TimeClass::Rapid, TimeClass::Classical])
        );

        assert_eq!(encode_time_controls(None).unwrap(), None);
        assert_eq!(decode_time_controls(None).unwrap(), None);
    }

    #[test]
    fn garbage_time_controls_are_malformed() {
        let err = decode_time_controls(Some("[\"hyperbullet\"]")).unwrap_err();
        assert!(err.is_malformed());
    }
}
