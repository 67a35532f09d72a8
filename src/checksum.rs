// ABOUTME: Deterministic content checksum over an ordered row list
// ABOUTME: Equal checksums short-circuit reconciliation as already-in-sync

use sha2::{Digest, Sha256};

use crate::value::Value;

/// Compute a content checksum over an ordered row list.
///
/// Rows must already be in primary-key order (the row-set loader guarantees
/// this), so two row-sets with identical content always hash identically
/// regardless of retrieval timing. Values are fed into the hasher with a type
/// tag and a length prefix for variable-length kinds, so no two distinct row
/// lists share a byte stream.
///
/// Checksum equality is treated as proof of row-level equality between source
/// and target. This is a design-level assumption, not a security boundary.
pub fn checksum_rows(rows: &[Vec<Value>]) -> String {
    let mut hasher = Sha256::new();

    for row in rows {
        for value in row {
            hash_value(&mut hasher, value);
        }
        hasher.update(b"\n");
    }

    format!("{:x}", hasher.finalize())
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update(b"n"),
        Value::Integer(i) => {
            hasher.update(b"i");
            hasher.update(i.to_le_bytes());
        }
        Value::Real(f) => {
            hasher.update(b"r");
            hasher.update(f.to_le_bytes());
        }
        Value::Text(s) => {
            hasher.update(b"t");
            hasher.update((s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        Value::Blob(b) => {
            hasher.update(b"b");
            hasher.update((b.len() as u64).to_le_bytes());
            hasher.update(b);
        }
    }
}
