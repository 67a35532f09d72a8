// ABOUTME: Driver-independent column values and primary-key identity tuples
// ABOUTME: Converts losslessly to/from rusqlite and mysql_async value types

use base64::Engine;

/// A single column value, independent of the driver that produced it.
///
/// Rows are `Vec<Value>`, positionally aligned with the job's column list.
/// They are immutable snapshots, re-fetched on every sync pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Normalize this value into a hashable primary-key component.
    pub fn key_part(&self) -> KeyPart {
        match self {
            Value::Null => KeyPart::Null,
            Value::Integer(i) => KeyPart::Integer(*i),
            // REAL and BLOB are not Hash/Eq; both are normalized to a
            // canonical text form so composite keys hash consistently
            Value::Real(f) => KeyPart::Real(f.to_string()),
            Value::Text(s) => KeyPart::Text(s.clone()),
            Value::Blob(b) => {
                KeyPart::Bytes(base64::engine::general_purpose::STANDARD.encode(b))
            }
        }
    }
}

/// One normalized component of a primary key.
///
/// Each source value kind maps to its own variant, so a BLOB whose base64
/// form spells out some TEXT value can never collide with that value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Null,
    Integer(i64),
    /// Canonical decimal text of a REAL component.
    Real(String),
    Text(String),
    /// Base64 text of a BLOB component.
    Bytes(String),
}

/// The identity key for matching rows between source and target.
///
/// An ordered sequence of normalized key components. Rust hashes sequences
/// structurally, so there is no arity cap here; the 1-3 primary-key limit is
/// a configuration-validation rule only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKey(Vec<KeyPart>);

impl PrimaryKey {
    /// Extract the primary key from a row, in configured primary-key order.
    pub fn extract(row: &[Value], pk_indices: &[usize]) -> Self {
        PrimaryKey(pk_indices.iter().map(|&i| row[i].key_part()).collect())
    }
}

impl From<rusqlite::types::Value> for Value {
    fn from(value: rusqlite::types::Value) -> Self {
        match value {
            rusqlite::types::Value::Null => Value::Null,
            rusqlite::types::Value::Integer(i) => Value::Integer(i),
            rusqlite::types::Value::Real(f) => Value::Real(f),
            rusqlite::types::Value::Text(s) => Value::Text(s),
            rusqlite::types::Value::Blob(b) => Value::Blob(b),
        }
    }
}

impl From<Value> for rusqlite::types::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => rusqlite::types::Value::Null,
            Value::Integer(i) => rusqlite::types::Value::Integer(i),
            Value::Real(f) => rusqlite::types::Value::Real(f),
            Value::Text(s) => rusqlite::types::Value::Text(s),
            Value::Blob(b) => rusqlite::types::Value::Blob(b),
        }
    }
}

impl From<mysql_async::Value> for Value {
    fn from(value: mysql_async::Value) -> Self {
        match value {
            mysql_async::Value::NULL => Value::Null,
            mysql_async::Value::Int(i) => Value::Integer(i),
            mysql_async::Value::UInt(u) => {
                // Values past i64::MAX fall back to decimal text
                match i64::try_from(u) {
                    Ok(i) => Value::Integer(i),
                    Err(_) => Value::Text(u.to_string()),
                }
            }
            mysql_async::Value::Float(f) => Value::Real(f64::from(f)),
            mysql_async::Value::Double(f) => Value::Real(f),
            mysql_async::Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => Value::Text(s),
                Err(e) => Value::Blob(e.into_bytes()),
            },
            mysql_async::Value::Date(y, mo, d, h, mi, s, us) => {
                Value::Text(format_mysql_date(y, mo, d, h, mi, s, us))
            }
            mysql_async::Value::Time(neg, days, h, mi, s, us) => {
                Value::Text(format_mysql_time(neg, days, h, mi, s, us))
            }
        }
    }
}

impl From<Value> for mysql_async::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => mysql_async::Value::NULL,
            Value::Integer(i) => mysql_async::Value::Int(i),
            Value::Real(f) => mysql_async::Value::Double(f),
            Value::Text(s) => mysql_async::Value::Bytes(s.into_bytes()),
            Value::Blob(b) => mysql_async::Value::Bytes(b),
        }
    }
}

/// Render a MySQL DATE/DATETIME value as canonical text.
///
/// MySQL can emit zero dates ('0000-00-00'), which chrono rejects; those fall
/// back to plain zero-padded rendering.
fn format_mysql_date(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8, us: u32) -> String {
    let parsed = chrono::NaiveDate::from_ymd_opt(i32::from(y), u32::from(mo), u32::from(d))
        .and_then(|date| date.and_hms_micro_opt(u32::from(h), u32::from(mi), u32::from(s), us));

    match parsed {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
            y, mo, d, h, mi, s, us
        ),
    }
}

/// Render a MySQL TIME value as canonical text. TIME is a signed duration
/// and may exceed 24 hours, so it cannot go through chrono's clock types.
fn format_mysql_time(neg: bool, days: u32, h: u8, mi: u8, s: u8, us: u32) -> String {
    let sign = if neg { "-" } else { "" };
    let hours = days * 24 + u32::from(h);
    format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, mi, s, us)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_part_distinguishes_blob_from_text() {
        // "YWJj" is the base64 form of b"abc"; the two must not collide
        let blob = Value::Blob(b"abc".to_vec());
        let text = Value::Text("YWJj".to_string());
        assert_ne!(blob.key_part(), text.key_part());
        assert_eq!(blob.key_part(), KeyPart::Bytes("YWJj".to_string()));
    }

    #[test]
    fn test_key_part_normalizes_real_to_text() {
        assert_eq!(Value::Real(30.5).key_part(), KeyPart::Real("30.5".to_string()));
    }

    #[test]
    fn test_extract_follows_configured_key_order() {
        let row = vec![
            Value::Text("Alice".to_string()),
            Value::Integer(30),
            Value::Text("red".to_string()),
        ];

        // Key order (age, name) differs from column order (name, age, ...)
        let key = PrimaryKey::extract(&row, &[1, 0]);
        assert_eq!(
            key,
            PrimaryKey(vec![
                KeyPart::Integer(30),
                KeyPart::Text("Alice".to_string()),
            ])
        );
    }

    #[test]
    fn test_mysql_bytes_round_trip_as_text() {
        let value = Value::from(mysql_async::Value::Bytes(b"hello".to_vec()));
        assert_eq!(value, Value::Text("hello".to_string()));
        assert_eq!(
            mysql_async::Value::from(value),
            mysql_async::Value::Bytes(b"hello".to_vec())
        );
    }

    #[test]
    fn test_mysql_zero_date_renders_without_panicking() {
        let value = Value::from(mysql_async::Value::Date(0, 0, 0, 0, 0, 0, 0));
        assert_eq!(
            value,
            Value::Text("0000-00-00 00:00:00.000000".to_string())
        );
    }

    #[test]
    fn test_mysql_time_can_exceed_a_day() {
        assert_eq!(format_mysql_time(true, 1, 2, 3, 4, 0), "-26:03:04.000000");
    }
}
