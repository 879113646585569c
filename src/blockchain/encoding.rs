//! Canonical encoding of the signable part of a transaction.
//!
//! The ledger verifies a signature by rebuilding this exact byte string
//! from the submitted fields, so the output here is part of the wire
//! contract:
//!
//! ```text
//! {"from":"<from>","to_":"<to_>","amount":"<amount>","nonce":<nonce>,"ou":"<ou>","timestamp":<timestamp>}
//! ```
//!
//! The string is assembled field by field. Serializing a map or struct
//! would tie the field order to the container and its serializer.

use std::fmt::{self, Write as _};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

/// Seconds since the Unix epoch at microsecond precision.
///
/// Rendered as a bare JSON number with at most six fractional digits,
/// using the shortest decimal that round-trips to the same `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    micros: u64,
}

impl Timestamp {
    pub const fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    /// Round a wall-clock instant to the nearest microsecond.
    pub fn from_system_time(time: SystemTime) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self {
            micros: ((nanos + 500) / 1_000) as u64,
        }
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn as_micros(&self) -> u64 {
        self.micros
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.as_secs_f64();
        // Whole seconds keep a ".0" so the value stays a float on the wire.
        if self.micros % 1_000_000 == 0 {
            write!(f, "{:.1}", secs)
        } else {
            write!(f, "{}", secs)
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

/// The fields covered by a transaction signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignableTransaction {
    pub from: String,
    #[serde(rename = "to_")]
    pub to: String,
    pub amount: String,
    pub nonce: u64,
    pub ou: String,
    pub timestamp: Timestamp,
}

impl SignableTransaction {
    /// Amount carried by a contract call. Value is never moved on this path.
    pub const CONTRACT_CALL_AMOUNT: &'static str = "0";
    /// Operation units attached to a contract call.
    pub const CONTRACT_CALL_OU: &'static str = "1";

    /// A contract-call transaction from `from` to contract `to`.
    pub fn contract_call(from: &str, to: &str, nonce: u64, timestamp: Timestamp) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            amount: Self::CONTRACT_CALL_AMOUNT.to_string(),
            nonce,
            ou: Self::CONTRACT_CALL_OU.to_string(),
            timestamp,
        }
    }

    /// Canonical bytes to sign.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        encode(self)
    }
}

/// Encode `tx` into the canonical blob.
pub fn encode(tx: &SignableTransaction) -> Vec<u8> {
    canonical_string(tx).into_bytes()
}

/// Canonical blob as a string.
pub fn canonical_string(tx: &SignableTransaction) -> String {
    let mut out = String::with_capacity(
        96 + tx.from.len() + tx.to.len() + tx.amount.len() + tx.ou.len(),
    );

    out.push_str("{\"from\":");
    push_quoted(&mut out, &tx.from);
    out.push_str(",\"to_\":");
    push_quoted(&mut out, &tx.to);
    out.push_str(",\"amount\":");
    push_quoted(&mut out, &tx.amount);
    out.push_str(",\"nonce\":");
    out.push_str(&tx.nonce.to_string());
    out.push_str(",\"ou\":");
    push_quoted(&mut out, &tx.ou);
    out.push_str(",\"timestamp\":");
    out.push_str(&tx.timestamp.to_string());
    out.push('}');

    out
}

/// Append `value` as an ASCII-only JSON string literal.
///
/// Everything outside printable ASCII becomes `\uXXXX` (lowercase hex, UTF-16
/// surrogate pairs above the BMP), the form the ledger's verifier rebuilds.
fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample() -> SignableTransaction {
        SignableTransaction::contract_call(
            "addrX",
            "contractY",
            6,
            Timestamp::from_micros(1_700_000_000_123_456),
        )
    }

    #[test]
    fn test_canonical_blob_literal() {
        assert_eq!(
            canonical_string(&sample()),
            r#"{"from":"addrX","to_":"contractY","amount":"0","nonce":6,"ou":"1","timestamp":1700000000.123456}"#
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let tx = sample();
        assert_eq!(encode(&tx), encode(&tx.clone()));
    }

    #[test]
    fn test_each_field_changes_output() {
        let base = encode(&sample());

        let mut tx = sample();
        tx.from = "addrZ".to_string();
        assert_ne!(encode(&tx), base);

        let mut tx = sample();
        tx.to = "contractZ".to_string();
        assert_ne!(encode(&tx), base);

        let mut tx = sample();
        tx.amount = "1".to_string();
        assert_ne!(encode(&tx), base);

        let mut tx = sample();
        tx.nonce = 7;
        assert_ne!(encode(&tx), base);

        let mut tx = sample();
        tx.ou = "2".to_string();
        assert_ne!(encode(&tx), base);

        let mut tx = sample();
        tx.timestamp = Timestamp::from_micros(1_700_000_000_123_457);
        assert_ne!(encode(&tx), base);
    }

    #[test]
    fn test_field_types_on_the_wire() {
        let blob = canonical_string(&sample());
        // nonce bare, amount and ou quoted
        assert!(blob.contains(r#""nonce":6,"#));
        assert!(!blob.contains(r#""nonce":"6""#));
        assert!(blob.contains(r#""amount":"0""#));
        assert!(blob.contains(r#""ou":"1""#));
        assert!(!blob.contains(r#""timestamp":""#));
    }

    #[test]
    fn test_swapping_sender_and_receiver_changes_output() {
        let tx = sample();
        let mut swapped = tx.clone();
        swapped.from = tx.to.clone();
        swapped.to = tx.from.clone();
        assert_ne!(encode(&tx), encode(&swapped));
    }

    #[test]
    fn test_field_order_is_fixed() {
        let blob = canonical_string(&sample());
        let positions: Vec<usize> = ["\"from\"", "\"to_\"", "\"amount\"", "\"nonce\"", "\"ou\"", "\"timestamp\""]
            .iter()
            .map(|key| blob.find(key).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_no_whitespace() {
        let blob = canonical_string(&sample());
        assert!(!blob.contains(' '));
        assert!(!blob.contains('\n'));
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(Timestamp::from_micros(1_700_000_000_123_456).to_string(), "1700000000.123456");
        assert_eq!(Timestamp::from_micros(1_700_000_000_500_000).to_string(), "1700000000.5");
        assert_eq!(Timestamp::from_micros(1_700_000_000_000_100).to_string(), "1700000000.0001");
        assert_eq!(Timestamp::from_micros(1_700_000_000_000_000).to_string(), "1700000000.0");
    }

    #[test]
    fn test_timestamp_matches_json_number_rendering() {
        for micros in [
            1_700_000_000_123_456u64,
            1_700_000_000_000_000,
            1_700_000_000_000_001,
            1_712_345_678_900_000,
            1_760_000_000_999_999,
        ] {
            let ts = Timestamp::from_micros(micros);
            assert_eq!(serde_json::to_string(&ts).unwrap(), ts.to_string());
        }
    }

    #[test]
    fn test_timestamp_rounds_to_microseconds() {
        let time = UNIX_EPOCH + Duration::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(Timestamp::from_system_time(time).as_micros(), 1_700_000_000_123_457);

        let time = UNIX_EPOCH + Duration::from_nanos(1_700_000_000_123_456_400);
        assert_eq!(Timestamp::from_system_time(time).as_micros(), 1_700_000_000_123_456);
    }

    #[test]
    fn test_quoted_fields_are_escaped() {
        let mut tx = sample();
        tx.from = "a\"b".to_string();
        assert!(canonical_string(&tx).starts_with(r#"{"from":"a\"b","#));
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let mut tx = sample();
        tx.from = "caf\u{e9}\u{1f600}".to_string();
        tx.to = "a\u{8}\u{c}\u{7f}".to_string();
        let blob = canonical_string(&tx);

        assert!(blob.is_ascii());
        assert!(blob.starts_with(r#"{"from":"caf\u00e9\ud83d\ude00","to_":"a\b\f\u007f","#));
    }
}
