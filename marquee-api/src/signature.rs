use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted clock skew between the signing timestamp and now.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,

    #[error("signature timestamp outside tolerance")]
    Stale,

    #[error("signature mismatch")]
    Mismatch,
}

/// HMAC-SHA256 over `{timestamp}.{payload}`, hex encoded. The same scheme is
/// used to sign outgoing test fixtures and to verify inbound webhooks.
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a `t=<unix>,v1=<hex>` signature header against the raw body.
/// Fails closed on any parse problem, a stale timestamp, or a digest
/// mismatch; nothing downstream runs on failure.
pub fn verify(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: DateTime<Utc>,
    tolerance_seconds: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut provided: Option<String> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?);
            }
            Some(("v1", value)) => provided = Some(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    let provided = provided.ok_or(SignatureError::Malformed)?;

    if (now.timestamp() - timestamp).abs() > tolerance_seconds {
        return Err(SignatureError::Stale);
    }

    let expected = sign(secret, timestamp, payload);
    if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn header_for(payload: &[u8], timestamp: i64) -> String {
        format!("t={},v1={}", timestamp, sign(SECRET, timestamp, payload))
    }

    #[test]
    fn valid_signature_verifies() {
        let now = Utc::now();
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = header_for(payload, now.timestamp());

        assert_eq!(
            verify(SECRET, &header, payload, now, DEFAULT_TOLERANCE_SECONDS),
            Ok(())
        );
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let now = Utc::now();
        let header = header_for(b"original", now.timestamp());

        assert_eq!(
            verify(SECRET, &header, b"tampered", now, DEFAULT_TOLERANCE_SECONDS),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let payload = b"payload";
        let header = format!(
            "t={},v1={}",
            now.timestamp(),
            sign("other-secret", now.timestamp(), payload)
        );

        assert_eq!(
            verify(SECRET, &header, payload, now, DEFAULT_TOLERANCE_SECONDS),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let now = Utc::now();
        let payload = b"payload";
        let old = now.timestamp() - DEFAULT_TOLERANCE_SECONDS - 1;
        let header = header_for(payload, old);

        assert_eq!(
            verify(SECRET, &header, payload, now, DEFAULT_TOLERANCE_SECONDS),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn missing_fields_are_malformed() {
        let now = Utc::now();
        for header in ["", "t=123", "v1=abc", "t=notanumber,v1=abc"] {
            assert_eq!(
                verify(SECRET, header, b"x", now, DEFAULT_TOLERANCE_SECONDS),
                Err(SignatureError::Malformed),
                "header {header:?} should be malformed"
            );
        }
    }
}
