use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// Reads the `exp` claim (Unix seconds) from a JWT without verifying it.
/// Anything undecodable yields `None`.
pub fn access_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    match claims.get("exp")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    }
}

/// A token is usable only if its expiry can be read and lies in the future.
pub fn is_usable_at(token: &str, now: i64) -> bool {
    access_expiry(token).is_some_and(|exp| exp > now)
}
