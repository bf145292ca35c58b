//! Account id of the session owner, read from the session token.
//!
//! The token is not verified; only its payload is decoded.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
}

/// The `sub` claim of a JWT, or `None` if the token cannot be decoded.
pub(crate) fn subject(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.sub.filter(|sub| !sub.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.signature", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_subject() {
        let token = token(r#"{"sub":"qm:1234-abcd","iat":1700000000}"#);
        assert_eq!(subject(&token).as_deref(), Some("qm:1234-abcd"));
    }

    #[test]
    fn test_padded_payload() {
        let token = format!(
            "h.{}==.s",
            URL_SAFE_NO_PAD.encode(r#"{"sub":"557058:ab"}"#)
        );
        assert_eq!(subject(&token).as_deref(), Some("557058:ab"));
    }

    #[test]
    fn test_undecodable() {
        assert_eq!(subject("not-a-jwt"), None);
        assert_eq!(subject("a.!!!.c"), None);
        assert_eq!(subject(&token(r#"{"iat":1}"#)), None);
    }
}
