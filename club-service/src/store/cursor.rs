//! Opaque pagination cursors.
//!
//! A cursor is the base64 of a small JSON struct holding the last-seen key
//! components. Clients treat it as opaque; a token that fails to decode is an
//! [`StoreError::InvalidCursor`], never a silent restart from page one.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub pk: String,
    pub sk: String,
}

impl Cursor {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    pub fn encode(&self) -> String {
        // Serializing two strings cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self, StoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| StoreError::InvalidCursor)?;
        serde_json::from_slice(&bytes).map_err(|_| StoreError::InvalidCursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let cursor = Cursor::new("CLUBS", "CLUB#0191e0f0");
        let token = cursor.encode();
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        assert!(matches!(
            Cursor::decode("not base64!!"),
            Err(StoreError::InvalidCursor)
        ));
        // Valid base64, invalid JSON.
        let token = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(matches!(
            Cursor::decode(&token),
            Err(StoreError::InvalidCursor)
        ));
    }
}
