//! 骑手令牌 (rider token)
//!
//! A rider token is a bearer credential scoped to one order. It is minted
//! from 256 random bits, stored on the order, and indexed by its SHA-256 so
//! the raw value never appears as a key. The QR payload carries
//! `{orderId, riderToken}` as unpadded base64url JSON.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const TOKEN_BYTES: usize = 32;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to generate secure random token")]
    RandomFailure,

    #[error("Invalid QR payload: {0}")]
    InvalidQrPayload(String),
}

/// Freshly minted token with its derived values
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub token_hash: String,
    pub qr_payload: String,
}

/// Decoded QR content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrContent {
    pub order_id: String,
    pub rider_token: String,
}

/// Mint a token for `order_id`
pub fn mint(order_id: &str) -> Result<MintedToken, TokenError> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|_| TokenError::RandomFailure)?;

    let token = hex::encode(bytes);
    Ok(MintedToken {
        token_hash: token_hash(&token),
        qr_payload: qr_payload(order_id, &token),
        token,
    })
}

/// Index key for a token
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn qr_payload(order_id: &str, token: &str) -> String {
    let content = QrContent {
        order_id: order_id.to_string(),
        rider_token: token.to_string(),
    };
    // Serializing two strings cannot fail
    let json = serde_json::to_vec(&content).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode_qr_payload(payload: &str) -> Result<QrContent, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| TokenError::InvalidQrPayload(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TokenError::InvalidQrPayload(e.to_string()))
}

/// Constant-time comparison of a stored token against a presented one
///
/// Both tokens key an HMAC over the order id; `verify_slice` compares the
/// tags in constant time.
pub fn tokens_match(stored: &str, presented: &str, order_id: &str) -> bool {
    let (Ok(mut expected), Ok(mut candidate)) = (
        HmacSha256::new_from_slice(stored.as_bytes()),
        HmacSha256::new_from_slice(presented.as_bytes()),
    ) else {
        return false;
    };
    expected.update(order_id.as_bytes());
    candidate.update(order_id.as_bytes());
    let tag = candidate.finalize().into_bytes();
    expected.verify_slice(&tag).is_ok()
}
