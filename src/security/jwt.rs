/// Bearer-token claims (HS256).
///
/// Token issuance lives with the external credential service; this module
/// validates inbound tokens and can mint short-lived ones for tests.
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::sync::{LazyLock, RwLock};
use uuid::Uuid;

const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 1;

/// JWT claims carried by every authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Username at issuance time
    pub username: String,
}

// Keys are loaded once at startup from the configured secret.
static JWT_KEYS: LazyLock<RwLock<Option<(EncodingKey, DecodingKey)>>> =
    LazyLock::new(|| RwLock::new(None));

/// Install the HS256 secret. Must run during startup before any token
/// operation.
pub fn initialize_secret(secret: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut keys = JWT_KEYS
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock on JWT keys: {e}"))?;
    *keys = Some((encoding_key, decoding_key));

    Ok(())
}

fn get_encoding_key() -> Result<EncodingKey> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {e}"))?;
    keys.as_ref()
        .map(|(enc, _)| enc.clone())
        .ok_or_else(|| anyhow!("JWT keys not initialized. Call initialize_secret() during startup"))
}

fn get_decoding_key() -> Result<DecodingKey> {
    let keys = JWT_KEYS
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT keys: {e}"))?;
    keys.as_ref()
        .map(|(_, dec)| dec.clone())
        .ok_or_else(|| anyhow!("JWT keys not initialized. Call initialize_secret() during startup"))
}

/// Mint an access token for `user_id`.
pub fn generate_token(user_id: Uuid, username: &str) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        username: username.to_string(),
    };

    let encoding_key = get_encoding_key()?;
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| anyhow!("Failed to generate access token: {e}"))
}

/// Validate a bearer token and return its claims.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| anyhow!("Invalid token: {e}"))
}
