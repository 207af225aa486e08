use std::env;

use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use thiserror::Error;

use crate::routes::auth::claims::Claims;

/// Minimum acceptable size for the JWT secret in bytes.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum JwtSecretError {
    #[error("JWT_SECRET must be set")]
    Missing,
    #[error("JWT_SECRET must be at least {required} bytes, but {actual} bytes were provided")]
    TooShort { actual: usize, required: usize },
}

/// Verification half of the shared auth secret. Token issuance belongs to
/// the auth service; this service only decodes.
pub struct JwtKeys {
    decoding: DecodingKey,
    #[cfg(test)]
    encoding: jsonwebtoken::EncodingKey,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

impl JwtKeys {
    pub fn from_env() -> Result<Self, JwtSecretError> {
        let value = env::var("JWT_SECRET").map_err(|_| JwtSecretError::Missing)?;
        Self::from_secret(value)
    }

    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, JwtSecretError> {
        let bytes = secret.as_ref();
        if bytes.len() < MIN_JWT_SECRET_LENGTH {
            return Err(JwtSecretError::TooShort {
                actual: bytes.len(),
                required: MIN_JWT_SECRET_LENGTH,
            });
        }

        Ok(Self {
            decoding: DecodingKey::from_secret(bytes),
            #[cfg(test)]
            encoding: jsonwebtoken::EncodingKey::from_secret(bytes),
        })
    }

    pub fn decode(&self, token: &str) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
    }

    #[cfg(test)]
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), claims, &self.encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn claims(exp_offset_secs: i64) -> Claims {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        Claims {
            id: "user_id_123".into(),
            email: "test@example.com".into(),
            exp: (now + exp_offset_secs) as usize,
        }
    }

    #[test]
    fn short_secrets_are_rejected() {
        assert!(matches!(
            JwtKeys::from_secret("too-short"),
            Err(JwtSecretError::TooShort { .. })
        ));
    }

    #[test]
    fn encode_decode_round_trip() {
        let keys = JwtKeys::from_secret("0123456789abcdef0123456789abcdef").unwrap();
        let token = keys.encode(&claims(3600)).unwrap();
        let decoded = keys.decode(&token).unwrap();
        assert_eq!(decoded.claims.email, "test@example.com");
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = JwtKeys::from_secret("0123456789abcdef0123456789abcdef").unwrap();
        let token = keys.encode(&claims(-3600)).unwrap();
        assert!(keys.decode(&token).is_err());
    }
}
