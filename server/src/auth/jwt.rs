//! JWT Token Generation and Validation
//!
//! Access tokens are issued by the club's login service and signed with a
//! shared HS256 secret. This server only validates them; generation is kept
//! for tooling and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};

/// JWT claims for access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (member ID as UUID string).
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Set by the login service after a bound-device check.
    #[serde(default)]
    pub device_verified: bool,
}

impl Claims {
    /// Member ID from the subject claim.
    pub fn member_id(&self) -> AuthResult<Uuid> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Generate an access token.
///
/// # Arguments
/// * `member_id` - The member's UUID
/// * `secret` - HS256 signing secret
/// * `expiry_seconds` - Token validity (typically 900 = 15 min)
/// * `device_verified` - Whether the session passed the bound-device check
pub fn generate_access_token(
    member_id: Uuid,
    secret: &str,
    expiry_seconds: i64,
    device_verified: bool,
) -> AuthResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: member_id.to_string(),
        exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
        iat: now.timestamp(),
        device_verified,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validate and decode an access token.
///
/// Returns an error if the token is invalid or expired.
pub fn validate_access_token(token: &str, secret: &str) -> AuthResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_roundtrip() {
        let member_id = Uuid::new_v4();
        let token = generate_access_token(member_id, SECRET, 900, false).unwrap();

        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.member_id().unwrap(), member_id);
        assert!(!claims.device_verified);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_device_verified_claim() {
        let token = generate_access_token(Uuid::new_v4(), SECRET, 900, true).unwrap();
        let claims = validate_access_token(&token, SECRET).unwrap();
        assert!(claims.device_verified);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_access_token(Uuid::new_v4(), SECRET, 900, false).unwrap();
        let result = validate_access_token(&token, "other-secret");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = generate_access_token(Uuid::new_v4(), SECRET, -120, false).unwrap();
        let result = validate_access_token(&token, SECRET);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let result = validate_access_token("not.a.jwt", SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_missing_device_claim_defaults_false() {
        let now = Utc::now().timestamp();
        let raw = serde_json::json!({ "sub": Uuid::new_v4().to_string(), "exp": now + 60, "iat": now });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &raw,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let claims = validate_access_token(&token, SECRET).unwrap();
        assert!(!claims.device_verified);
    }

    #[test]
    fn test_bad_subject() {
        let claims = Claims {
            sub: "nobody".into(),
            exp: 0,
            iat: 0,
            device_verified: false,
        };
        assert!(matches!(claims.member_id(), Err(AuthError::InvalidToken)));
    }
}
