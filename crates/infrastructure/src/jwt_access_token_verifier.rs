use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pillow_application::AccessTokenVerifier;
use pillow_core::{AppError, AppResult, Principal, UserId};

/// Issuer stamped into and required from every access token.
pub const ACCESS_TOKEN_ISSUER: &str = "pillow-user-management";

/// Registered and private claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Authenticated user identifier.
    pub user_id: Uuid,
    /// Authenticated username.
    pub username: String,
    /// Expiry as a unix timestamp.
    pub exp: i64,
    /// Issue time as a unix timestamp.
    pub iat: i64,
    /// Not-before time as a unix timestamp.
    pub nbf: i64,
    /// Token issuer.
    pub iss: String,
    /// Token subject, the user identifier as text.
    pub sub: String,
}

/// HMAC-SHA256 access token issuer and verifier.
#[derive(Clone)]
pub struct JwtAccessTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtAccessTokenVerifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JwtAccessTokenVerifier")
            .field("issuer", &ACCESS_TOKEN_ISSUER)
            .finish_non_exhaustive()
    }
}

impl JwtAccessTokenVerifier {
    /// Creates a verifier keyed by a shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Signs an access token for the principal valid for `ttl`.
    pub fn issue_token(&self, principal: &Principal, ttl: Duration) -> AppResult<String> {
        let issued_at = Utc::now();
        let claims = AccessTokenClaims {
            user_id: principal.user_id().as_uuid(),
            username: principal.username().to_owned(),
            exp: (issued_at + ttl).timestamp(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            iss: ACCESS_TOKEN_ISSUER.to_owned(),
            sub: principal.user_id().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign access token: {error}")))
    }
}

impl AccessTokenVerifier for JwtAccessTokenVerifier {
    fn verify(&self, token: &str) -> AppResult<Principal> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|error| AppError::Unauthorized(format!("invalid access token: {error}")))?;
        let claims = token_data.claims;

        Ok(Principal::new(
            UserId::from_uuid(claims.user_id),
            claims.username,
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use pillow_application::AccessTokenVerifier;
    use pillow_core::{AppError, Principal, UserId};

    use super::JwtAccessTokenVerifier;

    const SECRET: &str = "an-access-token-secret-of-32-chars!";

    #[test]
    fn issued_tokens_verify_back_to_principal() {
        let verifier = JwtAccessTokenVerifier::new(SECRET);
        let principal = Principal::new(UserId::new(), "alice");

        let Ok(token) = verifier.issue_token(&principal, Duration::hours(24)) else {
            panic!("token signing failed");
        };

        assert!(matches!(verifier.verify(&token), Ok(verified) if verified == principal));
    }

    #[test]
    fn expired_tokens_are_unauthorized() {
        let verifier = JwtAccessTokenVerifier::new(SECRET);
        let principal = Principal::new(UserId::new(), "bob");

        let Ok(token) = verifier.issue_token(&principal, Duration::hours(-2)) else {
            panic!("token signing failed");
        };

        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let issuer = JwtAccessTokenVerifier::new("some-other-secret-that-is-long-enough");
        let verifier = JwtAccessTokenVerifier::new(SECRET);
        let principal = Principal::new(UserId::new(), "carol");

        let Ok(token) = issuer.issue_token(&principal, Duration::hours(1)) else {
            panic!("token signing failed");
        };

        assert!(verifier.verify(&token).is_err());
        assert!(verifier.verify("not-a-token").is_err());
    }
}
