use pillow_core::{AppResult, Principal};

/// Port for turning a bearer access token into an authenticated principal.
pub trait AccessTokenVerifier: Send + Sync {
    /// Verifies the token signature and claims.
    ///
    /// Returns `AppError::Unauthorized` for malformed, expired or forged tokens.
    fn verify(&self, token: &str) -> AppResult<Principal>;
}
