use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::UserRole;
use crate::errors::AppError;

/// Claims carried by the bearer token this system verifies (HS256, shared
/// signing secret). Token issuance is an external collaborator's job — this
/// system only verifies (§4.7/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub role: UserRole,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// The caller identity extracted from a verified bearer token, injected into
/// request handlers and WebSocket connection setup via an extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

/// Verifies an HS256 bearer token against the configured signing secret,
/// shared by the HTTP auth middleware and the WebSocket upgrade handler so
/// both surfaces authenticate identically (§4.7/§6).
pub fn verify_bearer_token(secret: &str, token: &str) -> crate::Result<AuthUser> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(jsonwebtoken::Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        AppError::Unauthorized
    })?;

    Ok(data.claims.into())
}
