use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{
        authorization::{Basic, Bearer},
        Authorization,
    },
    TypedHeader,
};
use seatflow_core::Coordinator;
use seatflow_db::PgPool;
use seatflow_integrations::{click::ClickGateway, payme::PaymeGateway};
use seatflow_types::api::auth::{verify_bearer_token, AuthUser as VerifiedUser};
use seatflow_types::{AppError, Config};
use std::sync::Arc;

use crate::response::ApiError;

/// Shared application state every route handler pulls what it needs from.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub coordinator: Arc<Coordinator>,
    pub config: Arc<Config>,
    pub payme: Arc<PaymeGateway>,
    pub click: Arc<ClickGateway>,
}

/// Extractor for an authenticated caller of any role.
/// Usage: `async fn handler(AuthUser(user): AuthUser)`.
pub struct AuthUser(pub VerifiedUser);

/// Extractor that additionally requires the `admin` role (§6's admin-only
/// routes).
pub struct AdminUser(pub VerifiedUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: axum::extract::FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError(AppError::Unauthorized))?;

        let app_state = AppState::from_ref(state);
        let user = verify_bearer_token(&app_state.config.bearer_signing_secret, bearer.token())?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: axum::extract::FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError(AppError::Forbidden));
        }
        Ok(AdminUser(user))
    }
}

/// Basic-auth guard for Payme's JSON-RPC callback (§6's `basic-auth` row),
/// checked against the merchant credentials issued by Payme.
pub struct PaymeAuth;

#[async_trait]
impl<S> FromRequestParts<S> for PaymeAuth
where
    S: Send + Sync,
    AppState: axum::extract::FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(basic)) = parts
            .extract::<TypedHeader<Authorization<Basic>>>()
            .await
            .map_err(|_| ApiError(AppError::Unauthorized))?;

        let app_state = AppState::from_ref(state);
        if basic.username() == app_state.config.payme_merchant_id && basic.password() == app_state.config.payme_key {
            Ok(PaymeAuth)
        } else {
            Err(ApiError(AppError::Unauthorized))
        }
    }
}
