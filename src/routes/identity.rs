//! Request extractors shared by the API routes.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    error::{AppError, ServiceError},
    state::identity::{IdentityError, UserId},
};

/// Header carrying the identity validated by the upstream authentication layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity, normalized from the [`USER_ID_HEADER`] header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(IdentityError::Missing)
            .and_then(|value| value.to_str().map_err(|_| IdentityError::Malformed))
            .map_err(ServiceError::from)?;

        let user = UserId::from_raw(raw).map_err(ServiceError::from)?;
        Ok(Self(user))
    }
}

/// JSON body that is decoded and then checked with [`Validate`].
///
/// Both decoding and validation failures are reported as `400` in the
/// standard error envelope.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
