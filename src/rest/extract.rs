use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;

use super::{error::ApiError, AppState};
use crate::{
    auth::{self, AuthError},
    storage::Storage,
    types::User,
};

/// The caller, resolved from the `Authorization` header.
pub struct AuthUser(pub User);

/// An authenticated caller holding the admin flag.
pub struct AdminUser(pub User);

/// `Json<T>` whose rejections come back as 400 with the usual error body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for AuthUser
where
    S: Storage + Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let outcome = match authorization(&parts.headers) {
            Ok(header) => auth::authenticate(&state.storage, header)?,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(user) => {
                log::debug!(
                    "Authenticated {} (admin: {}) for {} {}",
                    user.username,
                    user.is_admin,
                    parts.method,
                    parts.uri.path()
                );
                Ok(AuthUser(user))
            }
            Err(err) => {
                log::warn!(
                    "Rejected credentials for {} {}: {}",
                    parts.method,
                    parts.uri.path(),
                    err
                );
                Err(err.into())
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for AdminUser
where
    S: Storage + Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            log::warn!(
                "Access denied for {} on {} {}",
                user.username,
                parts.method,
                parts.uri.path()
            );
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// The `Authorization` value as text. A header that is present but not
/// visible ASCII is an invalid token, not a missing one.
fn authorization(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| AuthError::InvalidToken),
    }
}

pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|err| {
        log::warn!("Invalid id {}: {}", raw, err);
        ApiError::bad_request("invalid id")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::HeaderValue;

    #[test]
    fn unreadable_authorization_is_invalid_not_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(authorization(&headers), Ok(None));

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"Basic \xffYWRtaW4=").unwrap(),
        );
        assert_eq!(authorization(&headers), Err(AuthError::InvalidToken));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic YWRtaW46MTIzNA=="));
        assert_eq!(authorization(&headers), Ok(Some("Basic YWRtaW46MTIzNA==")));
    }

    #[test]
    fn parse_id_accepts_integers_only() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_id("4.2"), Err(ApiError::BadRequest(_))));
    }
}
