//! Authenticated-identity extraction.
//!
//! Session resolution itself is an external collaborator; by the time a
//! request reaches this service the gateway has resolved the caller and
//! forwards the opaque user id in the `X-User-Id` header. A missing or
//! unparsable id is an authorization failure, never a crash.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;

use crate::io::response::{fail, messages};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user, passed explicitly into every domain call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthUser {
    pub id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.parse::<i64>().ok());

        match id {
            Some(id) => Ok(AuthUser { id }),
            None => Err(fail(StatusCode::UNAUTHORIZED, messages::NO_AUTHENTICATED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<AuthUser, Response> {
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header_resolves() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "42")
            .body(())
            .unwrap();
        let user = extract(request).await.unwrap();
        assert_eq!(user.id, 42);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let rejection = extract(request).await.unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_header_is_unauthorized() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "not-a-number")
            .body(())
            .unwrap();
        let rejection = extract(request).await.unwrap_err();
        assert_eq!(rejection.status(), StatusCode::UNAUTHORIZED);
    }
}
