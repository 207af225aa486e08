use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::cookie::CookieJar;

use crate::routes::auth::claims::Claims;
use crate::state::AppState;

const AUTH_COOKIE: &str = "auth_token";

#[derive(Debug, PartialEq)]
pub struct AuthSession(pub Claims);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(AUTH_COOKIE).ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = state
            .jwt_keys
            .decode(token.value())
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Ok(AuthSession(claims.claims))
    }
}

/// Like `AuthSession` but never rejects; endpoints with optional auth
/// (download tracking) use this to attribute requests when a valid token
/// happens to be present.
#[derive(Debug, PartialEq)]
pub struct MaybeAuthSession(pub Option<Claims>);

impl FromRequestParts<AppState> for MaybeAuthSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let claims = jar
            .get(AUTH_COOKIE)
            .and_then(|token| state.jwt_keys.decode(token.value()).ok())
            .map(|data| data.claims);

        Ok(MaybeAuthSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::FromRequestParts,
        http::{header, Method, Request, StatusCode},
    };
    use axum_extra::extract::cookie::Cookie;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{AuthSession, MaybeAuthSession};
    use crate::routes::auth::claims::Claims;
    use crate::state::test_support::{test_state, test_jwt_keys};

    fn make_valid_jwt() -> String {
        let claims = Claims {
            id: uuid::Uuid::new_v4().to_string(),
            email: "test@example.com".into(),
            exp: (SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs()
                + 3600) as usize,
        };
        test_jwt_keys()
            .encode(&claims)
            .expect("JWT should create successfully")
    }

    fn request_with_cookie(token: &str) -> axum::http::request::Parts {
        let cookie = Cookie::new("auth_token", token.to_string());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header(header::COOKIE, cookie.to_string())
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_valid_token_extracted() {
        let mut parts = request_with_cookie(&make_valid_jwt());
        let result = AuthSession::from_request_parts(&mut parts, &test_state()).await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap().0.email, "test@example.com");
    }

    #[tokio::test]
    async fn test_missing_cookie_returns_unauthorized() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .body(())
            .unwrap();
        let mut parts = request.into_parts().0;
        let result = AuthSession::from_request_parts(&mut parts, &test_state()).await;

        assert_eq!(result, Err(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_invalid_token_returns_unauthorized() {
        let mut parts = request_with_cookie("invalid.token.here");
        let result = AuthSession::from_request_parts(&mut parts, &test_state()).await;

        assert_eq!(result, Err(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_optional_session_tolerates_garbage() {
        let mut parts = request_with_cookie("invalid.token.here");
        let result = MaybeAuthSession::from_request_parts(&mut parts, &test_state()).await;
        assert_eq!(result, Ok(MaybeAuthSession(None)));

        let mut parts = request_with_cookie(&make_valid_jwt());
        let result = MaybeAuthSession::from_request_parts(&mut parts, &test_state())
            .await
            .unwrap();
        assert!(result.0.is_some());
    }
}
