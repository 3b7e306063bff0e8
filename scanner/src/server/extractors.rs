//! Request credential extraction.

use super::error::ApiError;
use crate::authority::MIN_TOKEN_LEN;
use crate::types::Credential;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

/// Name of the cookie browsers carry the session token in
pub const AUTH_COOKIE: &str = "authToken";

/// Bearer token from the `Authorization` header or the `authToken` cookie
///
/// Rejects with 401 `Access Denied` when neither is present and 401
/// `Invalid token` when the token is too short to be a session token.
#[derive(Debug, Clone)]
pub struct BearerToken(pub Credential);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Access Denied"))?;

        if token.len() < MIN_TOKEN_LEN {
            return Err(ApiError::unauthorized("Invalid token"));
        }

        Ok(Self(Credential::new(token)))
    }
}

/// Header first, then cookie
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer header-token-123"),
            (header::COOKIE, "authToken=cookie-token-123"),
        ]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("header-token-123"));
    }

    #[test]
    fn cookie_among_others() {
        let map = headers(&[(header::COOKIE, "theme=dark; authToken=cookie-token-123; lang=en")]);
        assert_eq!(token_from_headers(&map).as_deref(), Some("cookie-token-123"));
    }

    #[test]
    fn missing_or_empty() {
        assert!(token_from_headers(&HeaderMap::new()).is_none());
        assert!(token_from_headers(&headers(&[(header::AUTHORIZATION, "Basic abc")])).is_none());
        assert!(token_from_headers(&headers(&[(header::COOKIE, "authToken=")])).is_none());
    }
}
