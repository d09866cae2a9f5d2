use std::sync::Arc;

use warp::{
    reject::{self, Rejection},
    Filter,
};

use super::jwt::{verify_jwt_session, SessionData};
use crate::constants::SESSION_COOKIE;

#[derive(Debug)]
pub struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Pulls the raw token out of `Authorization: Token <jwt>` / `Bearer <jwt>`,
/// falling back to the session cookie.
fn extract_token(header: Option<String>, cookie: Option<String>) -> Option<String> {
    header
        .and_then(|value| {
            let value = value.trim();
            value
                .strip_prefix("Token ")
                .or_else(|| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
        .or(cookie)
        .filter(|token| !token.is_empty())
}

fn token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .map(extract_token)
}

pub fn with_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    token().and_then(move |token: Option<String>| {
        let secret = secret.clone();
        async move {
            match token.map(|token| verify_jwt_session(&token, &secret)) {
                Some(Ok(data)) => Ok(SessionData::from(data)),
                _ => Err(warp::reject::custom(Unauthorized)),
            }
        }
    })
}

/// Anonymous callers and callers with an unusable token both come out as `None`.
pub fn with_possible_session(
    secret: Arc<str>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    token().map(move |token: Option<String>| {
        token
            .and_then(|token| verify_jwt_session(&token, &secret).ok())
            .map(SessionData::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_header_or_cookie() {
        assert_eq!(
            extract_token(Some("Token abc".into()), None).as_deref(),
            Some("abc")
        );
        assert_eq!(
            extract_token(Some("Bearer xyz".into()), Some("cookie".into())).as_deref(),
            Some("xyz")
        );
        assert_eq!(
            extract_token(None, Some("cookie".into())).as_deref(),
            Some("cookie")
        );
        assert_eq!(extract_token(Some("Basic abc".into()), None), None);
        assert_eq!(extract_token(None, None), None);
    }
}
