use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::schema::{Uuid, User};
use crate::error::AuthenticationError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub is_staff: bool,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, is_staff: bool) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            is_staff,
            iat,
            exp,
        }
    }
}

/// Identity of the caller, injected into every handler that needs one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub is_staff: bool,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_staff: value.is_staff,
        }
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, potion::Error> {
    Hmac::new_from_slice(secret.as_bytes())
        .map_err(|_| AuthenticationError::new("Invalid signing key").into())
}

/// Signs a session token for `user`. Issuing tokens to clients is the job of
/// the external auth service; this is what it shares with us.
pub fn generate_jwt_session(user: &User, secret: &str) -> Result<String, potion::Error> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.is_staff);

    claims
        .sign_with_key(&key)
        .map_err(|_| AuthenticationError::new("Failed to sign session").into())
}

pub fn verify_jwt_session(token: &str, secret: &str) -> Result<JwtSessionData, potion::Error> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| AuthenticationError::new("Invalid session; Invalid token"))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(AuthenticationError::new("Invalid session; Token expired").into());
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    pub fn user(id: Uuid, username: &str) -> User {
        User {
            id,
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            avatar: None,
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn round_trips_session() {
        let token = generate_jwt_session(&user(7, "alice"), "secret").unwrap();
        let session: SessionData = verify_jwt_session(&token, "secret").unwrap().into();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "alice");
        assert!(!session.is_staff);
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = generate_jwt_session(&user(7, "alice"), "secret").unwrap();

        assert!(verify_jwt_session(&token, "other").is_err());
        assert!(verify_jwt_session("garbage", "secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let key: Hmac<Sha256> = Hmac::new_from_slice(b"secret").unwrap();
        let mut claims = JwtSessionData::new(7, "alice".to_string(), false);
        claims.exp = claims.iat - 10;
        let token = claims.sign_with_key(&key).unwrap();

        let err = verify_jwt_session(&token, "secret").unwrap_err();
        assert_eq!(err.code as u16, 401);
    }
}
