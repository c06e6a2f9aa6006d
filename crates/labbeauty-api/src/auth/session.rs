//! HS256 session tokens carried in the `cookie-auth` cookie.

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use labbeauty_core::constants::SESSION_COOKIE_NAME;
use labbeauty_core::{AppError, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material and cookie attributes for sessions.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age_secs: i64,
    secure: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, max_age_secs: i64, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            max_age_secs,
            secure,
        }
    }

    pub fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            iat: now,
            exp: now + self.max_age_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign session: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("session has expired".to_string())
                }
                _ => AppError::Unauthorized("invalid session".to_string()),
            })
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn cookie(&self, token: &str) -> String {
        self.cookie_with(token, self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the session.
    pub fn expired_cookie(&self) -> String {
        self.cookie_with("", 0)
    }

    fn cookie_with(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE_NAME, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Value of the session cookie in a `Cookie` request header.
pub fn session_token(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            created_at: Utc::now(),
            name: "Olena".to_string(),
            email: "olena@example.com".to_string(),
            password_hash: String::new(),
            activated: true,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = SessionKeys::new("0123456789abcdef0123456789abcdef", 3600, false);
        let token = keys.issue(&user()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.email, "olena@example.com");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = SessionKeys::new("0123456789abcdef0123456789abcdef", 3600, false);
        let other = SessionKeys::new("fedcba9876543210fedcba9876543210", 3600, false);
        let token = issuer.issue(&user()).unwrap();
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::new("0123456789abcdef0123456789abcdef", -10, false);
        let token = keys.issue(&user()).unwrap();
        match keys.verify(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "session has expired"),
            other => panic!("expected expiry, got {:?}", other),
        }
    }

    #[test]
    fn cookie_attributes() {
        let keys = SessionKeys::new("0123456789abcdef0123456789abcdef", 3600, true);
        assert_eq!(
            keys.cookie("abc"),
            "cookie-auth=abc; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax; Secure"
        );
        assert!(keys.expired_cookie().starts_with("cookie-auth=; Path=/; Max-Age=0"));
    }

    #[test]
    fn token_is_found_among_cookies() {
        assert_eq!(session_token("theme=dark; cookie-auth=tok.en.x"), Some("tok.en.x"));
        assert_eq!(session_token("theme=dark"), None);
        assert_eq!(session_token("cookie-auth="), None);
    }
}
