//! Admin session tokens.
//!
//! Tokens are HS256 JWTs carrying their issuance time and a random id. A token
//! is valid for 24 hours after issuance; there is no revocation list.

use actix_web::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use uuid::Uuid;

use super::model::SessionClaims;

pub const SESSION_COOKIE_NAME: &str = "admin_session_token";
pub const SESSION_DURATION_SECS: i64 = 24 * 60 * 60;
const ADMIN_SUBJECT: &str = "admin";
/// Tolerated clock drift for tokens stamped slightly in the future.
const CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
    #[error("session token issued in the future")]
    NotYetValid,
    #[error("session expired")]
    Expired,
}

pub struct SessionGate {
    username: String,
    password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    secure_cookies: bool,
}

impl SessionGate {
    pub fn new(username: String, password: String, secret: &str, secure_cookies: bool) -> Self {
        Self {
            username,
            password,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            secure_cookies,
        }
    }

    /// Exact match against the configured admin credentials.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }

    pub fn issue_token(&self) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_token_at(Utc::now())
    }

    pub fn issue_token_at(&self, now: DateTime<Utc>) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = now.timestamp();
        let claims = SessionClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat,
            exp: iat + SESSION_DURATION_SECS,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.is_valid_at(token, Utc::now())
    }

    pub fn is_valid_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.validate_at(token, now).is_ok()
    }

    /// Check the signature, then the issuance time against `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is derived from `iat` below so it can be checked against `now`.
        validation.validate_exp = false;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)?.claims;
        let age = now.timestamp() - claims.iat;

        if age < -CLOCK_SKEW_SECS {
            return Err(SessionError::NotYetValid);
        }
        if age >= SESSION_DURATION_SECS {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE_NAME, token)
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .max_age(CookieDuration::seconds(SESSION_DURATION_SECS))
            .expires(OffsetDateTime::now_utc() + CookieDuration::seconds(SESSION_DURATION_SECS))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE_NAME, "")
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .finish();
        cookie.make_removal();
        cookie
    }
}
