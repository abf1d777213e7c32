use crate::config::Config;
use crate::models::Claims;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use chrono::{DateTime, Utc};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

use super::jwt::verify_token;

/// The authenticated admin for one request. Built from a verified token and
/// passed explicitly to handlers; nothing about the session lives in globals.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminSession {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(value_type = String, format = "date-time")]
    pub issued_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn from_claims(claims: Claims) -> Option<Self> {
        Some(AdminSession {
            username: claims.sub,
            issued_at: DateTime::from_timestamp(claims.iat as i64, 0)?,
            expires_at: DateTime::from_timestamp(claims.exp as i64, 0)?,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by the auth middleware on protected scopes
        if let Some(session) = req.extensions().get::<AdminSession>() {
            return ready(Ok(session.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        match AdminSession::from_claims(claims) {
            Some(session) if session.username == config.admin_username => ready(Ok(session)),
            _ => ready(Err(ErrorUnauthorized("Invalid session"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_carries_explicit_expiry() {
        let session = AdminSession::from_claims(Claims {
            sub: "admin".into(),
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            jti: "x".into(),
        })
        .unwrap();

        assert_eq!(session.expires_at.timestamp() - session.issued_at.timestamp(), 900);
        assert!(!session.is_expired(session.issued_at));
        assert!(session.is_expired(session.expires_at));
    }
}
