use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    config::JwtConfig,
    domain::{Identity, Role},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload. Carries the whole caller identity so handlers never have to
/// re-read the user record on the hot path.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub is_admin: bool,
    pub exp: usize,
    pub iat: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, identity: Identity, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: identity.id,
            role: identity.role,
            is_admin: identity.is_admin,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = identity.id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, identity: Identity) -> anyhow::Result<String> {
        self.sign_with_kind(identity, TokenKind::Access)
    }
    pub fn sign_refresh(&self, identity: Identity) -> anyhow::Result<String> {
        self.sign_with_kind(identity, TokenKind::Refresh)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let claims = self.verify(token)?;
        if claims.kind != TokenKind::Refresh {
            anyhow::bail!("not a refresh token");
        }
        Ok(claims)
    }
}

/// Extracts the authenticated caller from the bearer token.
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid Authorization header".to_string(),
        ))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Access token required".to_string(),
            ));
        }

        Ok(AuthIdentity(Identity {
            id: claims.sub,
            role: claims.role,
            is_admin: claims.is_admin,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::test())
    }

    fn driver(id: i64) -> Identity {
        Identity {
            id,
            role: Role::Driver,
            is_admin: false,
        }
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(driver(7)).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Driver);
        assert!(!claims.is_admin);
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn admin_flag_survives_the_round_trip() {
        let keys = make_keys();
        let admin = Identity {
            id: 1,
            role: Role::Passenger,
            is_admin: true,
        };
        let token = keys.sign_access(admin).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert!(claims.is_admin);
        assert_eq!(claims.role, Role::Passenger);
    }

    #[test]
    fn verify_refresh_rejects_access_token() {
        let keys = make_keys();
        let token = keys.sign_access(driver(1)).expect("sign access");
        let err = keys.verify_refresh(&token).unwrap_err();
        assert!(err.to_string().contains("not a refresh token"));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let token = keys.sign_access(driver(1)).expect("sign access");

        let mut other = make_keys();
        other.decoding = DecodingKey::from_secret(b"different-secret");
        assert!(other.verify(&token).is_err());
    }
}
