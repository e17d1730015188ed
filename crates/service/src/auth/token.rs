//! HS256 bearer tokens with an in-memory revocation list.

use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::AuthUser;
use super::errors::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// operator email
    pub sub: String,
    pub uid: String,
    #[serde(default)]
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub perms: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    // token -> exp
    revoked: DashMap<String, i64>,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            revoked: DashMap::new(),
        }
    }

    pub fn ttl_secs(&self) -> i64 { self.ttl_secs }

    /// Sign a token for `user`; returns the token and its `exp`.
    pub fn issue(&self, user: &AuthUser) -> Result<(String, i64), AuthError> {
        let iat = Utc::now().timestamp();
        let exp = iat + self.ttl_secs;
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id.to_string(),
            name: user.name.clone(),
            role: user.role.clone(),
            perms: user.permissions.clone(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok((token, exp))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if self.revoked.contains_key(token) {
            return Err(AuthError::TokenError("token revoked".into()));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(data.claims)
    }

    /// Reject `token` until it would have expired anyway.
    pub fn revoke(&self, token: &str) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
        let exp = self.verify(token).map(|c| c.exp).unwrap_or(now + self.ttl_secs);
        self.revoked.insert(token.to_string(), exp);
        debug!(revoked = self.revoked.len(), "token revoked");
    }

    pub fn is_revoked(&self, token: &str) -> bool { self.revoked.contains_key(token) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "ops@example.com".into(),
            name: "Ops".into(),
            role: "admin".into(),
            status: "active".into(),
            permissions: vec!["ACCOUNT_MANAGE".into()],
            avatar: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn issue_and_verify() {
        let svc = TokenService::new("secret", 900);
        let u = user();
        let (tok, exp) = svc.issue(&u).unwrap();
        let claims = svc.verify(&tok).unwrap();
        assert_eq!(claims.sub, "ops@example.com");
        assert_eq!(claims.uid, u.id.to_string());
        assert_eq!(claims.perms, vec!["ACCOUNT_MANAGE".to_string()]);
        assert_eq!(claims.exp, exp);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn wrong_secret_and_expired_are_rejected() {
        let (tok, _) = TokenService::new("a", 900).issue(&user()).unwrap();
        assert!(TokenService::new("b", 900).verify(&tok).is_err());

        let short = TokenService::new("a", -10);
        let (old, _) = short.issue(&user()).unwrap();
        assert!(short.verify(&old).is_err());
    }

    #[test]
    fn revoked_token_is_rejected() {
        let svc = TokenService::new("secret", 900);
        let (tok, _) = svc.issue(&user()).unwrap();
        svc.revoke(&tok);
        assert!(svc.is_revoked(&tok));
        assert!(svc.verify(&tok).is_err());
    }
}
