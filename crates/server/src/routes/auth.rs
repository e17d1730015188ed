use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use common::types::ApiResponse;
use service::auth::{
    domain::{AuthUser, LoginInput},
    repo::SeaOrmAuthRepository,
    token::{Claims, TokenService},
    AuthConfig, AuthService,
};
use service::context::Operator;
use service::crypto::CardCipher;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenService>,
    pub cipher: Arc<CardCipher>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, jwt_secret: &str, token_ttl_secs: i64, card_secret: &str) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenService::new(jwt_secret, token_ttl_secs)),
            cipher: Arc::new(CardCipher::new(card_secret)),
        }
    }

    fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository::new(self.db.clone()));
        AuthService::new(repo, AuthConfig { tokens: Some(self.tokens.clone()), ..AuthConfig::default() })
    }
}

/// Raw token of the current request, kept for logout.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[derive(Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub user: AuthUser,
}

pub fn operator_from_claims(claims: Claims) -> Operator {
    Operator {
        user_id: Uuid::parse_str(&claims.uid).ok(),
        email: claims.sub,
        name: claims.name,
        role: claims.role,
        permissions: claims.perms,
    }
}

#[utoipa::path(post, path = "/api/v1/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Result<(CookieJar, Json<ApiResponse<LoginOutput>>), JsonApiError> {
    let session = state.auth_service().login(input).await?;
    let Some(token) = session.token else {
        return Err(JsonApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some("token generation failed".into())));
    };
    let mut cookie = Cookie::new(AUTH_COOKIE, token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(ApiResponse::with_message("登录成功", LoginOutput { token, user: session.user }))))
}

#[utoipa::path(post, path = "/api/v1/auth/logout", tag = "auth", responses((status = 200, description = "Logged Out"), (status = 401, description = "Unauthorized")))]
pub async fn logout(
    State(state): State<ServerState>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    Extension(op): Extension<Operator>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    state.tokens.revoke(&token);
    info!(email = %op.email, "user_logged_out");
    let jar = jar.remove(Cookie::from(AUTH_COOKIE));
    (jar, Json(ApiResponse::ok("退出成功")))
}

#[utoipa::path(get, path = "/api/v1/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, Extension(op): Extension<Operator>) -> Result<Json<ApiResponse<AuthUser>>, JsonApiError> {
    let id = op.user_id.ok_or_else(JsonApiError::unauthorized)?;
    let user = state.auth_service().current_user(id).await?;
    Ok(Json(ApiResponse::success(user)))
}

fn is_public(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS
        || path == "/health"
        || path == "/api/v1/auth/login"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
}

/// Token from `Authorization: Bearer`, falling back to the `auth_token` cookie.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return h.strip_prefix("Bearer ").map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    }
    let jar = CookieJar::from_headers(req.headers());
    jar.get(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|t| !t.is_empty())
}

/// 全局中间件：除公开路径外校验 token，并把当前操作人注入请求扩展
pub async fn require_auth(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_public(req.method(), &path) {
        return next.run(req).await;
    }
    let Some(token) = extract_token(&req) else {
        warn!(path = %path, "missing bearer token");
        return JsonApiError::unauthorized().into_response();
    };
    if state.tokens.is_revoked(&token) {
        warn!(path = %path, "revoked token presented");
        return JsonApiError::unauthorized().into_response();
    }
    match state.tokens.verify(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(operator_from_claims(claims));
            req.extensions_mut().insert(BearerToken(token));
            next.run(req).await
        }
        Err(e) => {
            warn!(path = %path, err = %e, "token validation failed");
            JsonApiError::unauthorized().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths() {
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::POST, "/api/v1/auth/login"));
        assert!(is_public(&Method::GET, "/docs/index.html"));
        assert!(is_public(&Method::GET, "/api-docs/openapi.json"));
        assert!(is_public(&Method::OPTIONS, "/api/v1/payers"));
        assert!(!is_public(&Method::GET, "/api/v1/payers"));
        assert!(!is_public(&Method::POST, "/api/v1/auth/logout"));
    }

    #[test]
    fn token_from_header_or_cookie() {
        let req = Request::builder().header(header::AUTHORIZATION, "Bearer abc").body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_token(&req).as_deref(), Some("abc"));
        let req = Request::builder().header(header::COOKIE, "x=1; auth_token=xyz").body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_token(&req).as_deref(), Some("xyz"));
        let req = Request::builder().header(header::AUTHORIZATION, "Basic abc").body(axum::body::Body::empty()).unwrap();
        assert!(extract_token(&req).is_none());
    }

    #[test]
    fn claims_become_operator() {
        let claims = Claims {
            sub: "ops@example.com".into(),
            uid: Uuid::nil().to_string(),
            name: "Ops".into(),
            role: "user".into(),
            perms: vec!["ACCOUNT_MANAGE".into()],
            iat: 0,
            exp: 0,
        };
        let op = operator_from_claims(claims);
        assert_eq!(op.user_id, Some(Uuid::nil()));
        assert!(op.can_manage_accounts());
    }
}
