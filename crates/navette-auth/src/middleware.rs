//! Actix-web request extractors
//!
//! - [`AuthContext`]: per-request context, always extracted. Anonymous or
//!   invalid credentials yield `is_admin = false`.
//! - [`AuthenticatedUser`]: requires a valid token (401 otherwise).
//! - [`AdminUser`]: requires a valid token with the admin capability (403 otherwise).

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use navette_core::error::AppError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cookie set by the login endpoint
pub const TOKEN_COOKIE: &str = "token";

/// Extract JWT token from request
///
/// Checks the `Authorization: Bearer` header first, then the `token` cookie.
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

fn authenticate(req: &HttpRequest) -> Result<Claims, AppError> {
    let jwt_service = req
        .app_data::<web::Data<Arc<JwtService>>>()
        .ok_or_else(|| {
            warn!("JwtService not found in app data");
            AppError::Internal("Authentication service not configured".to_string())
        })?;

    let token = extract_token_from_request(req).ok_or_else(|| {
        debug!("No authentication token found in request");
        AppError::Unauthorized("No authentication token provided".to_string())
    })?;

    jwt_service.validate_token(&token)
}

/// Authenticated user extractor
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub username: String,
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.claims.admin
    }
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.uid,
            username: claims.sub.clone(),
            claims,
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            authenticate(req)
                .map(AuthenticatedUser::from)
                .map_err(actix_web::Error::from),
        )
    }
}

/// Admin user extractor
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use navette_auth::AdminUser;
///
/// async fn admin_handler(admin: AdminUser) -> HttpResponse {
///     HttpResponse::Ok().body(format!("hello {}", admin.username))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = match AuthenticatedUser::from_request(req, payload).into_inner() {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !user.is_admin() {
            warn!(username = %user.username, "Admin access denied");
            return ready(Err(AppError::Forbidden.into()));
        }

        ready(Ok(AdminUser(user)))
    }
}

/// Per-request authentication context
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user: Option<AuthenticatedUser>,
    pub is_admin: bool,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Fail with 401/403 unless the context carries the admin capability
    pub fn require_admin(&self) -> Result<&AuthenticatedUser, AppError> {
        match &self.user {
            Some(user) if self.is_admin => Ok(user),
            Some(_) => Err(AppError::Forbidden),
            None => Err(AppError::Unauthorized("Authentication required".to_string())),
        }
    }
}

impl FromRequest for AuthContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = match authenticate(req) {
            Ok(claims) => {
                let user = AuthenticatedUser::from(claims);
                AuthContext {
                    is_admin: user.is_admin(),
                    user: Some(user),
                }
            }
            Err(e) => {
                debug!(reason = %e, "Anonymous request");
                AuthContext::anonymous()
            }
        };

        ready(Ok(ctx))
    }
}
