//! Authentication and authorization for Navette
//!
//! JWT tokens (HS256) carrying an admin capability, Argon2 password hashing,
//! and Actix-web extractors that hand each handler an explicit request context.
//!
//! # Examples
//!
//! ```no_run
//! use actix_web::HttpResponse;
//! use navette_auth::{AdminUser, AuthContext};
//!
//! async fn public_route(ctx: AuthContext) -> HttpResponse {
//!     HttpResponse::Ok().json(ctx.is_admin)
//! }
//!
//! async fn admin_route(admin: AdminUser) -> HttpResponse {
//!     HttpResponse::Ok().body(admin.username.clone())
//! }
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{AdminUser, AuthContext, AuthenticatedUser};
pub use password::PasswordService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_round_trip() {
        let password_service = PasswordService::new();
        let jwt_service = JwtService::new("test-secret-key-12345", 3600);

        let hash = password_service.hash_password("s3cret").unwrap();
        assert!(password_service.verify_password("s3cret", &hash).unwrap());

        let token = jwt_service.create_token_for_user(1, "admin", true).unwrap();
        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "admin");
        assert!(claims.admin);
    }
}
