use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The caller's identity for the current request, extracted from the claims
/// that `AuthMiddleware` verified and stored in request extensions.
///
/// This is the only way handlers learn who is calling; there is no ambient
/// "current user" global. If the claims are missing (middleware not applied,
/// or an internal wiring error), extraction fails with
/// `AppError::Unauthenticated`.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: i32,
    pub username: String,
    pub scope: Role,
}

impl FromRequest for AuthenticatedAccount {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AuthenticatedAccount {
                account_id: claims.account_id,
                username: claims.sub.clone(),
                scope: claims.scope,
            })),
            None => {
                let err = AppError::Unauthenticated(
                    "No authenticated identity on request. Ensure AuthMiddleware is active."
                        .to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn sample_claims() -> Claims {
        Claims {
            sub: "alice".to_string(),
            iss: "planforge.app".to_string(),
            iat: 0,
            exp: usize::MAX,
            jti: "test-jti".to_string(),
            account_id: 123,
            scope: Role::Admin,
        }
    }

    #[actix_rt::test]
    async fn test_authenticated_account_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(sample_claims());

        let mut payload = Payload::None;
        let extracted = AuthenticatedAccount::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.account_id, 123);
        assert_eq!(extracted.username, "alice");
        assert_eq!(extracted.scope, Role::Admin);
    }

    #[actix_rt::test]
    async fn test_authenticated_account_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();
        // No claims inserted into extensions

        let mut payload = Payload::None;
        let result = AuthenticatedAccount::from_request(&req, &mut payload).await;
        assert!(result.is_err());

        let err = result.unwrap_err();
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
