use crate::{
    auth::{
        AuthResponse, AuthenticatedAccount, ChangePasswordRequest, CredentialService,
        IntrospectRequest, IntrospectResponse, LoginRequest, OtpCheckRequest, OutboundAuthQuery,
        RegisterRequest, SendOtpQuery, SendOtpResponse, UniqueCheckRequest, UniqueCheckResponse,
        REFRESH_COOKIE,
    },
    error::AppError,
    models::AccountResponse,
};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

fn refresh_cookie(token: &str, ttl: std::time::Duration) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token.to_string())
        .path("/api/auth")
        .http_only(true)
        .max_age(CookieDuration::seconds(ttl.as_secs() as i64))
        .finish()
}

/// Login with username and password.
///
/// Returns the access token in the body and sets the refresh token as an
/// HTTP-only, path-scoped cookie.
#[post("/login")]
pub async fn login(
    service: web::Data<CredentialService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    let issued = service
        .login(&login_data.username, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&issued.refresh_token, issued.refresh_ttl))
        .json(AuthResponse {
            token: issued.access_token,
            success: true,
        }))
}

/// Register a new account.
#[post("/register")]
pub async fn register(
    service: web::Data<CredentialService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    let account = service.register(&register_data).await?;

    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// Exchange the refresh-token cookie for a new access token.
///
/// The refresh token itself is not rotated; the same cookie keeps working
/// until it expires or a newer login replaces the stored session.
#[post("/refresh-token")]
pub async fn refresh_token(
    service: web::Data<CredentialService>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let cookie = req
        .cookie(REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthenticated("Missing refresh token".into()))?;

    let access_token = service.refresh(cookie.value()).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token: access_token,
        success: true,
    }))
}

/// Report whether an access token is currently valid.
#[post("/introspect")]
pub async fn introspect(
    service: web::Data<CredentialService>,
    request: web::Json<IntrospectRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    Ok(HttpResponse::Ok().json(IntrospectResponse {
        valid: service.introspect(&request.token),
    }))
}

/// Check whether an email and phone number are still available.
#[post("/check-unique")]
pub async fn check_unique(
    service: web::Data<CredentialService>,
    request: web::Json<UniqueCheckRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    let check = service.check_unique(&request.email, &request.phone).await?;

    Ok(HttpResponse::Ok().json(UniqueCheckResponse {
        is_email_valid: check.email_available,
        is_phone_valid: check.phone_available,
    }))
}

/// Send a password-reset code to the account matching `key` (email or
/// username). The response does not reveal which field matched.
#[post("/send-otp")]
pub async fn send_otp(
    service: web::Data<CredentialService>,
    query: web::Query<SendOtpQuery>,
) -> Result<impl Responder, AppError> {
    let outcome = service.send_otp(&query.key).await?;

    Ok(HttpResponse::Ok().json(SendOtpResponse {
        username: outcome.username,
        email: outcome.email,
        valid: outcome.valid,
    }))
}

/// Verify a password-reset code without consuming it.
#[post("/check-otp")]
pub async fn check_otp(
    service: web::Data<CredentialService>,
    request: web::Json<OtpCheckRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    let valid = service.check_otp(&request.username, &request.otp).await?;

    Ok(HttpResponse::Ok().json(json!({ "valid": valid })))
}

/// Consume a password-reset code to set a new password.
#[post("/change-password")]
pub async fn change_password(
    service: web::Data<CredentialService>,
    request: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    service
        .change_password(&request.username, &request.otp, &request.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed successfully" })))
}

/// OAuth2 federated login using the provider's authorization code.
///
/// Issues an access token only; this path sets no refresh cookie.
#[post("/outbound/authentication")]
pub async fn outbound_authenticate(
    service: web::Data<CredentialService>,
    query: web::Query<OutboundAuthQuery>,
) -> Result<impl Responder, AppError> {
    let access_token = service.outbound_authenticate(&query.code).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token: access_token,
        success: true,
    }))
}

/// Identity of the authenticated caller, straight from the verified claims.
#[get("/me")]
pub async fn me(identity: AuthenticatedAccount) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(json!({
        "account_id": identity.account_id,
        "username": identity.username,
        "scope": identity.scope,
    })))
}
