pub mod auth;
pub mod health;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::login)
            .service(auth::register)
            .service(auth::refresh_token)
            .service(auth::introspect)
            .service(auth::check_unique)
            .service(auth::send_otp)
            .service(auth::check_otp)
            .service(auth::change_password)
            .service(auth::outbound_authenticate)
            .service(auth::me),
    );
}
