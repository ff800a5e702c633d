use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;

use planforge_auth::auth::{
    AuthMiddleware, CredentialService, GoogleFederator, LogMailer, PgAccountRepository,
    RedisSessionStore,
};
use planforge_auth::config::Config;
use planforge_auth::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    let sessions = RedisSessionStore::connect(&config.redis_url)
        .await
        .expect("Failed to connect to session store");
    let federator = GoogleFederator::new(config.auth.google.clone(), config.auth.upstream_timeout)
        .expect("Failed to build identity federator");

    let service = CredentialService::new(
        Arc::new(PgAccountRepository::new(pool)),
        Arc::new(sessions),
        Arc::new(federator),
        Arc::new(LogMailer),
        &config.auth,
    );
    // The middleware verifies bearer tokens with its own codec handle.
    let codec = web::Data::new(service.token_codec().clone());
    let service = web::Data::new(service);

    log::info!("Starting PlanForge auth server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(codec.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
