use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use taskflow::auth::{AuthMiddleware, TokenManager};
use taskflow::calendar::GoogleCalendarClient;
use taskflow::config::Config;
use taskflow::routes::{self, health};
use taskflow::store::PgStore;
use taskflow::AppState;

fn startup_error(e: taskflow::AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    let store = Arc::new(
        PgStore::connect(&config.database_url)
            .await
            .map_err(startup_error)?,
    );
    store.migrate().await.map_err(startup_error)?;

    let calendar = Arc::new(GoogleCalendarClient::new(&config.google));
    let tokens = TokenManager::new(&config.jwt_secret);
    let state = AppState::new(store.clone(), store, calendar, tokens.clone())
        .with_password_cost(config.bcrypt_cost);

    log::info!("Starting taskflow server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(tokens.clone()))
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
