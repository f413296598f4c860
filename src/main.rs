use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;

mod config;
mod controllers;
mod db;
mod error;
mod models;
mod routes;
mod services;
mod state;
mod store;

use config::{Config, StorageBackend, DEV_SECRET_KEY};
use state::{AppState, AuthSettings};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file (if exists)
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let secret_key = match (config.secret_key.clone(), config.storage) {
        (Some(key), _) => key,
        (None, StorageBackend::Memory) => {
            log::warn!("SECRET_KEY is not set; using the development key");
            DEV_SECRET_KEY.to_string()
        }
        (None, StorageBackend::Mongo) => {
            log::error!("SECRET_KEY must be set when STORAGE=mongo");
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "SECRET_KEY must be set",
            ));
        }
    };
    let auth = AuthSettings {
        secret_key,
        access_token_expire_minutes: config.access_token_expire_minutes,
        bcrypt_cost: config.bcrypt_cost,
    };

    let app_state = match config.storage {
        StorageBackend::Memory => {
            log::info!("Using in-memory storage; data is lost on restart");
            AppState::in_memory(auth)
        }
        StorageBackend::Mongo => {
            let to_io = |e: mongodb::error::Error| std::io::Error::new(std::io::ErrorKind::Other, e);
            let client = db::init_db(&config.mongo_uri).await.map_err(to_io)?;
            let database = client.database(&config.mongo_db_name);
            db::ensure_indexes(&database).await.map_err(to_io)?;
            log::info!("Connected to MongoDB database {}", config.mongo_db_name);
            AppState::mongo(&database, auth)
        }
    };

    log::info!("Listening on {}:{}", config.server_host, config.server_port);

    // Build and run the HTTP server.
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default()) // Logging middleware
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            ) // CORS setup
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::init)
    })
    .bind((config.server_host, config.server_port))?
    .run()
    .await
}
