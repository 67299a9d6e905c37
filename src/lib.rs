mod auth;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod service;
mod session;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;

use crate::db::{stage_db, stage_session_store};
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::files::stage_object_storage;
use crate::service::google::GoogleAuth;
use crate::service::stripe::StripeClient;
use rocket::{Build, Rocket, catchers, http::Method};
use rocket_cors::{AllowedOrigins, CorsOptions};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG can override per module, e.g.
    //   RUST_LOG=info,liftoff::session=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn build_cors(cors_config: &config::CorsConfig) -> CorsOptions {
    let is_wildcard = cors_config.allowed_origins.len() == 1 && cors_config.allowed_origins[0] == "*";

    // Session cookies only flow on credentialed requests, which the CORS
    // spec forbids combining with a wildcard origin.
    if is_wildcard && cors_config.allow_credentials {
        panic!(
            "Invalid CORS configuration: Cannot use wildcard origins (*) with credentials enabled. \
            Either set specific origins or disable credentials."
        );
    }

    let allowed_origins = if cors_config.allowed_origins.is_empty() {
        AllowedOrigins::some_exact::<&str>(&[])
    } else if is_wildcard {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&cors_config.allowed_origins.iter().map(String::as_str).collect::<Vec<_>>())
    };

    CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Post, Method::Patch, Method::Delete, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: rocket_cors::AllowedHeaders::some(&["Content-Type", "Accept"]),
        allow_credentials: cors_config.allow_credentials,
        ..Default::default()
    }
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);

    let cors = build_cors(&config.cors).to_cors().expect("Failed to create CORS fairing");

    let google = GoogleAuth::new(config.google.clone());
    let stripe = config
        .stripe
        .api_key
        .clone()
        .map(|api_key| StripeClient::new(api_key, config.stripe.price_id.clone()));

    rocket::build()
        .attach(cors)
        .attach(RequestLogger)
        .attach(stage_db(config.database.clone()))
        .attach(stage_session_store(config.sessions.clone()))
        .attach(stage_object_storage(config.storage.clone()))
        .manage(google)
        .manage(stripe)
        .manage(config)
        .mount("/oauth", app_routes::oauth::routes())
        .mount("/api", app_routes::user::routes())
        .mount("/api", app_routes::auth::routes())
        .mount("/api", app_routes::subscription::routes())
        .mount("/api", app_routes::account::routes())
        .mount("/api", app_routes::health::routes())
        .register(
            "/",
            catchers![
                app_routes::error::bad_request,
                app_routes::error::unauthorized,
                app_routes::error::not_found,
                app_routes::error::unprocessable_entity,
                app_routes::error::internal_server_error,
            ],
        )
}
