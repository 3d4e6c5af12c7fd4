use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::users;
use crate::store::MySqlStore;
use crate::utils::{email_index::EmailIndex, time_window};
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "keytrak.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config).await?;
    let store = Data::new(MySqlStore::new(pool.clone()));

    if let Some(seed) = &config.super_admin {
        users::ensure_super_admin(store.get_ref(), seed, time_window::now())
            .await
            .context("Failed to create the super admin account")?;
    }

    let email_index = Data::new(EmailIndex::new());

    let (index, warmup_pool) = (email_index.clone(), pool.clone());
    actix_web::rt::spawn(async move {
        if let Err(e) = index.warmup_filter(&warmup_pool, 100).await {
            error!(error = ?e, "Failed to warmup email filter");
        }
    });

    let (index, warmup_pool) = (email_index.clone(), pool);
    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent users in batches of 250
        if let Err(e) = index.warmup_recent(&warmup_pool, 30, 250).await {
            error!(error = ?e, "Failed to warmup email cache");
        }
    });

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(email_index.clone())
            .app_data(config_data.clone())
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.get_ref().clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
