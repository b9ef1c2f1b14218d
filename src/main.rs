// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, upload storage and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_files::Files;
use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use db::PgArticleRepository;
use dotenv::dotenv;
use services::{NewsService, UploadWriter};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting desa-news service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Prepare upload storage
    let uploads = UploadWriter::new(config.news_upload_dir());
    std::fs::create_dir_all(uploads.dir())?;
    log::info!("Storing news photos in {}", uploads.dir().display());

    let news_service = web::Data::new(NewsService::new(
        PgArticleRepository::new(pool),
        uploads,
        config.request_timeout(),
    ));

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let upload_root = config.upload_dir.clone();
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            // Application state (news service and config)
            .app_data(news_service.clone())
            .app_data(config_data.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::news_config)
            // Uploaded media, mirrored from the upload directory
            .service(Files::new("/uploads", upload_root.clone()))
    })
    .bind(&server_addr)?
    .run()
    .await
}
