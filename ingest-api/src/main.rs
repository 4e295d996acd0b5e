use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use extractors::bank_parsers::ParserRegistry;
use tracing_subscriber::prelude::*;

mod ai_fallback;
mod config;
mod database;
mod handlers;
mod helpers;
mod pipeline;

#[get("/")]
async fn hello() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "ingest-api"
    }))
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("ingest-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let db = helpers::database::initialize_database().expect("Failed to initialize database");

    tracing::info!(path = ?helpers::database::get_db_path().unwrap(), "database initialized");

    let (config, config_path) = config::ApiConfig::load().expect("Failed to load config");
    tracing::info!(path = ?config_path, "config loaded");

    let (host, port) = if let Some(server_config) = &config.server {
        (server_config.host.clone(), server_config.port)
    } else {
        ("127.0.0.1".to_string(), 8080)
    };

    tracing::info!("Server will listen on {}:{}", host, port);

    let registry = web::Data::new(ParserRegistry::new());

    // Periodic sweep: request_logs are an append-only audit trail (§3
    // Lifecycles) but are pruned after 24h so the table doesn't grow
    // unbounded on a long-running deployment.
    let prune_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let cutoff = chrono::Utc::now() - chrono::Duration::hours(24);
            match prune_db.prune_request_logs(cutoff).await {
                Ok(n) if n > 0 => tracing::info!("pruned {} stale request logs", n),
                Ok(_) => {}
                Err(e) => tracing::warn!("failed to prune request logs: {}", e),
            }
        }
    });

    tracing::info!("Starting server on {}:{}", host, port);

    let async_db = web::Data::new(db.async_connection.clone());

    let server = HttpServer::new(move || {
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(async_db.clone())
            .app_data(registry.clone())
            .service(hello)
            .route("/v1/health", web::get().to(handlers::health::health))
            .route("/v1/ingest/sms", web::post().to(handlers::ingest::ingest_sms))
            .route("/v1/ingest/email", web::post().to(handlers::ingest::ingest_email))
            .route("/v1/ingest/file", web::post().to(handlers::ingest::ingest_file))
            .route("/v1/ingest/cas", web::post().to(handlers::ingest::ingest_cas))
            .route("/v1/patterns", web::get().to(handlers::patterns::list))
            .route("/v1/patterns", web::post().to(handlers::patterns::create))
            .route("/v1/patterns/banks", web::get().to(handlers::patterns::banks))
            .route("/v1/patterns/test", web::post().to(handlers::patterns::test))
            .route("/v1/patterns/{id}", web::get().to(handlers::patterns::get))
            .route("/v1/patterns/{id}", web::put().to(handlers::patterns::update))
            .route("/v1/patterns/{id}/deactivate", web::post().to(handlers::patterns::deactivate))
            .route("/v1/config/mapping", web::post().to(handlers::file_mappings::save))
            .route("/v1/config/aliases", web::get().to(handlers::aliases::list))
            .route("/v1/config/aliases", web::post().to(handlers::aliases::create))
            .route("/v1/config/aliases/{id}", web::delete().to(handlers::aliases::delete))
            .route("/v1/config/ai", web::get().to(handlers::ai_config::get))
            .route("/v1/config/ai", web::post().to(handlers::ai_config::update))
            .route("/v1/logs", web::get().to(handlers::logs::list))
            .route("/v1/logs/{id}", web::get().to(handlers::logs::get))
            .route("/v1/stats", web::get().to(handlers::logs::stats))
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await
}
