use actix_web::{web, App, HttpServer};
use clap::Parser;
use sqlchat::app::build_service;
use sqlchat::cli::{commands::{Cli, Commands}, run_cli};
use sqlchat::config::AppConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, cli.config).await {
            error!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting sqlchat server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let service = match build_service(&config) {
        Ok(s) => web::Data::new(s),
        Err(e) => {
            error!("Failed to initialize chat service: {}", e);
            std::process::exit(1);
        }
    };

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{} (provider: {})", host, port, service.provider_name());

    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(actix_web::middleware::Logger::default())
            .configure(sqlchat::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
