use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::{Context, bail};

mod api;
mod checkin;
mod config;
mod docs;
mod error;
mod gateway;
mod kiosk;
mod ledger;
mod model;
mod routes;
mod scanner;
mod tenant;
mod utils;

use config::Config;
use gateway::HttpAttendanceGateway;
use kiosk::KioskState;
use scanner::VisualTokenScanner;
use scanner::camera::SnapshotCamera;
use scanner::decoder::QrDecoder;
use tenant::resolver::{hostname_of, resolve};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance kiosk is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "checkin.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let gateway = HttpAttendanceGateway::new(&config.backend_url, config.backend_timeout)
        .context("Failed to build attendance backend client")?;
    info!(backend = gateway.base_url(), "Attendance backend configured");

    let mut kiosk = KioskState::new(Arc::new(gateway), config.refresh_interval, config.tenant_idle);

    if let (Some(camera_url), Some(kiosk_host)) = (&config.camera_url, &config.kiosk_host) {
        let tenant = resolve(hostname_of(kiosk_host));
        if !tenant.is_resolved() {
            bail!("KIOSK_HOST {kiosk_host} has no tenant subdomain");
        }

        let camera = SnapshotCamera::new(camera_url.as_str(), config.backend_timeout)
            .context("Failed to build camera client")?;
        let scanner = VisualTokenScanner::new(camera, QrDecoder, config.scan_interval);
        kiosk = kiosk.with_camera(tenant, scanner);
    }

    let kiosk = Data::new(kiosk);
    let limiter = routes::build_limiter(config.rate_checkin_per_min)?;
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        let config = config.clone();
        let limiter = limiter.clone();

        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(kiosk.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &config.api_prefix, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
