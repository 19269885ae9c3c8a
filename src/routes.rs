use crate::api::{attendance, scanner};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Context, Result};

pub type CheckInLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` requests, all of them as a burst.
pub fn build_limiter(requests_per_min: u32) -> Result<CheckInLimiter> {
    let per_ms = (60_000 / u64::from(requests_per_min.max(1))).max(1);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("RATE_CHECKIN_PER_MIN must be greater than zero")
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &CheckInLimiter) {
    cfg.service(
        web::scope(api_prefix)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .wrap(Governor::new(limiter)) // rate limiting
                            .route(web::put().to(attendance::mark_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/refresh
                    .service(
                        web::resource("/refresh")
                            .route(web::post().to(attendance::refresh_attendance)),
                    )
                    // /attendance/worker/{token}
                    .service(
                        web::resource("/worker/{token}")
                            .route(web::get().to(attendance::worker_attendance)),
                    ),
            )
            .service(web::resource("/scanner").route(web::get().to(scanner::scanner_status))),
    );
}
