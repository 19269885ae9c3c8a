use std::time::Duration;

use async_trait::async_trait;
use image::GrayImage;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

/// One captured raster, in greyscale.
pub type Frame = GrayImage;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("camera returned {0}")]
    Status(StatusCode),
}

/// Source of camera frames. Owned by exactly one scanner at a time.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// `Ok(None)` when the stream has no data ready yet.
    async fn capture(&self) -> Result<Option<Frame>, CameraError>;
}

/// Camera exposed as an HTTP still-image endpoint (IP camera or capture
/// daemon). `204 No Content` or an empty body means no frame is ready.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    client: Client,
    url: String,
}

impl SnapshotCamera {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl FrameSource for SnapshotCamera {
    async fn capture(&self) -> Result<Option<Frame>, CameraError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CameraError::Status(status));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        // a frame that cannot be decoded is just not ready
        match image::load_from_memory(&bytes) {
            Ok(img) => Ok(Some(img.to_luma8())),
            Err(e) => {
                debug!(error = %e, "Discarding undecodable camera frame");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpResponse, HttpServer, web};
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    fn png_frame() -> Vec<u8> {
        let img = GrayImage::from_pixel(8, 6, Luma([200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    async fn spawn_camera() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route("/ready", web::get().to(|| async {
                    HttpResponse::Ok().content_type("image/png").body(png_frame())
                }))
                .route("/warming", web::get().to(|| async { HttpResponse::NoContent().finish() }))
                .route("/garbage", web::get().to(|| async { HttpResponse::Ok().body("not an image") }))
                .route("/broken", web::get().to(|| async {
                    HttpResponse::ServiceUnavailable().finish()
                }))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}")
    }

    fn camera(base: &str, path: &str) -> SnapshotCamera {
        SnapshotCamera::new(format!("{base}{path}"), Duration::from_secs(5)).unwrap()
    }

    #[actix_web::test]
    async fn captures_ready_frame_as_greyscale() {
        let base = spawn_camera().await;
        let frame = camera(&base, "/ready").capture().await.unwrap().expect("frame");
        assert_eq!(frame.dimensions(), (8, 6));
    }

    #[actix_web::test]
    async fn no_content_and_garbage_are_not_ready() {
        let base = spawn_camera().await;
        assert!(camera(&base, "/warming").capture().await.unwrap().is_none());
        assert!(camera(&base, "/garbage").capture().await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn server_errors_are_camera_failures() {
        let base = spawn_camera().await;
        let err = camera(&base, "/broken").capture().await.unwrap_err();
        assert!(matches!(err, CameraError::Status(StatusCode::SERVICE_UNAVAILABLE)));
    }
}
