//! Visual token scanner: samples a camera on a fixed cadence and hands every
//! decoded token to a subscriber.

pub mod camera;
pub mod decoder;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::utils::timer::{TimerHandle, spawn_periodic};
use camera::FrameSource;
use decoder::TokenDecoder;

pub const DEFAULT_CADENCE: Duration = Duration::from_millis(2_000);
pub const MIN_CADENCE: Duration = Duration::from_millis(100);
pub const MAX_CADENCE: Duration = Duration::from_secs(60);

/// Keeps the sampling cadence non-zero and bounded.
pub fn bounded_cadence(cadence: Duration) -> Duration {
    cadence.clamp(MIN_CADENCE, MAX_CADENCE)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScanStats {
    pub ticks: u64,
    /// Ticks where the camera had a frame ready.
    pub frames: u64,
    pub decodes: u64,
}

#[derive(Debug, Default)]
struct Shared {
    last_scanned: RwLock<Option<String>>,
    ticks: AtomicU64,
    frames: AtomicU64,
    decodes: AtomicU64,
}

pub struct VisualTokenScanner {
    source: Arc<dyn FrameSource>,
    decoder: Arc<dyn TokenDecoder>,
    cadence: Duration,
}

impl VisualTokenScanner {
    /// Takes ownership of the camera; it is released when the scanner stops.
    pub fn new(
        source: impl FrameSource + 'static,
        decoder: impl TokenDecoder + 'static,
        cadence: Duration,
    ) -> Self {
        Self {
            source: Arc::new(source),
            decoder: Arc::new(decoder),
            cadence: bounded_cadence(cadence),
        }
    }

    /// Starts sampling. The first tick happens one cadence after start.
    pub fn start<F>(self, on_decoded: F) -> ScannerHandle
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared::default());
        let on_decoded = Arc::new(on_decoded);
        let Self {
            source,
            decoder,
            cadence,
        } = self;

        let timer = {
            let shared = shared.clone();
            spawn_periodic(cadence, move || {
                tick(
                    source.clone(),
                    decoder.clone(),
                    shared.clone(),
                    on_decoded.clone(),
                )
            })
        };

        debug!(cadence_ms = cadence.as_millis() as u64, "Scanner started");
        ScannerHandle {
            timer,
            shared,
            cadence,
        }
    }
}

async fn tick<F>(
    source: Arc<dyn FrameSource>,
    decoder: Arc<dyn TokenDecoder>,
    shared: Arc<Shared>,
    on_decoded: Arc<F>,
) where
    F: Fn(String) + Send + Sync + 'static,
{
    shared.ticks.fetch_add(1, Ordering::Relaxed);

    let frame = match source.capture().await {
        Ok(Some(frame)) => frame,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, "Camera capture failed, skipping tick");
            return;
        }
    };
    shared.frames.fetch_add(1, Ordering::Relaxed);

    let decoded = match tokio::task::spawn_blocking(move || decoder.decode(&frame)).await {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "Token decoding aborted");
            None
        }
    };

    let Some(token) = decoded else {
        return;
    };

    shared.decodes.fetch_add(1, Ordering::Relaxed);
    *shared
        .last_scanned
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

    debug!(token = %token, "Visual token decoded");
    on_decoded(token);
}

/// Running scanner. Stopping is idempotent; dropping the handle stops it too.
#[derive(Debug)]
pub struct ScannerHandle {
    timer: TimerHandle,
    shared: Arc<Shared>,
    cadence: Duration,
}

impl ScannerHandle {
    pub fn stop(&self) {
        self.timer.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.timer.is_finished()
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn last_scanned(&self) -> Option<String> {
        self.shared
            .last_scanned
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats {
            ticks: self.shared.ticks.load(Ordering::Relaxed),
            frames: self.shared.frames.load(Ordering::Relaxed),
            decodes: self.shared.decodes.load(Ordering::Relaxed),
        }
    }
}
