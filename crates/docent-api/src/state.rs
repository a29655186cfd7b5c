//! Application state management

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use docent_core::AppConfig;
use docent_rag::RagHandles;

/// Application state shared across handlers
///
/// The pipeline components are constructed once at startup and injected
/// here; handlers never build clients of their own.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Pipeline handles (ingestor + assistant)
    pub rag: RagHandles,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig, rag: RagHandles) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            rag,
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
