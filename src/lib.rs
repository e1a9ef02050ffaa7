pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use db::Store;
use services::{ai::AiService, photos::PhotoStorage, submissions::CaptureRules};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// `None` when no AI provider credential is configured.
    pub ai: Option<Arc<AiService>>,
    pub photos: Arc<PhotoStorage>,
    pub capture_rules: Arc<CaptureRules>,
}
