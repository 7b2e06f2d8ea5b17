//! Salon booking reservation core
//!
//! Slot availability, the atomic booking transaction (conflict detection,
//! promo redemption, payment, loyalty and notification records) and the
//! appointment lifecycle, served as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository, config.booking.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
