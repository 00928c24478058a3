/// Application settings loaded from config.toml
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Bootstrap admin account from environment variables
pub mod bootstrap;

pub use app::{AppConfig, load_config, load_default_config};
