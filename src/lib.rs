// Core modules
pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod engine;
pub mod execution;
pub mod indicators;
pub mod llm;
pub mod models;
pub mod reflection;
pub mod sentiment;

// Re-export commonly used types
pub use config::Config;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
