//! Configuration and file management for gh-deploy-board
//!
//! This crate provides:
//! - File path utilities for config files
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)
//! - Session persistence (token and last repository selection per session)

pub mod app_config;
pub mod config_file;
pub mod paths;
pub mod session;

/// Default GitHub host (public GitHub)
pub const DEFAULT_HOST: &str = "github.com";

pub use app_config::AppConfig;
pub use config_file::load_config_file;
pub use paths::{config_dir, session_store_path};
pub use session::{MemorySessionStore, SessionPersistence, SessionRecord, SessionStore};
