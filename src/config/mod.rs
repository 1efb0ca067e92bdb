//! Configuration management
//!
//! Configuration is loaded once at startup from an optional TOML file and
//! overridden by environment variables. The loaded value is held in a
//! global `OnceLock` and shared by reference for the process lifetime.

mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config};
pub use structs::{
    AppConfig, CacheConfig, CorsConfig, DatabaseConfig, LoggingConfig, RedisConfig,
    RefresherConfig, ServerConfig,
};
