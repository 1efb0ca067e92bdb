use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use tracing::{debug, error, warn};

use super::AppConfig;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// Load configuration from TOML file with environment variable fallback
    pub fn load() -> Self {
        let mut config = Self::load_from_file();
        config.override_with_env();
        config
    }

    /// Load configuration from TOML file
    fn load_from_file() -> Self {
        let config_paths = ["config.toml", "redron.toml", "/etc/redron/config.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                debug!("Loading config from: {}", path);
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str::<AppConfig>(&content) {
                        Ok(config) => {
                            debug!("Successfully loaded config from: {}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file {}: {}", path, e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file {}: {}", path, e);
                    }
                }
            }
        }

        debug!("No config file found, using defaults");
        Self::default()
    }

    /// Override configuration with environment variables
    fn override_with_env(&mut self) {
        // Server config
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            } else {
                error!("Invalid PORT: {}", port);
            }
        }
        // NODE_ENV 为兼容既有部署保留，RUN_ENV 优先
        if let Ok(node_env) = env::var("NODE_ENV") {
            self.server.env = node_env;
        }
        if let Ok(run_env) = env::var("RUN_ENV") {
            self.server.env = run_env;
        }
        if let Ok(cluster_enabled) = env::var("CLUSTER_ENABLED") {
            self.server.cluster_enabled = cluster_enabled != "false" && cluster_enabled != "0";
        }
        if let Ok(worker_count) = env::var("WORKER_COUNT") {
            if let Ok(count) = worker_count.parse() {
                self.server.workers = count;
            } else {
                error!("Invalid WORKER_COUNT: {}", worker_count);
            }
        }

        // Database config
        if let Ok(mongodb_url) = env::var("MONGODB_URL") {
            self.database.url = mongodb_url;
        }
        if let Ok(mongodb_db) = env::var("MONGODB_DB") {
            self.database.database = mongodb_db;
        }

        // Cache config
        if let Ok(redis_url) = env::var("REDIS_URL") {
            self.cache.redis.url = redis_url;
        }

        // CORS config
        if let Ok(cors_origin) = env::var("CORS_ORIGIN") {
            self.cors.origin = cors_origin;
        }

        // Logging config
        if let Ok(log_level) = env::var("RUST_LOG") {
            self.logging.level = log_level;
        }

        // 缺失数据源配置不是致命错误，进入降级模式并在启动时告警
        if self.database.url.is_empty() {
            warn!("MONGODB_URL is not set, starting in degraded mode");
        }
        if self.cache.redis.url.is_empty() {
            warn!("REDIS_URL is not set, starting in degraded mode");
        }
    }

    /// Whether both datastores are configured; when false the HTTP surface
    /// serves 503 on `/` and `/api/*` and only health endpoints respond.
    pub fn is_degraded(&self) -> bool {
        self.database.url.is_empty() || self.cache.redis.url.is_empty()
    }
}

// Global configuration instance

/// Get the global configuration instance
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::load)
}

/// Initialize the global configuration
pub fn init_config() {
    CONFIG.get_or_init(AppConfig::load);
}
