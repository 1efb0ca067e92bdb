use serde::{Deserialize, Serialize};

/// 应用程序配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub refresher: RefresherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// 运行环境：development / production
    #[serde(default = "default_server_env")]
    pub env: String,
    #[serde(default = "default_cluster_enabled")]
    pub cluster_enabled: bool,
    #[serde(default = "default_worker_count")]
    pub workers: usize,
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.env == "development"
    }
}

/// MongoDB 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接 URL，为空时进入降级模式
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_database_name")]
    pub database: String,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

/// 共享缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub redis: RedisConfig,
    /// 进程内排行副本的新鲜度窗口（秒）
    #[serde(default = "default_fronting_ttl")]
    pub fronting_ttl: u64,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// 连接 URL，为空时进入降级模式
    #[serde(default)]
    pub url: String,
}

/// 排行刷新任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefresherConfig {
    #[serde(default = "default_refresher_enabled")]
    pub enabled: bool,
    /// 启动时立即刷新一次，不等首次定时触发
    #[serde(default = "default_refresh_at_startup")]
    pub refresh_at_startup: bool,
}

/// CORS 跨域配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的来源，"*" 表示任意
    #[serde(default = "default_cors_origin")]
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// Default value functions
fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_server_env() -> String {
    "production".to_string()
}

fn default_cluster_enabled() -> bool {
    true
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_database_name() -> String {
    "redron".to_string()
}

fn default_database_timeout() -> u64 {
    30
}

fn default_fronting_ttl() -> u64 {
    60
}

fn default_refresher_enabled() -> bool {
    true
}

fn default_refresh_at_startup() -> bool {
    true
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_max_backups() -> u32 {
    7
}

fn default_enable_rotation() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            env: default_server_env(),
            cluster_enabled: default_cluster_enabled(),
            workers: default_worker_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: default_database_name(),
            timeout: default_database_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            fronting_ttl: default_fronting_ttl(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self { url: String::new() }
    }
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            enabled: default_refresher_enabled(),
            refresh_at_startup: default_refresh_at_startup(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: default_cors_origin(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
