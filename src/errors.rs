use std::fmt;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法
/// - error_type() 方法
/// - message() 方法
macro_rules! define_redron_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum RedronError {
            $($variant(String),)*
        }

        impl RedronError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(RedronError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(RedronError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(RedronError::$variant(msg) => msg,)*
                }
            }
        }
    };
}

define_redron_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CacheOperation("E002", "Cache Operation Error"),
    DatabaseConnection("E003", "Database Connection Error"),
    DatabaseOperation("E004", "Database Operation Error"),
    DuplicateKey("E005", "Duplicate Key Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Serialization("E008", "Serialization Error"),
    Config("E009", "Configuration Error"),
    DateParse("E010", "Date Parse Error"),
    UrlParse("E011", "URL Parse Error"),
}

impl fmt::Display for RedronError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for RedronError {}

// 便捷的构造函数
impl RedronError {
    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        RedronError::CacheConnection(msg.into())
    }

    pub fn cache_operation<T: Into<String>>(msg: T) -> Self {
        RedronError::CacheOperation(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        RedronError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        RedronError::DatabaseOperation(msg.into())
    }

    pub fn duplicate_key<T: Into<String>>(msg: T) -> Self {
        RedronError::DuplicateKey(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        RedronError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        RedronError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        RedronError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        RedronError::Config(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        RedronError::DateParse(msg.into())
    }

    pub fn url_parse<T: Into<String>>(msg: T) -> Self {
        RedronError::UrlParse(msg.into())
    }
}

/// MongoDB 写冲突（E11000）需要单独映射为 DuplicateKey
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
        ErrorKind::Command(command_err) => command_err.code == 11000,
        _ => false,
    }
}

// 为常见的错误类型实现 From trait
impl From<mongodb::error::Error> for RedronError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            RedronError::DuplicateKey(err.to_string())
        } else {
            RedronError::DatabaseOperation(err.to_string())
        }
    }
}

impl From<redis::RedisError> for RedronError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() {
            RedronError::CacheConnection(err.to_string())
        } else {
            RedronError::CacheOperation(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RedronError {
    fn from(err: serde_json::Error) -> Self {
        RedronError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for RedronError {
    fn from(err: chrono::ParseError) -> Self {
        RedronError::DateParse(err.to_string())
    }
}

impl From<url::ParseError> for RedronError {
    fn from(err: url::ParseError) -> Self {
        RedronError::UrlParse(err.to_string())
    }
}

impl From<std::io::Error> for RedronError {
    fn from(err: std::io::Error) -> Self {
        RedronError::Config(err.to_string())
    }
}

impl actix_web::ResponseError for RedronError {
    fn status_code(&self) -> StatusCode {
        match self {
            RedronError::Validation(_) => StatusCode::BAD_REQUEST,
            RedronError::NotFound(_) => StatusCode::NOT_FOUND,
            RedronError::DuplicateKey(_) => StatusCode::CONFLICT,
            RedronError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = serde_json::json!({
            "code": self.code(),
            "error": self.error_type(),
        });

        // 错误详情只在开发环境返回
        if crate::config::get_config().server.is_development() {
            body["detail"] = serde_json::Value::String(self.message().to_string());
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

pub type Result<T> = std::result::Result<T, RedronError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn test_error_codes() {
        let err = RedronError::validation("bad field");
        assert_eq!(err.code(), "E006");
        assert_eq!(err.error_type(), "Validation Error");
        assert_eq!(err.message(), "bad field");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RedronError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RedronError::duplicate_key("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            RedronError::config("x").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RedronError::cache_operation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_format() {
        let err = RedronError::not_found("no such link");
        assert_eq!(err.to_string(), "Resource Not Found: no such link");
    }
}
