//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 聊天行解析失败
    #[error("failed to parse chat line '{line}': {message}")]
    ParseFailed {
        /// 原始行
        line: String,
        /// 错误消息
        message: String,
    },

    /// 读取失败
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestionError {
    pub fn parse_failed(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            line: line.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
