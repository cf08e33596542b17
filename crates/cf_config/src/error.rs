// crates/cf_config/src/error.rs

//! 配置层错误类型

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 构造无效值错误
    pub fn invalid(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for cf_foundation::CfError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(source) => cf_foundation::CfError::io_with_source("读取配置失败", source),
            other => cf_foundation::CfError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("wp", 1, "至少为 2");
        assert!(err.to_string().contains("wp"));
        assert!(err.to_string().contains("至少为 2"));
    }

    #[test]
    fn test_into_foundation_error() {
        let err: cf_foundation::CfError = ConfigError::Parse("bad json".into()).into();
        assert!(matches!(err, cf_foundation::CfError::Config { .. }));
    }
}
