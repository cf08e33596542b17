// crates/cf_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `CfError` 枚举和 `CfResult` 类型别名。
//!
//! 数值发散（求解器崩溃）不是错误，而是求解器状态，由 `cf_physics` 以状态标志表示。
//! 本类型只覆盖输入、配置和运行时基础设施的失败。
//!
//! # 示例
//!
//! ```
//! use cf_foundation::error::{CfError, CfResult};
//!
//! fn read_config() -> CfResult<()> {
//!     Err(CfError::config("配置文件格式错误"))
//! }
//! assert!(read_config().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type CfResult<T> = Result<T, CfError>;

/// CavityFlow 错误类型
#[derive(Error, Debug)]
pub enum CfError {
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 网格尺寸不匹配
    #[error("网格尺寸不匹配: {name} 期望 {expected_width}x{expected_height}, 实际 {actual_width}x{actual_height}")]
    DimensionMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望宽度
        expected_width: usize,
        /// 期望高度
        expected_height: usize,
        /// 实际宽度
        actual_width: usize,
        /// 实际高度
        actual_height: usize,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 通道发送失败
    #[error("通道发送失败: {channel}")]
    ChannelSend {
        /// 通道名称
        channel: &'static str,
    },

    /// 线程错误
    #[error("线程错误: {message}")]
    Thread {
        /// 错误描述
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl CfError {
    /// 从描述创建 IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 从IO错误创建（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 网格尺寸不匹配
    pub fn dimension_mismatch(
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Self::DimensionMismatch {
            name,
            expected_width: expected.0,
            expected_height: expected.1,
            actual_width: actual.0,
            actual_height: actual.1,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 线程错误
    pub fn thread(message: impl Into<String>) -> Self {
        Self::Thread {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl CfError {
    /// 检查网格尺寸是否一致
    #[inline]
    pub fn check_dimensions(
        name: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> CfResult<()> {
        if expected != actual {
            Err(Self::dimension_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> CfResult<()> {
        if value.is_nan() || value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }
}

impl From<std::io::Error> for CfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// 条件不满足时提前返回错误
///
/// ```
/// use cf_foundation::{ensure, CfError, CfResult};
///
/// fn positive(v: i32) -> CfResult<i32> {
///     ensure!(v > 0, CfError::invalid_input("必须为正"));
///     Ok(v)
/// }
/// assert!(positive(-1).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CfError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_file_not_found() {
        let err = CfError::file_not_found("/path/to/params.json");
        assert!(err.to_string().contains("/path/to/params.json"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = CfError::dimension_mismatch("pressure", (4, 4), (3, 5));
        let text = err.to_string();
        assert!(text.contains("pressure"));
        assert!(text.contains("4x4"));
        assert!(text.contains("3x5"));
    }

    #[test]
    fn test_check_dimensions() {
        assert!(CfError::check_dimensions("grid", (8, 8), (8, 8)).is_ok());
        assert!(CfError::check_dimensions("grid", (8, 8), (8, 7)).is_err());
    }

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(CfError::check_range("dt", 0.5, 0.0, 1.0).is_ok());
        assert!(CfError::check_range("dt", f64::NAN, 0.0, 1.0).is_err());
        assert!(CfError::check_range("dt", 2.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: CfError = io_err.into();
        assert!(matches!(err, CfError::Io { .. }));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> CfResult<()> {
            ensure!(value > 0, CfError::invalid_input("value must be positive"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }
}
