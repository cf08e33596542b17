// crates/cf_foundation/src/lib.rs

//! CavityFlow Foundation Layer
//!
//! 基础层，提供整个项目共用的存储原语和错误类型。
//!
//! # 模块概览
//!
//! - [`grid`]: 稠密二维网格容器 `Grid<T>`，所有场量的存储原语
//! - [`error`]: 统一错误类型
//!
//! # 设计原则
//!
//! 1. **最少依赖**: 仅依赖 serde 和 thiserror
//! 2. **行优先存储**: `index = y * width + x`
//! 3. **调用方负责边界**: 网格访问不做隐式越界检查，靠近计算域边缘时由调用方钳位
//!
//! # 示例
//!
//! ```
//! use cf_foundation::{Grid, Point};
//!
//! let mut grid: Grid<f64> = Grid::new(4, 3);
//! grid.set(1, 2, 5.0);
//! assert_eq!(grid.get(1, 2), 5.0);
//! assert_eq!(grid[Point::new(1, 2)], 5.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod grid;

// 重导出常用类型
pub use error::{CfError, CfResult};
pub use grid::{Grid, Point};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{CfError, CfResult};
    pub use crate::grid::{Grid, Point};
    pub use crate::ensure;
}
