// crates/cf_config/src/boundary.rs

//! 边界条件类型定义
//!
//! 本模块定义计算域四条外边的边界条件：
//! - ConditionType: Dirichlet（给定值）或 Neumann（零梯度）
//! - BoundaryCond: 单条边上的速度与压力条件
//! - Edge: 外边标识，顺序即边界施加顺序
//! - DomainBoundaries: 四条边的完整组合

use glam::DVec2;
use serde::{Deserialize, Serialize};

// ============================================================
// 条件类型
// ============================================================

/// 边界条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ConditionType {
    /// 给定值
    Dirichlet = 0,
    /// 零法向梯度（复制相邻内部值）
    #[default]
    Neumann = 1,
}

impl ConditionType {
    /// 是否为 Dirichlet
    #[inline]
    pub fn is_dirichlet(self) -> bool {
        matches!(self, Self::Dirichlet)
    }
}

impl std::fmt::Display for ConditionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dirichlet => "Dirichlet",
            Self::Neumann => "Neumann",
        };
        write!(f, "{}", name)
    }
}

// ============================================================
// 单边边界条件
// ============================================================

/// 单条外边的边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCond {
    /// 速度条件类型
    #[serde(default)]
    pub velocity_type: ConditionType,

    /// 给定速度（仅 Dirichlet 生效）
    #[serde(default)]
    pub velocity_value: DVec2,

    /// 压力条件类型
    #[serde(default)]
    pub pressure_type: ConditionType,

    /// 给定压力（仅 Dirichlet 生效）
    #[serde(default)]
    pub pressure_value: f64,
}

impl Default for BoundaryCond {
    fn default() -> Self {
        Self::wall()
    }
}

impl BoundaryCond {
    /// 无滑移固壁：速度 Dirichlet (0, 0)，压力 Neumann
    ///
    /// # 示例
    /// ```
    /// use cf_config::boundary::{BoundaryCond, ConditionType};
    ///
    /// let bc = BoundaryCond::wall();
    /// assert_eq!(bc.velocity_type, ConditionType::Dirichlet);
    /// assert_eq!(bc.pressure_type, ConditionType::Neumann);
    /// ```
    pub fn wall() -> Self {
        Self {
            velocity_type: ConditionType::Dirichlet,
            velocity_value: DVec2::ZERO,
            pressure_type: ConditionType::Neumann,
            pressure_value: 0.0,
        }
    }

    /// 运动壁面（如顶盖驱动），压力 Neumann
    pub fn moving_wall(velocity: DVec2) -> Self {
        Self {
            velocity_value: velocity,
            ..Self::wall()
        }
    }

    /// 速度入流，压力 Neumann
    pub fn inflow(velocity: DVec2) -> Self {
        Self::moving_wall(velocity)
    }

    /// 压力出流：速度零梯度，压力固定
    pub fn outflow(pressure: f64) -> Self {
        Self {
            velocity_type: ConditionType::Neumann,
            velocity_value: DVec2::ZERO,
            pressure_type: ConditionType::Dirichlet,
            pressure_value: pressure,
        }
    }

    /// 全 Neumann（自由滑移的零梯度边）
    pub fn zero_gradient() -> Self {
        Self {
            velocity_type: ConditionType::Neumann,
            velocity_value: DVec2::ZERO,
            pressure_type: ConditionType::Neumann,
            pressure_value: 0.0,
        }
    }

    /// 设置压力为 Dirichlet
    pub fn with_pressure(mut self, value: f64) -> Self {
        self.pressure_type = ConditionType::Dirichlet;
        self.pressure_value = value;
        self
    }

    /// 设置速度为 Dirichlet
    pub fn with_velocity(mut self, value: DVec2) -> Self {
        self.velocity_type = ConditionType::Dirichlet;
        self.velocity_value = value;
        self
    }
}

// ============================================================
// 外边
// ============================================================

/// 计算域外边
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// y = 0
    Bottom,
    /// y = hp - 1
    Top,
    /// x = 0
    Left,
    /// x = wp - 1
    Right,
}

impl Edge {
    /// 施加顺序；角点归属于后施加的左右两边
    pub const ALL: [Edge; 4] = [Edge::Bottom, Edge::Top, Edge::Left, Edge::Right];

    /// 边名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Bottom => "bottom",
            Self::Top => "top",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// 四边组合
// ============================================================

/// 四条外边的边界条件
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DomainBoundaries {
    /// 下边 (y = 0)
    #[serde(default)]
    pub bottom: BoundaryCond,
    /// 上边 (y = hp - 1)
    #[serde(default)]
    pub top: BoundaryCond,
    /// 左边 (x = 0)
    #[serde(default)]
    pub left: BoundaryCond,
    /// 右边 (x = wp - 1)
    #[serde(default)]
    pub right: BoundaryCond,
}

impl DomainBoundaries {
    /// 四边相同
    pub fn uniform(cond: BoundaryCond) -> Self {
        Self {
            bottom: cond,
            top: cond,
            left: cond,
            right: cond,
        }
    }

    /// 按边读取
    #[inline]
    pub fn get(&self, edge: Edge) -> &BoundaryCond {
        match edge {
            Edge::Bottom => &self.bottom,
            Edge::Top => &self.top,
            Edge::Left => &self.left,
            Edge::Right => &self.right,
        }
    }

    /// 按边修改
    pub fn get_mut(&mut self, edge: Edge) -> &mut BoundaryCond {
        match edge {
            Edge::Bottom => &mut self.bottom,
            Edge::Top => &mut self.top,
            Edge::Left => &mut self.left,
            Edge::Right => &mut self.right,
        }
    }

    /// 是否有任一边为压力 Dirichlet
    pub fn has_pressure_reference(&self) -> bool {
        Edge::ALL
            .iter()
            .any(|&e| self.get(e).pressure_type.is_dirichlet())
    }

    /// 遍历 `(Edge, &BoundaryCond)`
    pub fn iter(&self) -> impl Iterator<Item = (Edge, &BoundaryCond)> + '_ {
        Edge::ALL.into_iter().map(move |e| (e, self.get(e)))
    }
}
