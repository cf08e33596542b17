// crates/cf_config/src/obstacle.rs

//! 障碍物形状
//!
//! 形状以物理坐标描述，由拓扑分类器栅格化为固体单元。

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 障碍物形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ObstacleShape {
    /// 圆
    Circle {
        /// 圆心 [m]
        center: DVec2,
        /// 半径 [m]
        radius: f64,
    },
    /// 轴对齐矩形
    Rectangle {
        /// 左下角 [m]
        min: DVec2,
        /// 右上角 [m]
        max: DVec2,
    },
    /// 简单多边形（奇偶规则）
    Polygon {
        /// 顶点，首尾自动闭合
        vertices: Vec<DVec2>,
    },
}

impl ObstacleShape {
    /// 创建圆
    pub fn circle(center: DVec2, radius: f64) -> Self {
        Self::Circle { center, radius }
    }

    /// 创建矩形，角点顺序无关
    pub fn rectangle(a: DVec2, b: DVec2) -> Self {
        Self::Rectangle {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// 创建多边形
    pub fn polygon(vertices: Vec<DVec2>) -> Self {
        Self::Polygon { vertices }
    }

    /// 点是否在形状内（含边界）
    pub fn contains(&self, p: DVec2) -> bool {
        match self {
            Self::Circle { center, radius } => p.distance_squared(*center) <= radius * radius,
            Self::Rectangle { min, max } => {
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            }
            Self::Polygon { vertices } => polygon_contains(vertices, p),
        }
    }

    /// 外包矩形 `(min, max)`
    pub fn bounds(&self) -> (DVec2, DVec2) {
        match self {
            Self::Circle { center, radius } => {
                let r = DVec2::splat(*radius);
                (*center - r, *center + r)
            }
            Self::Rectangle { min, max } => (*min, *max),
            Self::Polygon { vertices } => vertices.iter().fold(
                (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
                |(lo, hi), v| (lo.min(*v), hi.max(*v)),
            ),
        }
    }

    /// 形状名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Rectangle { .. } => "rectangle",
            Self::Polygon { .. } => "polygon",
        }
    }
}

/// 射线法点包含判定
fn polygon_contains(vertices: &[DVec2], p: DVec2) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_contains() {
        let c = ObstacleShape::circle(DVec2::new(0.5, 0.5), 0.1);
        assert!(c.contains(DVec2::new(0.5, 0.55)));
        assert!(c.contains(DVec2::new(0.6, 0.5)));
        assert!(!c.contains(DVec2::new(0.7, 0.5)));
    }

    #[test]
    fn test_rectangle_normalizes_corners() {
        let r = ObstacleShape::rectangle(DVec2::new(1.0, 1.0), DVec2::new(0.0, 0.5));
        assert!(r.contains(DVec2::new(0.5, 0.75)));
        assert!(!r.contains(DVec2::new(0.5, 0.25)));
        assert_eq!(r.bounds(), (DVec2::new(0.0, 0.5), DVec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_polygon_triangle() {
        let tri = ObstacleShape::polygon(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ]);
        assert!(tri.contains(DVec2::new(0.2, 0.2)));
        assert!(!tri.contains(DVec2::new(0.8, 0.8)));
    }

    #[test]
    fn test_degenerate_polygon_contains_nothing() {
        let line = ObstacleShape::polygon(vec![DVec2::ZERO, DVec2::ONE]);
        assert!(!line.contains(DVec2::splat(0.5)));
    }

    #[test]
    fn test_tagged_serde() {
        let c = ObstacleShape::circle(DVec2::new(0.25, 0.5), 0.1);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"shape\":\"circle\""));
        let back: ObstacleShape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
