// crates/cf_physics/src/boundary.rs

//! 边界条件施加
//!
//! 每产生一帧后依次施加压力条件和速度条件：
//!
//! - 外边：Dirichlet 写入给定值，Neumann 复制相邻内部值（零梯度）。
//!   施加顺序为下、上、左、右，角点取后施加的左右边结果。
//! - 障碍物邻接流体单元（内部、非 `indep`、非固体、非 `dirichlet`）：
//!   压力取其 `indep` 邻居的算术平均（障碍物表面无通量），无 `indep` 邻居时为 0；
//!   速度置零（无滑移）。
//! - 固体单元的压力和速度保持为 0。

use cf_config::{ConditionType, DomainBoundaries, Edge};
use cf_foundation::{Grid, Point};
use glam::DVec2;

use crate::frame::SimFrame;
use crate::topology::Topology;

/// 障碍物表面单元及其 `indep` 邻居
#[derive(Debug, Clone)]
struct FaceCell {
    cell: Point,
    indep_neighbors: Vec<Point>,
}

/// 边界条件施加器
///
/// 构造时预先收集障碍物表面单元，之后每帧只做写入。
#[derive(Debug, Clone)]
pub struct BoundaryEnforcer {
    boundaries: DomainBoundaries,
    width: usize,
    height: usize,
    faces: Vec<FaceCell>,
    solids: Vec<Point>,
}

impl BoundaryEnforcer {
    /// 由拓扑和外边条件构造
    pub fn new(topology: &Topology, boundaries: DomainBoundaries) -> Self {
        let (width, height) = (topology.width(), topology.height());
        let mut faces = Vec::new();
        let mut solids = Vec::new();
        let indep = topology.indep();
        for y in 0..height {
            for x in 0..width {
                if topology.is_solid(x, y) {
                    solids.push(Point::new(x, y));
                    continue;
                }
                if indep.is_edge(x, y) || topology.is_indep(x, y) || topology.is_dirichlet(x, y) {
                    continue;
                }
                let indep_neighbors = indep
                    .neighbors4(x, y)
                    .filter(|&n| indep[n])
                    .collect();
                faces.push(FaceCell {
                    cell: Point::new(x, y),
                    indep_neighbors,
                });
            }
        }
        Self {
            boundaries,
            width,
            height,
            faces,
            solids,
        }
    }

    /// 外边条件
    pub fn boundaries(&self) -> &DomainBoundaries {
        &self.boundaries
    }

    /// 障碍物表面单元数
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// 依次施加压力和速度条件
    pub fn enforce(&self, frame: &mut SimFrame) {
        self.enforce_pressure(frame);
        self.enforce_velocity(frame);
    }

    /// 施加压力条件
    pub fn enforce_pressure(&self, frame: &mut SimFrame) {
        let pressure = &mut frame.pressure;
        for edge in Edge::ALL {
            let cond = self.boundaries.get(edge);
            match cond.pressure_type {
                ConditionType::Dirichlet => self.write_edge(pressure, edge, cond.pressure_value),
                ConditionType::Neumann => self.copy_edge_from_interior(pressure, edge),
            }
        }

        for face in &self.faces {
            let value = if face.indep_neighbors.is_empty() {
                0.0
            } else {
                let sum: f64 = face.indep_neighbors.iter().map(|&n| pressure[n]).sum();
                sum / face.indep_neighbors.len() as f64
            };
            pressure[face.cell] = value;
        }

        for &p in &self.solids {
            pressure[p] = 0.0;
        }
    }

    /// 施加速度条件
    pub fn enforce_velocity(&self, frame: &mut SimFrame) {
        let velocity = &mut frame.velocity;
        for edge in Edge::ALL {
            let cond = self.boundaries.get(edge);
            match cond.velocity_type {
                ConditionType::Dirichlet => self.write_edge(velocity, edge, cond.velocity_value),
                ConditionType::Neumann => self.copy_edge_from_interior(velocity, edge),
            }
        }

        for face in &self.faces {
            velocity[face.cell] = DVec2::ZERO;
        }
        for &p in &self.solids {
            velocity[p] = DVec2::ZERO;
        }
    }

    fn write_edge<T: Copy>(&self, grid: &mut Grid<T>, edge: Edge, value: T) {
        let (w, h) = (self.width, self.height);
        match edge {
            Edge::Bottom => (0..w).for_each(|x| grid.set(x, 0, value)),
            Edge::Top => (0..w).for_each(|x| grid.set(x, h - 1, value)),
            Edge::Left => (0..h).for_each(|y| grid.set(0, y, value)),
            Edge::Right => (0..h).for_each(|y| grid.set(w - 1, y, value)),
        }
    }

    fn copy_edge_from_interior<T: Copy>(&self, grid: &mut Grid<T>, edge: Edge) {
        let (w, h) = (self.width, self.height);
        match edge {
            Edge::Bottom => {
                for x in 0..w {
                    let v = grid[(x, 1)];
                    grid.set(x, 0, v);
                }
            }
            Edge::Top => {
                for x in 0..w {
                    let v = grid[(x, h - 2)];
                    grid.set(x, h - 1, v);
                }
            }
            Edge::Left => {
                for y in 0..h {
                    let v = grid[(1, y)];
                    grid.set(0, y, v);
                }
            }
            Edge::Right => {
                for y in 0..h {
                    let v = grid[(w - 2, y)];
                    grid.set(w - 1, y, v);
                }
            }
        }
    }
}
