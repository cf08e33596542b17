// crates/cf_physics/src/engine/scheme.rs

//! 离散格式
//!
//! [`ProjectionScheme`] 决定源项与速度推进的离散方式，以泛型参数注入
//! [`Simulator`](super::Simulator)，静态分发。默认格式为 [`CentralDifference`]。

use cf_config::SimulationParams;
use cf_foundation::Grid;
use glam::DVec2;

/// 一个时间步内不变的离散常数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    /// x 向节点间距
    pub dx: f64,
    /// y 向节点间距
    pub dy: f64,
    /// 时间步长
    pub dt: f64,
    /// 密度
    pub rho: f64,
    /// 扩散系数
    pub nu: f64,
}

impl Stencil {
    /// 由运行参数导出
    pub fn from_params(params: &SimulationParams) -> Self {
        Self {
            dx: params.dx(),
            dy: params.dy(),
            dt: params.dt,
            rho: params.rho,
            nu: params.diffusion_coefficient(),
        }
    }

    /// 东西向权重 `1/dx²`
    #[inline]
    pub fn weight_x(&self) -> f64 {
        1.0 / (self.dx * self.dx)
    }

    /// 南北向权重 `1/dy²`
    #[inline]
    pub fn weight_y(&self) -> f64 {
        1.0 / (self.dy * self.dy)
    }
}

/// 投影格式策略
///
/// 两个方法都只在 `indep` 单元上调用，4 邻域必然在网格内。
pub trait ProjectionScheme: Send + Sync {
    /// 格式名称
    fn name(&self) -> &'static str;

    /// 压力泊松方程右端项
    fn source_term(&self, velocity: &Grid<DVec2>, x: usize, y: usize, stencil: &Stencil) -> f64;

    /// 由旧速度与新压力推进 `(x, y)` 处的速度
    fn advance_velocity(
        &self,
        velocity: &Grid<DVec2>,
        pressure: &Grid<f64>,
        x: usize,
        y: usize,
        stencil: &Stencil,
    ) -> DVec2;
}

/// 二阶中心差分 + 显式 Euler
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralDifference;

impl ProjectionScheme for CentralDifference {
    fn name(&self) -> &'static str {
        "central-difference"
    }

    /// `S = rho·(ux² + 2·uy·vx + vy² − (ux + vy)/dt)`
    fn source_term(&self, velocity: &Grid<DVec2>, x: usize, y: usize, st: &Stencil) -> f64 {
        let east = velocity[(x + 1, y)];
        let west = velocity[(x - 1, y)];
        let north = velocity[(x, y + 1)];
        let south = velocity[(x, y - 1)];

        let d_dx = (east - west) / (2.0 * st.dx);
        let d_dy = (north - south) / (2.0 * st.dy);
        let (ux, vx) = (d_dx.x, d_dx.y);
        let (uy, vy) = (d_dy.x, d_dy.y);

        st.rho * (ux * ux + 2.0 * uy * vx + vy * vy - (ux + vy) / st.dt)
    }

    fn advance_velocity(
        &self,
        velocity: &Grid<DVec2>,
        pressure: &Grid<f64>,
        x: usize,
        y: usize,
        st: &Stencil,
    ) -> DVec2 {
        let center = velocity[(x, y)];
        let east = velocity[(x + 1, y)];
        let west = velocity[(x - 1, y)];
        let north = velocity[(x, y + 1)];
        let south = velocity[(x, y - 1)];

        let d_dx = (east - west) / (2.0 * st.dx);
        let d_dy = (north - south) / (2.0 * st.dy);
        let advection = center.x * d_dx + center.y * d_dy;

        let grad_p = DVec2::new(
            (pressure[(x + 1, y)] - pressure[(x - 1, y)]) / (2.0 * st.dx),
            (pressure[(x, y + 1)] - pressure[(x, y - 1)]) / (2.0 * st.dy),
        );

        let laplacian = (east - 2.0 * center + west) * st.weight_x()
            + (north - 2.0 * center + south) * st.weight_y();

        center - st.dt * advection - (st.dt / st.rho) * grad_p + st.nu * st.dt * laplacian
    }
}
