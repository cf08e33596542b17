// crates/cf_physics/src/engine/relaxation.rs

//! 压力泊松方程的 Jacobi 松弛
//!
//! 对每个 `indep` 且非 `dirichlet` 的单元：
//!
//! ```text
//! p = (Σ w_n·p_n + S) / Σ w_n
//! ```
//!
//! 东西邻居权重 `1/dx²`，南北邻居权重 `1/dy²`。只有 `indep` 或 `dirichlet`
//! 的邻居参与求和与系数。`dx = dy` 时退化为 `(Σ p_n + dx²·S) / n`。
//!
//! 模板行在构造时一次性生成，迭代时只做连续内存上的加权求和。

use cf_foundation::Grid;

use super::scheme::Stencil;
use crate::topology::Topology;

/// 一个活动单元的模板
#[derive(Debug, Clone, Copy)]
struct StencilRow {
    cell: usize,
    neighbors: [(usize, f64); 4],
    count: usize,
    inv_weight: f64,
}

/// Jacobi 松弛器
#[derive(Debug, Clone)]
pub struct JacobiRelaxation {
    rows: Vec<StencilRow>,
}

impl JacobiRelaxation {
    /// 由拓扑和离散常数生成模板行
    pub fn new(topology: &Topology, stencil: &Stencil) -> Self {
        let indep = topology.indep();
        let dirichlet = topology.dirichlet();
        let (wx, wy) = (stencil.weight_x(), stencil.weight_y());

        let mut rows = Vec::with_capacity(topology.indep_count());
        for y in 0..indep.height() {
            for x in 0..indep.width() {
                if !indep[(x, y)] || dirichlet[(x, y)] {
                    continue;
                }
                let mut row = StencilRow {
                    cell: indep.index_of(x, y),
                    neighbors: [(0, 0.0); 4],
                    count: 0,
                    inv_weight: 0.0,
                };
                let mut total = 0.0;
                // indep 单元严格位于内部，4 邻域都存在
                for (nx, ny, w) in [(x - 1, y, wx), (x + 1, y, wx), (x, y - 1, wy), (x, y + 1, wy)] {
                    if indep[(nx, ny)] || dirichlet[(nx, ny)] {
                        row.neighbors[row.count] = (indep.index_of(nx, ny), w);
                        row.count += 1;
                        total += w;
                    }
                }
                if row.count == 0 {
                    continue;
                }
                row.inv_weight = 1.0 / total;
                rows.push(row);
            }
        }
        Self { rows }
    }

    /// 活动单元数
    pub fn active_count(&self) -> usize {
        self.rows.len()
    }

    /// 活动单元的行优先下标，顺序与 [`sweep`](Self::sweep) 的源项一致
    pub fn cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|row| row.cell)
    }

    /// 一次 Jacobi 扫描
    ///
    /// 从 `current` 读、写入 `next` 的活动单元，其余单元不动。
    /// `source[i]` 对应第 i 个活动单元。返回活动单元上变化量的 L1 范数。
    pub fn sweep(&self, current: &Grid<f64>, source: &[f64], next: &mut Grid<f64>) -> f64 {
        let old = current.as_slice();
        let out = next.as_mut_slice();
        let mut delta = 0.0;
        for (row, &s) in self.rows.iter().zip(source) {
            let sum: f64 = row.neighbors[..row.count]
                .iter()
                .map(|&(n, w)| w * old[n])
                .sum();
            let value = (sum + s) * row.inv_weight;
            delta += (value - old[row.cell]).abs();
            out[row.cell] = value;
        }
        delta
    }
}
