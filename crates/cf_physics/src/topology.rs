// crates/cf_physics/src/topology.rs

//! 拓扑分类
//!
//! 在求解器构造时由 `SimulationParams` 一次性导出，之后只读：
//!
//! 1. 将障碍物形状栅格化为 `solid`
//! 2. `indep`：严格内部、且自身与 4 邻域均非固体的单元，只有它们参与内部模板
//! 3. 压力为 Dirichlet 的外边单元标记为 `dirichlet`
//! 4. 从每个 `dirichlet` 种子出发，只经 `indep` 单元做 4 连通填充
//! 5. 仍未访问的 `indep` 单元所在区域从未接触压力参考边，
//!    把首个这样的单元钉为 `dirichlet` 后从它继续填充，直到没有遗漏
//!
//! 第 5 步保证每个被障碍物封闭的流体区域恰好获得一个内部参考压力，
//! 全 Neumann 泊松问题的加性常数因此被消除。
//!
//! 填充使用显式工作栈，大网格上不会触及递归深度限制。

use cf_config::{DomainBoundaries, Edge, SimulationParams};
use cf_foundation::{Grid, Point};

/// 单元分类结果
#[derive(Debug, Clone)]
pub struct Topology {
    solid: Grid<bool>,
    indep: Grid<bool>,
    dirichlet: Grid<bool>,
    /// 内部钉住的参考单元，每个封闭区域一个
    anchors: Vec<Point>,
    indep_count: usize,
    region_count: usize,
}

impl Topology {
    /// 由运行参数分类
    pub fn classify(params: &SimulationParams) -> Self {
        let solid = rasterize(params);
        Self::from_solid(solid, &params.boundaries)
    }

    /// 由已栅格化的固体掩码分类
    pub fn from_solid(solid: Grid<bool>, boundaries: &DomainBoundaries) -> Self {
        let (width, height) = solid.dimensions();
        let indep = classify_indep(&solid);
        let indep_count = indep.iter().filter(|&&b| b).count();

        let mut dirichlet = Grid::filled(width, height, false);
        let mut seeds = Vec::new();
        for edge in Edge::ALL {
            if !boundaries.get(edge).pressure_type.is_dirichlet() {
                continue;
            }
            for p in edge_cells(edge, width, height) {
                if !dirichlet[p] {
                    dirichlet[p] = true;
                    seeds.push(dirichlet.index_of(p.x, p.y));
                }
            }
        }

        let mut visited = vec![false; width * height];
        let mut stack = Vec::new();
        let mut region_count = 0;

        for &seed in &seeds {
            if flood_fill(seed, &indep, &mut visited, &mut stack) > 0 {
                region_count += 1;
            }
        }

        let mut anchors = Vec::new();
        for index in 0..width * height {
            if indep.as_slice()[index] && !visited[index] {
                let anchor = indep.point_of(index);
                dirichlet[anchor] = true;
                anchors.push(anchor);
                flood_fill(index, &indep, &mut visited, &mut stack);
                region_count += 1;
            }
        }

        if !anchors.is_empty() {
            tracing::debug!(
                anchors = anchors.len(),
                regions = region_count,
                "pinned pressure reference in regions without a Dirichlet edge"
            );
        }

        Self {
            solid,
            indep,
            dirichlet,
            anchors,
            indep_count,
            region_count,
        }
    }

    /// 宽度
    #[inline]
    pub fn width(&self) -> usize {
        self.solid.width()
    }

    /// 高度
    #[inline]
    pub fn height(&self) -> usize {
        self.solid.height()
    }

    /// 是否为固体
    #[inline]
    pub fn is_solid(&self, x: usize, y: usize) -> bool {
        self.solid[(x, y)]
    }

    /// 是否参与内部模板
    #[inline]
    pub fn is_indep(&self, x: usize, y: usize) -> bool {
        self.indep[(x, y)]
    }

    /// 压力是否被钉住
    #[inline]
    pub fn is_dirichlet(&self, x: usize, y: usize) -> bool {
        self.dirichlet[(x, y)]
    }

    /// 固体掩码
    pub fn solid(&self) -> &Grid<bool> {
        &self.solid
    }

    /// 内部模板掩码
    pub fn indep(&self) -> &Grid<bool> {
        &self.indep
    }

    /// 压力参考掩码
    pub fn dirichlet(&self) -> &Grid<bool> {
        &self.dirichlet
    }

    /// 内部锚点
    pub fn anchors(&self) -> &[Point] {
        &self.anchors
    }

    /// `indep` 单元数
    pub fn indep_count(&self) -> usize {
        self.indep_count
    }

    /// 连通流体区域数
    pub fn region_count(&self) -> usize {
        self.region_count
    }

    /// 固体单元数
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|&&b| b).count()
    }

    /// 每个 `indep` 单元是否都能经 `indep` 邻居到达某个 `dirichlet` 单元
    pub fn is_complete(&self) -> bool {
        let (width, height) = self.solid.dimensions();
        let mut visited = vec![false; width * height];
        let mut stack = Vec::new();
        for index in 0..width * height {
            if self.dirichlet.as_slice()[index] {
                flood_fill(index, &self.indep, &mut visited, &mut stack);
            }
        }
        self.indep
            .iter()
            .zip(&visited)
            .all(|(&indep, &seen)| !indep || seen)
    }
}

/// 外边上的全部单元
fn edge_cells(edge: Edge, width: usize, height: usize) -> Vec<Point> {
    match edge {
        Edge::Bottom => (0..width).map(|x| Point::new(x, 0)).collect(),
        Edge::Top => (0..width).map(|x| Point::new(x, height - 1)).collect(),
        Edge::Left => (0..height).map(|y| Point::new(0, y)).collect(),
        Edge::Right => (0..height).map(|y| Point::new(width - 1, y)).collect(),
    }
}

/// 节点 `(x·dx, y·dy)` 落在任一形状内即为固体
fn rasterize(params: &SimulationParams) -> Grid<bool> {
    let mut solid = Grid::filled(params.wp, params.hp, false);
    if params.obstacles.is_empty() {
        return solid;
    }
    for y in 0..params.hp {
        for x in 0..params.wp {
            let p = params.node_position(x, y);
            if params.obstacles.iter().any(|shape| shape.contains(p)) {
                solid.set(x, y, true);
            }
        }
    }
    solid
}

fn classify_indep(solid: &Grid<bool>) -> Grid<bool> {
    let (width, height) = solid.dimensions();
    let mut indep = Grid::filled(width, height, false);
    if width < 3 || height < 3 {
        return indep;
    }
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let clear = !solid[(x, y)]
                && !solid[(x - 1, y)]
                && !solid[(x + 1, y)]
                && !solid[(x, y - 1)]
                && !solid[(x, y + 1)];
            indep.set(x, y, clear);
        }
    }
    indep
}

/// 从 `start` 出发只经 `indep` 单元填充
///
/// 遇到的非 `indep` 单元立即标记为已访问但不继续扩展。返回新访问的 `indep` 单元数。
fn flood_fill(start: usize, indep: &Grid<bool>, visited: &mut [bool], stack: &mut Vec<usize>) -> usize {
    let mut filled = 0;
    if !visited[start] {
        visited[start] = true;
        if indep.as_slice()[start] {
            filled += 1;
        }
    }
    stack.clear();
    stack.push(start);
    while let Some(index) = stack.pop() {
        let p = indep.point_of(index);
        for n in indep.neighbors4(p.x, p.y) {
            let ni = indep.index_of(n.x, n.y);
            if visited[ni] {
                continue;
            }
            visited[ni] = true;
            if indep.as_slice()[ni] {
                filled += 1;
                stack.push(ni);
            }
        }
    }
    filled
}
