// crates/cf_foundation/src/grid.rs

//! 稠密二维网格
//!
//! 提供行优先的 `width * height` 连续存储，所有场量（压力、速度、分类标志）
//! 都以 `Grid<T>` 存放。
//!
//! 访问不做隐式越界检查：`(x, y)` 超出范围时只会触发切片索引 panic，
//! 生产代码在靠近计算域边缘处自行钳位坐标。

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// 网格坐标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// 列
    pub x: usize,
    /// 行
    pub y: usize,
}

impl Point {
    /// 创建坐标
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl From<(usize, usize)> for Point {
    #[inline]
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

/// 稠密二维网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// 创建以默认值填充的网格
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Clone> Grid<T> {
    /// 创建以给定值填充的网格
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// 用单一值填充整个网格
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// 整体赋值
    ///
    /// 尺寸相同时原地复制，不重新分配。
    pub fn copy_from(&mut self, other: &Grid<T>) {
        if self.width == other.width && self.height == other.height {
            self.data.clone_from_slice(&other.data);
        } else {
            self.width = other.width;
            self.height = other.height;
            self.data = other.data.clone();
        }
    }

    /// 读取 `(x, y)` 处的值
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x].clone()
    }

    /// 读取 `p` 处的值
    #[inline]
    pub fn get_at(&self, p: Point) -> T {
        self.get(p.x, p.y)
    }
}

impl<T> Grid<T> {
    /// 从行优先数据创建网格，长度不符时返回 `None`
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() == width * height {
            Some(Self {
                width,
                height,
                data,
            })
        } else {
            None
        }
    }

    /// 宽度（列数）
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// 高度（行数）
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// 单元总数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空网格
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 行优先线性索引
    #[inline]
    pub fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// 线性索引还原为坐标
    #[inline]
    pub fn point_of(&self, index: usize) -> Point {
        Point::new(index % self.width, index / self.width)
    }

    /// 坐标是否在网格内
    #[inline]
    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// 是否位于最外一圈
    #[inline]
    pub fn is_edge(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// 借用 `(x, y)` 处的值
    #[inline]
    pub fn get_ref(&self, x: usize, y: usize) -> &T {
        &self.data[y * self.width + x]
    }

    /// 写入 `(x, y)` 处的值
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let index = y * self.width + x;
        self.data[index] = value;
    }

    /// 写入 `p` 处的值
    #[inline]
    pub fn set_at(&mut self, p: Point, value: T) {
        self.set(p.x, p.y, value);
    }

    /// 行优先底层切片
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// 行优先底层可变切片
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 按行优先顺序遍历值
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 带坐标遍历
    pub fn iter_points(&self) -> impl Iterator<Item = (Point, &T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (Point::new(i % width, i / width), v))
    }

    /// 范围内的 4 邻域（西、东、南、北）
    pub fn neighbors4(&self, x: usize, y: usize) -> impl Iterator<Item = Point> {
        let (w, h) = (self.width, self.height);
        let candidates = [
            (x.checked_sub(1), Some(y)),
            (if x + 1 < w { Some(x + 1) } else { None }, Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), if y + 1 < h { Some(y + 1) } else { None }),
        ];
        candidates.into_iter().filter_map(|c| match c {
            (Some(nx), Some(ny)) => Some(Point::new(nx, ny)),
            _ => None,
        })
    }

    /// 逐元素映射为新网格
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        &self.data[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        &mut self.data[y * self.width + x]
    }
}

impl<T> Index<Point> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, p: Point) -> &T {
        &self.data[p.y * self.width + p.x]
    }
}

impl<T> IndexMut<Point> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, p: Point) -> &mut T {
        &mut self.data[p.y * self.width + p.x]
    }
}
