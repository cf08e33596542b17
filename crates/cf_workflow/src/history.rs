// crates/cf_workflow/src/history.rs

//! 帧历史
//!
//! 固定容量的归档序列。第 `k` 个计算帧在 `k % stride == 0` 时归档；
//! 已满时再归档会先保留偶数位条目（0, 2, 4, ...）并把 `stride` 加倍，
//! 然后追加新帧。容量为偶数，抽稀前后相邻条目的时间间隔保持一致。

use std::sync::Arc;

use cf_foundation::{ensure, CfError, CfResult};
use cf_physics::SimFrame;

/// 一个已归档的帧
#[derive(Debug, Clone)]
pub struct ArchivedFrame {
    /// 计算帧序号 `k`
    pub index: u64,
    /// 模拟时间
    pub time: f64,
    /// 不可变快照
    pub frame: Arc<SimFrame>,
}

/// 抽稀帧历史
#[derive(Debug, Clone)]
pub struct FrameHistory {
    entries: Vec<ArchivedFrame>,
    capacity: usize,
    stride: u64,
}

impl FrameHistory {
    /// 创建空历史，容量必须为不小于 2 的偶数
    pub fn new(capacity: usize) -> CfResult<Self> {
        ensure!(
            capacity >= 2 && capacity % 2 == 0,
            CfError::invalid_input(format!("历史容量必须为不小于 2 的偶数: {}", capacity))
        );
        Ok(Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            stride: 1,
        })
    }

    /// 第 `index` 个计算帧是否需要归档
    #[inline]
    pub fn is_due(&self, index: u64) -> bool {
        index % self.stride == 0
    }

    /// 归档一帧
    ///
    /// 发生抽稀时返回新的 `stride`。调用方保证 `entry.index` 递增且 [`is_due`](Self::is_due)。
    pub fn push(&mut self, entry: ArchivedFrame) -> Option<u64> {
        debug_assert!(self.is_due(entry.index));
        let decimated = if self.entries.len() == self.capacity {
            self.decimate();
            Some(self.stride)
        } else {
            None
        };
        self.entries.push(entry);
        decimated
    }

    fn decimate(&mut self) {
        let mut position = 0;
        self.entries.retain(|_| {
            let keep = position % 2 == 0;
            position += 1;
            keep
        });
        self.stride *= 2;
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前归档间隔（以计算帧计）
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// 第 `i` 个条目
    pub fn get(&self, i: usize) -> Option<&ArchivedFrame> {
        self.entries.get(i)
    }

    /// 最新条目
    pub fn latest(&self) -> Option<&ArchivedFrame> {
        self.entries.last()
    }

    /// 遍历条目
    pub fn iter(&self) -> std::slice::Iter<'_, ArchivedFrame> {
        self.entries.iter()
    }

    /// 各条目的模拟时间
    pub fn times(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.time).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u64, frame: &Arc<SimFrame>) -> ArchivedFrame {
        ArchivedFrame {
            index,
            time: index as f64 * 0.5,
            frame: Arc::clone(frame),
        }
    }

    /// 依次计算帧 0..=last，按历史的意愿归档
    fn run(history: &mut FrameHistory, last: u64) -> Vec<u64> {
        let frame = Arc::new(SimFrame::zeros(2, 2));
        let mut strides = Vec::new();
        for k in 0..=last {
            if history.is_due(k) {
                if let Some(stride) = history.push(entry(k, &frame)) {
                    strides.push(stride);
                }
            }
        }
        strides
    }

    #[test]
    fn test_capacity_must_be_even() {
        assert!(FrameHistory::new(0).is_err());
        assert!(FrameHistory::new(3).is_err());
        assert!(FrameHistory::new(2).is_ok());
    }

    #[test]
    fn test_fill_without_decimation() {
        let mut history = FrameHistory::new(8).unwrap();
        assert!(run(&mut history, 7).is_empty());
        assert_eq!(history.len(), 8);
        assert_eq!(history.stride(), 1);
    }

    #[test]
    fn test_one_past_capacity_halves_and_doubles_stride() {
        let capacity = 8;
        let mut history = FrameHistory::new(capacity).unwrap();
        let strides = run(&mut history, capacity as u64);
        assert_eq!(strides, vec![2]);
        assert_eq!(history.len(), capacity / 2 + 1);
        assert_eq!(history.stride(), 2);

        let indices: Vec<u64> = history.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 2, 4, 6, 8]);
        let times = history.times();
        for pair in times.windows(2) {
            assert!((pair[1] - pair[0] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_repeated_decimation_stays_uniform() {
        let mut history = FrameHistory::new(4).unwrap();
        let strides = run(&mut history, 40);
        assert_eq!(strides, vec![2, 4, 8, 16]);
        let indices: Vec<u64> = history.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 16, 32]);
        assert_eq!(history.latest().map(|e| e.index), Some(32));
    }
}
