// crates/cf_physics/src/engine/signal.rs

//! 协作式暂停信号
//!
//! 引擎只在松弛检查点读取信号，从不阻塞。信号为电平触发：
//! 置位期间每个检查点都会让出。每个检查点还会先经
//! [`PauseSignal::checkpoint`] 报告已完成的扫描次数。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 暂停信号
pub trait PauseSignal {
    /// 是否请求暂停
    fn pause_requested(&self) -> bool;

    /// 到达检查点，`sweeps` 为本时间步已完成的扫描次数
    #[inline]
    fn checkpoint(&self, _sweeps: u64) {}
}

/// 永不暂停
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverPause;

impl PauseSignal for NeverPause {
    #[inline]
    fn pause_requested(&self) -> bool {
        false
    }
}

impl PauseSignal for AtomicBool {
    #[inline]
    fn pause_requested(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: PauseSignal + ?Sized> PauseSignal for Arc<T> {
    #[inline]
    fn pause_requested(&self) -> bool {
        (**self).pause_requested()
    }

    #[inline]
    fn checkpoint(&self, sweeps: u64) {
        (**self).checkpoint(sweeps)
    }
}

impl<T: PauseSignal + ?Sized> PauseSignal for &T {
    #[inline]
    fn pause_requested(&self) -> bool {
        (**self).pause_requested()
    }

    #[inline]
    fn checkpoint(&self, sweeps: u64) {
        (**self).checkpoint(sweeps)
    }
}
