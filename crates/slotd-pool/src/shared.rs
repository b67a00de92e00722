use std::{
    fmt,
    ops::{Deref, DerefMut},
};

#[cfg(not(loom))]
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
#[cfg(loom)]
use loom::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::{error::PoolError, ring::RingBufferPool, stats::PoolStats};

#[cfg(not(loom))]
type SlotLock = spin::Mutex<Box<[u8]>>;
#[cfg(not(loom))]
type SlotLockGuard<'a> = spin::MutexGuard<'a, Box<[u8]>>;
#[cfg(loom)]
type SlotLock = loom::sync::Mutex<Box<[u8]>>;
#[cfg(loom)]
type SlotLockGuard<'a> = loom::sync::MutexGuard<'a, Box<[u8]>>;

/// `SharedRingPool` 是 [`RingBufferPool`] 的并发版本，供“每个连接独立处理”的扩展形态使用。
///
/// # 模块角色（Why）
/// - 单线程环形池依赖 `&mut self` 保证同一时刻只有一个活跃槽位；一旦多个处理任务并行，
///   游标竞争会让两个调用方拿到同一槽位，慢任务的数据会被快任务覆盖；
/// - 本类型把游标推进改为原子操作，并为每个槽位配一把锁，把“覆盖”变成“等待”。
///
/// # 核心机制（How）
/// - `cursor` 通过 `fetch_update` 原子地执行 `(cursor + 1) % capacity`，编号与单线程池一致；
/// - 借出的 [`SlotGuard`] 持有该槽位的锁，清零发生在加锁之后、返回之前；
/// - [`acquire`](Self::acquire)：回绕到仍被持有的槽位时，后来者自旋等待前一个 `SlotGuard` 释放；
/// - [`try_acquire`](Self::try_acquire)：目标槽位被占用时立即返回 `None`，游标保持不动。
///
/// # 契约说明（What）
/// - **线程安全**：`Send + Sync`，可放入 `Arc` 在 OS 线程间共享；
/// - **阻塞语义**：`acquire` 只能在持有者能够独立推进的 OS 线程上调用。协作式调度的异步任务
///   （例如 Tokio 单线程运行时）必须使用 `try_acquire` 并在返回 `None` 时让出执行权，
///   否则持有者永远得不到调度，`acquire` 会永久自旋；同一线程在持有守卫时再次 `acquire` 同理；
/// - **容量**：应不小于同时存活的 `SlotGuard` 数量，否则后来者会被阻塞或拿到 `None`；
/// - **后置条件**：`acquire` 返回的槽位全零，且在守卫释放前不会被任何其他调用方观察到。
///
/// # 设计权衡（Trade-offs）
/// - 使用 `spin::Mutex`，持锁时间等于处理一个请求的时间；容量不足时等待方会空转 CPU，
///   只适合处理线程数有限、单次处理耗时短的场景。
pub struct SharedRingPool {
    slots: Vec<SlotLock>,
    slot_size: usize,
    cursor: AtomicUsize,
    acquisitions: AtomicU64,
    wraps: AtomicU64,
}

impl SharedRingPool {
    /// 创建共享缓冲池，参数校验与失败回滚同 [`RingBufferPool::new`]。
    pub fn new(capacity: usize, slot_size: usize) -> Result<Self, PoolError> {
        let slots = RingBufferPool::new(capacity, slot_size)?.into_slots();
        Ok(Self {
            slots: slots.into_iter().map(SlotLock::new).collect(),
            slot_size,
            cursor: AtomicUsize::new(0),
            acquisitions: AtomicU64::new(0),
            wraps: AtomicU64::new(0),
        })
    }

    /// 原子推进游标并借出下一个槽位；目标槽位仍被持有时自旋等待。
    ///
    /// 只能在 OS 线程上调用，异步任务请使用 [`try_acquire`](Self::try_acquire)。
    pub fn acquire(&self) -> SlotGuard<'_> {
        let capacity = self.slots.len();
        let previous = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some((current + 1) % capacity)
            })
            .unwrap_or_else(|current| current);
        let index = (previous + 1) % capacity;
        if index == 0 {
            self.wraps.fetch_add(1, Ordering::Relaxed);
        }
        self.acquisitions.fetch_add(1, Ordering::Relaxed);

        let mut guard = lock_slot(&self.slots[index]);
        guard.fill(0);
        SlotGuard { index, guard }
    }

    /// 非阻塞租借：下一个槽位仍被持有时返回 `None`，且不推进游标、不计入统计。
    ///
    /// 先锁定候选槽位，再用 CAS 提交游标；提交失败说明其他调用方抢先推进，释放锁后重试。
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        let capacity = self.slots.len();
        let mut current = self.cursor.load(Ordering::Acquire);
        loop {
            let index = (current + 1) % capacity;
            let mut guard = try_lock_slot(&self.slots[index])?;
            match self
                .cursor
                .compare_exchange(current, index, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    if index == 0 {
                        self.wraps.fetch_add(1, Ordering::Relaxed);
                    }
                    self.acquisitions.fetch_add(1, Ordering::Relaxed);
                    guard.fill(0);
                    return Some(SlotGuard { index, guard });
                }
                Err(observed) => {
                    drop(guard);
                    current = observed;
                }
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.slots.len(),
            slot_size: self.slot_size,
            allocated_bytes: self.slots.len() * self.slot_size,
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            wraps: self.wraps.load(Ordering::Relaxed),
            cursor: self.cursor.load(Ordering::Acquire),
        }
    }
}

impl fmt::Debug for SharedRingPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRingPool")
            .field("capacity", &self.slots.len())
            .field("slot_size", &self.slot_size)
            .finish_non_exhaustive()
    }
}

/// 共享池借出的槽位，释放时解锁。
pub struct SlotGuard<'a> {
    index: usize,
    guard: SlotLockGuard<'a>,
}

impl SlotGuard<'_> {
    /// 槽位序号。
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Deref for SlotGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard[..]
    }
}

impl DerefMut for SlotGuard<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.guard[..]
    }
}

#[cfg(not(loom))]
fn lock_slot(lock: &SlotLock) -> SlotLockGuard<'_> {
    lock.lock()
}

#[cfg(loom)]
fn lock_slot(lock: &SlotLock) -> SlotLockGuard<'_> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(not(loom))]
fn try_lock_slot(lock: &SlotLock) -> Option<SlotLockGuard<'_>> {
    lock.try_lock()
}

#[cfg(loom)]
fn try_lock_slot(lock: &SlotLock) -> Option<SlotLockGuard<'_>> {
    lock.try_lock().ok()
}
