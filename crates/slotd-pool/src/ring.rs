use std::{fmt, mem};

use tracing::{debug, warn};

use crate::{
    allocator::{HeapSlotAllocator, SlotAllocator},
    error::PoolError,
    stats::PoolStats,
};

/// `RingBufferPool` 是固定容量的环形缓冲池：启动时一次性申请全部槽位，
/// 之后按轮转顺序清零并借出，不再向堆申请内存。
///
/// # 模块角色（Why）
/// - 接入循环每接受一个连接就租借一个槽位，内存上限固定为 `capacity × slot_size`；
/// - 池对象由接入循环显式持有，而非全局单例，测试可以构造相互隔离的实例。
///
/// # 核心机制（How）
/// - `slots` 为长度恒等于 `capacity` 的 `Vec<Box<[u8]>>`，所有访问都经过边界检查；
/// - `acquire` 先推进游标 `cursor = (cursor + 1) % capacity`，再清零新槽位并返回其可变借用；
/// - 槽位的申请与释放都委托给 [`SlotAllocator`]，回滚、`destroy` 与 `Drop` 共用同一条释放路径。
///
/// # 契约说明（What）
/// - **不变量**：`cursor < capacity`；每个槽位长度恒为 `slot_size`，从不调整大小；
/// - **借用期限**：`acquire` 需要 `&mut self`，借出的切片在下一次 `acquire` 之前必然失效，
///   “槽位仅在池回绕前有效”的约束因此由编译器保证；
/// - **线程模型**：类型本身不提供同步，跨线程共享请使用 [`SharedRingPool`](crate::SharedRingPool)；
/// - **编号**：构造时清零槽位 0，首次 `acquire` 返回槽位 1，第 `capacity` 次返回槽位 0。
///
/// # 设计权衡（Trade-offs）
/// - 每次租借都会整块清零，`slot_size` 较大时这是热路径上的主要开销；
/// - 轮转复用不感知下游是否仍在使用槽位，容量应按真实的处理并发度配置，而不是隐式等于 backlog。
pub struct RingBufferPool<A: SlotAllocator = HeapSlotAllocator> {
    slots: Vec<Box<[u8]>>,
    slot_size: usize,
    cursor: usize,
    acquisitions: u64,
    wraps: u64,
    allocator: A,
}

impl RingBufferPool<HeapSlotAllocator> {
    /// 使用堆分配器创建缓冲池。
    pub fn new(capacity: usize, slot_size: usize) -> Result<Self, PoolError> {
        Self::with_allocator(capacity, slot_size, HeapSlotAllocator)
    }
}

impl<A: SlotAllocator> RingBufferPool<A> {
    /// 使用指定分配器创建缓冲池。
    ///
    /// # 参数与契约
    /// - `capacity`、`slot_size`：必须均不为 0，否则返回 [`PoolError::InvalidArguments`]；
    /// - **失败回滚**：第 k 个槽位申请失败时，之前成功的 k-1 个槽位逐一交还 `allocator`，
    ///   槽位表随之释放，再返回 [`PoolError::SlotAllocation`]；
    /// - **后置条件**：成功返回时游标为 0，槽位 0 已清零。
    pub fn with_allocator(
        capacity: usize,
        slot_size: usize,
        mut allocator: A,
    ) -> Result<Self, PoolError> {
        if capacity == 0 || slot_size == 0 {
            return Err(PoolError::InvalidArguments {
                capacity,
                slot_size,
            });
        }

        let mut slots: Vec<Box<[u8]>> = Vec::new();
        if slots.try_reserve_exact(capacity).is_err() {
            warn!(capacity, "slot table allocation failed");
            return Err(PoolError::ContainerAllocation { capacity });
        }

        for index in 0..capacity {
            let slot = match allocator.allocate(index, slot_size) {
                Some(slot) if slot.len() == slot_size => slot,
                misfit => {
                    if let Some(slot) = misfit {
                        allocator.release(slot);
                    }
                    let released = slots.len();
                    for slot in slots.drain(..) {
                        allocator.release(slot);
                    }
                    warn!(index, slot_size, released, "slot allocation failed, pool rolled back");
                    return Err(PoolError::SlotAllocation { index, slot_size });
                }
            };
            slots.push(slot);
        }

        slots[0].fill(0);
        debug!(capacity, slot_size, "ring buffer pool allocated");
        Ok(Self {
            slots,
            slot_size,
            cursor: 0,
            acquisitions: 0,
            wraps: 0,
            allocator,
        })
    }

    /// 推进游标，清零并借出下一个槽位。
    ///
    /// 不会失败也不会阻塞。
    pub fn acquire(&mut self) -> &mut [u8] {
        self.acquire_indexed().1
    }

    /// 与 [`acquire`](Self::acquire) 相同，同时返回槽位序号。
    pub fn acquire_indexed(&mut self) -> (usize, &mut [u8]) {
        self.cursor = (self.cursor + 1) % self.slots.len();
        if self.cursor == 0 {
            self.wraps += 1;
        }
        self.acquisitions += 1;

        let index = self.cursor;
        let slot = &mut self.slots[index][..];
        slot.fill(0);
        (index, slot)
    }

    /// 槽位数量。
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// 最近一次借出的槽位序号。
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 只读查看指定槽位，越界返回 `None`。
    pub fn slot(&self, index: usize) -> Option<&[u8]> {
        self.slots.get(index).map(|slot| &slot[..])
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.slots.len(),
            slot_size: self.slot_size,
            allocated_bytes: self.slots.len() * self.slot_size,
            acquisitions: self.acquisitions,
            wraps: self.wraps,
            cursor: self.cursor,
        }
    }

    /// 销毁池：先归还全部槽位，再释放槽位表，返回归还的槽位数。
    ///
    /// 消费 `self`，因此销毁后继续租借会在编译期被拒绝。
    pub fn destroy(mut self) -> usize {
        self.release_slots()
    }

    /// 取走全部槽位，交由共享池重新包装；之后 `Drop` 不再归还任何槽位。
    pub(crate) fn into_slots(mut self) -> Vec<Box<[u8]>> {
        mem::take(&mut self.slots)
    }

    fn release_slots(&mut self) -> usize {
        let released = self.slots.len();
        for slot in self.slots.drain(..) {
            self.allocator.release(slot);
        }
        self.slots = Vec::new();
        released
    }
}

impl<A: SlotAllocator> Drop for RingBufferPool<A> {
    fn drop(&mut self) {
        let released = self.release_slots();
        if released > 0 {
            debug!(released, "ring buffer pool released");
        }
    }
}

impl<A: SlotAllocator> fmt::Debug for RingBufferPool<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBufferPool")
            .field("capacity", &self.slots.len())
            .field("slot_size", &self.slot_size)
            .field("cursor", &self.cursor)
            .field("acquisitions", &self.acquisitions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_arguments_are_rejected() {
        assert_eq!(
            RingBufferPool::new(0, 8).unwrap_err(),
            PoolError::InvalidArguments {
                capacity: 0,
                slot_size: 8
            }
        );
        assert!(matches!(
            RingBufferPool::new(4, 0),
            Err(PoolError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn first_acquire_skips_slot_zero() {
        let mut pool = RingBufferPool::new(3, 8).expect("创建缓冲池失败");
        assert_eq!(pool.cursor(), 0);
        pool.acquire();
        assert_eq!(pool.cursor(), 1);
        pool.acquire();
        pool.acquire();
        assert_eq!(pool.cursor(), 0);
        assert_eq!(pool.stats().wraps, 1);
    }

    #[test]
    fn acquire_clears_previous_contents() {
        let mut pool = RingBufferPool::new(1, 4).expect("创建缓冲池失败");
        pool.acquire().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(pool.slot(0), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(pool.acquire(), &[0u8; 4][..]);
    }

    #[test]
    fn destroy_reports_released_slots() {
        let pool = RingBufferPool::new(5, 16).expect("创建缓冲池失败");
        assert_eq!(pool.destroy(), 5);
    }
}
