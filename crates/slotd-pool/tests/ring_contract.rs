//! `ring_contract` 集成测试：从 crate 公开 API 视角验证 `RingBufferPool` 的契约。
//!
//! # 测试目标（Why）
//! - 轮转顺序、借出即清零、失败回滚这三条约束直接决定接入循环的正确性，必须在外部视角下固定；
//! - 通过可注入故障的分配器观测“申请 / 归还”的对称性，避免回滚路径悄悄泄漏槽位。
//!
//! # 结构安排（How）
//! - `CountingAllocator`：包装堆分配器，统计申请与归还次数，并可在指定序号上返回失败；
//! - 其余用例各覆盖一个契约点或具名场景。

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use slotd_pool::{HeapSlotAllocator, MAX_REQUEST_SIZE, PoolError, RingBufferPool, SlotAllocator};

/// 帮助类型：统计槽位申请与归还次数，可在第 `fail_at` 个（从 0 计）槽位上注入失败。
#[derive(Clone, Default)]
struct CountingAllocator {
    fail_at: Option<usize>,
    allocated: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl CountingAllocator {
    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl SlotAllocator for CountingAllocator {
    fn allocate(&mut self, index: usize, slot_size: usize) -> Option<Box<[u8]>> {
        if self.fail_at == Some(index) {
            return None;
        }
        let slot = HeapSlotAllocator.allocate(index, slot_size)?;
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Some(slot)
    }

    fn release(&mut self, slot: Box<[u8]>) {
        self.released.fetch_add(1, Ordering::SeqCst);
        drop(slot);
    }
}

/// 构造后每个槽位长度恰为 `slot_size` 且全零。
#[test]
fn construction_yields_zeroed_slots_of_exact_size() {
    let pool = RingBufferPool::new(4, 24).expect("创建缓冲池失败");
    for index in 0..4 {
        let slot = pool.slot(index).expect("槽位必须存在");
        assert_eq!(slot.len(), 24);
        assert!(slot.iter().all(|byte| *byte == 0));
    }
    assert!(pool.slot(4).is_none(), "越界访问应返回 None");
}

/// 场景 A：`create(3, 8)` 后连续租借四次，第四次与第一次是同一槽位（序号 1）。
///
/// # 步骤说明（How）
/// 1. 记录每次借出切片的起始地址与游标；
/// 2. 断言第一次与第四次地址一致、游标均为 1，中间两次为槽位 2 与槽位 0。
#[test]
fn fourth_acquire_reissues_first_slot() {
    let mut pool = RingBufferPool::new(3, 8).expect("创建缓冲池失败");
    let mut visits = Vec::new();
    for _ in 0..4 {
        let address = pool.acquire().as_ptr() as usize;
        visits.push((pool.cursor(), address));
    }

    let cursors: Vec<usize> = visits.iter().map(|(cursor, _)| *cursor).collect();
    assert_eq!(cursors, vec![1, 2, 0, 1]);
    assert_eq!(visits[0].1, visits[3].1, "第四次应复用第一次的槽位");
    assert_ne!(visits[0].1, visits[1].1);
    assert_ne!(visits[1].1, visits[2].1);
}

/// 写入的数据在槽位被再次借出时必须已被清零。
#[test]
fn reissued_slot_is_zeroed_regardless_of_previous_writes() {
    let mut pool = RingBufferPool::new(2, 16).expect("创建缓冲池失败");
    pool.acquire().fill(0xAB);
    pool.acquire().fill(0xCD);
    let reissued = pool.acquire();
    assert!(reissued.iter().all(|byte| *byte == 0));
}

/// 第 k 个槽位申请失败时，只归还此前成功的 k-1 个，并报告失败序号。
#[test]
fn failure_on_kth_slot_releases_exactly_previous_slots() {
    let allocator = CountingAllocator::failing_at(3);
    let counters = allocator.clone();

    let error = RingBufferPool::with_allocator(6, 32, allocator).unwrap_err();

    assert_eq!(
        error,
        PoolError::SlotAllocation {
            index: 3,
            slot_size: 32
        }
    );
    assert_eq!(counters.allocated(), 3);
    assert_eq!(counters.released(), 3, "回滚必须恰好归还已成功的槽位");
}

/// 第一个槽位即失败时，不应归还任何槽位。
#[test]
fn failure_on_first_slot_releases_nothing() {
    let allocator = CountingAllocator::failing_at(0);
    let counters = allocator.clone();
    assert!(matches!(
        RingBufferPool::with_allocator(2, 8, allocator),
        Err(PoolError::SlotAllocation { index: 0, .. })
    ));
    assert_eq!(counters.released(), 0);
}

/// 槽位表本身无法分配时报告 `ContainerAllocation`，且不触碰分配器。
#[test]
fn oversized_capacity_fails_before_any_slot_is_allocated() {
    let allocator = CountingAllocator::default();
    let counters = allocator.clone();

    let error = RingBufferPool::with_allocator(usize::MAX, 8, allocator).unwrap_err();

    assert_eq!(
        error,
        PoolError::ContainerAllocation {
            capacity: usize::MAX
        }
    );
    assert_eq!(error.code(), "slotd.pool.container_allocation_failed");
    assert_eq!(counters.allocated(), 0);
    assert_eq!(counters.released(), 0, "槽位表失败时不得调用 release");
}

/// `destroy` 与 `Drop` 各自只归还一次全部槽位。
#[test]
fn destroy_and_drop_release_every_slot_once() {
    let allocator = CountingAllocator::default();
    let counters = allocator.clone();
    let pool = RingBufferPool::with_allocator(5, 8, allocator).expect("创建缓冲池失败");
    assert_eq!(pool.destroy(), 5);
    assert_eq!(counters.released(), 5);

    let allocator = CountingAllocator::default();
    let counters = allocator.clone();
    {
        let mut pool = RingBufferPool::with_allocator(3, 8, allocator).expect("创建缓冲池失败");
        pool.acquire();
    }
    assert_eq!(counters.allocated(), 3);
    assert_eq!(counters.released(), 3);
}

/// 场景 B 的池侧视角：容量 10、槽位 32768 字节，租借 25 次恰好回绕两次且分配字节数不变。
#[test]
fn twenty_five_acquisitions_wrap_twice_without_new_allocation() {
    let allocator = CountingAllocator::default();
    let counters = allocator.clone();
    let mut pool =
        RingBufferPool::with_allocator(10, MAX_REQUEST_SIZE, allocator).expect("创建缓冲池失败");
    let before = pool.stats();

    for _ in 0..25 {
        pool.acquire()[0] = 1;
    }

    let after = pool.stats();
    assert_eq!(after.wraps, 2);
    assert_eq!(after.acquisitions, 25);
    assert_eq!(after.cursor, 5);
    assert_eq!(after.allocated_bytes, before.allocated_bytes);
    assert_eq!(after.allocated_bytes, 10 * 32_768);
    assert_eq!(counters.allocated(), 10, "热路径上不应再申请槽位");
}
