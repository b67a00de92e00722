/// `SlotAllocator` 描述缓冲池申请与归还单个槽位的入口。
///
/// # 设计初衷（Why）
/// - 池只负责“何时”申请与释放，“如何”申请交给分配器；生产环境使用堆，
///   测试则可以在第 k 次申请时注入失败，并统计回滚时归还了多少槽位；
/// - 与“租借结束时通知回收”的钩子同构：每个成功申请的槽位最终都恰好经过一次 `release`。
///
/// # 契约定义（What）
/// - `allocate`：返回长度恰为 `slot_size` 且全零的缓冲；内存不足时返回 `None`，不得 panic；
/// - `release`：池在回滚、`destroy` 或 `Drop` 时调用，每个槽位只会被归还一次；
/// - `index` 为槽位序号，仅供实现方记录或注入故障使用。
pub trait SlotAllocator {
    /// 申请一个 `slot_size` 字节的全零槽位。
    fn allocate(&mut self, index: usize, slot_size: usize) -> Option<Box<[u8]>>;

    /// 归还槽位。默认直接释放。
    fn release(&mut self, slot: Box<[u8]>) {
        drop(slot);
    }
}

/// 基于全局堆的默认分配器。
///
/// 使用 `try_reserve_exact` 让内存不足表现为可处理的 `None`，
/// 而不是由全局分配器直接中止进程。
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapSlotAllocator;

impl SlotAllocator for HeapSlotAllocator {
    fn allocate(&mut self, _index: usize, slot_size: usize) -> Option<Box<[u8]>> {
        let mut raw = Vec::new();
        raw.try_reserve_exact(slot_size).ok()?;
        raw.resize(slot_size, 0);
        Some(raw.into_boxed_slice())
    }
}
