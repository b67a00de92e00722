use thiserror::Error;

/// 缓冲池构造阶段的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：原先“一律返回空”的失败路径无法让调用方区分“参数非法”与“内存不足”，
///   拆分后上层可以选择缩小容量重试或直接中止启动；
/// - **契约 (What)**：
///   - 三个变体均为 `Copy`，可在日志与退出码映射之间自由传递；
///   - [`code`](Self::code) 返回稳定的点分错误码，便于告警规则匹配；
///   - 任一错误返回时，池已完成全部回滚，不存在部分构造的残留。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum PoolError {
    /// `capacity` 或 `slot_size` 为 0。
    #[error("invalid pool arguments: capacity={capacity}, slot_size={slot_size}")]
    InvalidArguments { capacity: usize, slot_size: usize },

    /// 第 `index` 个槽位（从 0 计）申请失败，此前成功的 `index` 个槽位已归还。
    #[error("failed to allocate slot {index} ({slot_size} bytes)")]
    SlotAllocation { index: usize, slot_size: usize },

    /// 外层容器（槽位表）本身申请失败。
    #[error("failed to allocate slot table for {capacity} slots")]
    ContainerAllocation { capacity: usize },
}

impl PoolError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            PoolError::InvalidArguments { .. } => "slotd.pool.invalid_arguments",
            PoolError::SlotAllocation { .. } => "slotd.pool.slot_allocation_failed",
            PoolError::ContainerAllocation { .. } => "slotd.pool.container_allocation_failed",
        }
    }
}
