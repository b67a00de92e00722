/// 缓冲池的只读统计快照。
///
/// - `allocated_bytes` 在池的整个生命周期内恒等于 `capacity * slot_size`，
///   可用于确认热路径上没有发生额外分配；
/// - `wraps` 统计游标从末尾回到槽位 0 的次数；
/// - `cursor` 为最近一次借出的槽位序号。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    pub capacity: usize,
    pub slot_size: usize,
    pub allocated_bytes: usize,
    pub acquisitions: u64,
    pub wraps: u64,
    pub cursor: usize,
}
