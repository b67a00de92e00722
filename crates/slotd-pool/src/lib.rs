//! `slotd-pool` 提供接入循环使用的固定容量请求缓冲池。
//!
//! # 模块定位（Why）
//! - 服务端在启动阶段一次性申请 `capacity × slot_size` 字节，之后每接受一个连接只推进游标、
//!   清零并借出一个槽位，热路径上不再触发堆分配；
//! - 内存上限与请求量无关，代价是调用方必须在槽位被轮转复用之前用完（或拷走）其中的数据。
//!
//! # 设计概要（How）
//! - [`RingBufferPool`]：单线程环形池，`acquire(&mut self)` 借出的 `&mut [u8]`
//!   在下一次租借前由借用检查器强制失效；
//! - [`SharedRingPool`]：并发扩展，原子游标 + 每槽独立锁，借出 [`SlotGuard`]，
//!   回绕到仍被持有的槽位时等待而非覆盖；
//! - [`SlotAllocator`]：槽位的申请/释放钩子，默认 [`HeapSlotAllocator`] 使用可失败的
//!   `try_reserve_exact`，测试可注入失败以验证回滚路径。
//!
//! # 契约（What）
//! - 构造失败时全部回滚（包括外层容器），以 [`PoolError`] 区分失败原因；
//! - 槽位在借出瞬间一定是全零；
//! - 构造阶段清零槽位 0，首次租借推进到槽位 1，与既有的编号顺序保持一致。

mod allocator;
mod error;
mod ring;
mod shared;
mod stats;

pub use allocator::{HeapSlotAllocator, SlotAllocator};
pub use error::PoolError;
pub use ring::RingBufferPool;
pub use shared::{SharedRingPool, SlotGuard};
pub use stats::PoolStats;

/// 单个请求缓冲的默认字节数（`2 << 14`），即单次请求预期的最大尺寸。
pub const MAX_REQUEST_SIZE: usize = 2 << 14;
