use slotd_pool::RingBufferPool;
use tracing::{debug, info};

use crate::{
    config::ServerConfig,
    error::StartupError,
    listener::{ListenerLoop, ListenerState, RequestHandler},
    socket,
};

/// 完成全部启动步骤，返回处于 `Listening` 阶段的接入循环。
///
/// # 教案式注释
///
/// ## 逻辑 (How)
/// 1. 校验配置；
/// 2. 解析候选地址并绑定第一个可用地址（`Created → Bound`）；
/// 3. 以配置的 backlog 监听（`Bound → Listening`）；
/// 4. 按 `pool.capacity × pool.slot_size` 预分配缓冲池。
///
/// ## 契约 (What)
/// - 任一步骤失败都返回对应的 [`StartupError`]，此前创建的套接字随之关闭；
/// - 必须在启用了 IO 驱动的 Tokio 运行时内调用；
/// - 返回后尚未接受任何连接，调用方通过 [`ListenerLoop::run`] 或
///   [`ListenerLoop::accept_once`] 驱动循环。
pub async fn start<H: RequestHandler>(
    config: &ServerConfig,
    handler: H,
) -> Result<ListenerLoop<H>, StartupError> {
    config.validate()?;
    debug!(state = ?ListenerState::Created, "starting listener");

    let candidates = socket::resolve(config).await?;
    let (socket, addr) = socket::bind_first(&candidates)?;
    debug!(state = ?ListenerState::Bound, %addr, "listener bound");

    let listener = socket::listen(socket, addr, config.backlog)?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Listen { addr, source })?;
    debug!(state = ?ListenerState::Listening, %local_addr, "listener listening");

    let pool = RingBufferPool::new(config.pool_capacity(), config.pool.slot_size)?;
    info!(
        %local_addr,
        backlog = config.backlog,
        capacity = pool.capacity(),
        slot_size = pool.slot_size(),
        "listener ready"
    );
    Ok(ListenerLoop::new(listener, local_addr, pool, handler))
}
