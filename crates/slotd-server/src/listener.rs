use std::{future::Future, io, net::SocketAddr};

use slotd_pool::RingBufferPool;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, trace, warn};

use crate::{
    connection::Connection,
    error::{ACCEPT, HANDLE},
};

/// 处理一条已接受连接的协作者。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 接入循环只负责“取缓冲 → 接受连接 → 分派”，读写协议由处理器决定；
///   将其抽象为 trait，便于测试注入记录型或失败型处理器。
///
/// ## 契约 (What)
/// - `connection`：所有权转移给处理器，返回时若未被保存则随之关闭；
/// - `buffer`：本次接入独占的已清零槽位，仅在本次调用期间有效，
///   下一次接入会重新清零并可能复用同一槽位；
/// - 返回 `Err` 只影响当前连接，循环记录日志后继续。
pub trait RequestHandler {
    fn handle(
        &mut self,
        connection: Connection,
        buffer: &mut [u8],
    ) -> impl Future<Output = io::Result<()>>;
}

/// 入站连接的来源。
///
/// 生产路径由 Tokio [`TcpListener`] 实现；测试可以注入按需失败的来源，驱动瞬时接受错误的分支。
pub trait Acceptor {
    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>>;
}

impl Acceptor for TcpListener {
    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> {
        TcpListener::accept(self)
    }
}

/// 默认处理器：不读不写，直接关闭连接。
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardHandler;

impl RequestHandler for DiscardHandler {
    async fn handle(&mut self, connection: Connection, _buffer: &mut [u8]) -> io::Result<()> {
        trace!(peer = %connection.peer_addr(), "connection discarded");
        Ok(())
    }
}

/// 接入循环的生命周期阶段。
///
/// 只向前推进：`Created → Bound → Listening → Accepting`，不存在停止阶段。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListenerState {
    Created,
    Bound,
    Listening,
    Accepting,
}

/// 接入循环的累计计数。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ListenerStats {
    pub accepted: u64,
    pub accept_errors: u64,
    pub handler_errors: u64,
}

/// 单次接入迭代的结果。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AcceptOutcome {
    /// 连接已交给处理器且处理成功。
    Handled { peer: SocketAddr, slot: usize },
    /// 处理器返回错误，已记录日志。
    HandlerFailed { peer: SocketAddr, slot: usize },
    /// 接受连接失败（瞬时错误），已记录日志。
    Failed,
}

/// 持有监听套接字与缓冲池的接入循环。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 监听套接字与缓冲池在进程生命周期内由循环独占，不存在全局状态；
/// - 每次接入前先从池中取出一个槽位，保证接受连接本身不触发任何内存分配。
///
/// ## 逻辑 (How)
/// - [`accept_once`](Self::accept_once)：`acquire` → `accept` → `handle`，
///   接受失败与处理失败都只记录 `warn` 并计数；
/// - [`run`](Self::run)：无限重复 `accept_once`，永不返回。
///
/// ## 契约 (What)
/// - **前置条件**：由 [`start`](crate::start) 构造，此时已处于 `Listening`；
/// - **后置条件**：首次 `accept_once` 之后状态变为 `Accepting`；
/// - 槽位借用在处理器返回时结束，下一次 `acquire` 之前必然失效。
///
/// ## 注意事项 (Trade-offs)
/// - 处理器在循环任务内串行执行，慢处理器会推迟后续接入；
///   需要并发处理时应改用 [`SharedRingPool`](slotd_pool::SharedRingPool)。
#[derive(Debug)]
pub struct ListenerLoop<H, L = TcpListener> {
    listener: L,
    local_addr: SocketAddr,
    pool: RingBufferPool,
    handler: H,
    state: ListenerState,
    stats: ListenerStats,
}

impl<H: RequestHandler, L: Acceptor> ListenerLoop<H, L> {
    pub(crate) fn new(
        listener: L,
        local_addr: SocketAddr,
        pool: RingBufferPool,
        handler: H,
    ) -> Self {
        Self {
            listener,
            local_addr,
            pool,
            handler,
            state: ListenerState::Listening,
            stats: ListenerStats::default(),
        }
    }

    /// 执行一次完整的接入迭代。
    pub async fn accept_once(&mut self) -> AcceptOutcome {
        self.state = ListenerState::Accepting;
        let (slot, buffer) = self.pool.acquire_indexed();

        let (stream, peer) = match self.listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                self.stats.accept_errors += 1;
                warn!(code = ACCEPT.code, error = %err, "{} failed", ACCEPT.message);
                return AcceptOutcome::Failed;
            }
        };
        self.stats.accepted += 1;
        debug!(%peer, slot, "connection accepted");

        let connection = Connection::from_parts(stream, self.local_addr, peer);
        match self.handler.handle(connection, buffer).await {
            Ok(()) => AcceptOutcome::Handled { peer, slot },
            Err(err) => {
                self.stats.handler_errors += 1;
                warn!(code = HANDLE.code, %peer, error = %err, "{} failed", HANDLE.message);
                AcceptOutcome::HandlerFailed { peer, slot }
            }
        }
    }

    /// 无限接入循环，永不返回。
    pub async fn run(&mut self) {
        loop {
            self.accept_once().await;
        }
    }
}

impl<H, L> ListenerLoop<H, L> {
    /// 监听套接字实际绑定的地址。
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }

    pub fn pool(&self) -> &RingBufferPool {
        &self.pool
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}
