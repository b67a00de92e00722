#![doc = r#"
# slotd-server

## 设计动机（Why）
- 提供一个“每次接入先取缓冲”的 TCP 接入循环：监听套接字与 [`RingBufferPool`](slotd_pool::RingBufferPool)
  在启动时一次性建立，之后接受连接不再触发任何内存分配；
- 启动失败以稳定的退出码结束进程，便于部署脚本区分地址解析、绑定与监听阶段的故障。

## 核心契约（What）
- [`start`]：校验配置 → 解析 → 绑定 → 监听 → 建池，返回 [`ListenerLoop`]；
- [`ListenerLoop::accept_once`] / [`ListenerLoop::run`]：取槽位、接受连接、交给 [`RequestHandler`]；
- [`StartupError::exit_code`]：1 解析失败、2 无可绑定地址、3 监听失败、4 建池失败、5 配置错误、6 运行时构建失败。

## 实现策略（How）
- 套接字通过 `socket2` 创建并设置 `SO_REUSEADDR`，监听后交给 Tokio 的 `TcpListener`；
- 循环运行在单线程运行时上，缓冲池只被循环任务访问；
- 日志统一使用 `tracing`，由 [`telemetry::install`] 输出到标准错误。

## 风险与注意（Trade-offs）
- 没有优雅停机路径，进程只能被外部信号终止；
- 处理器串行执行，不适合长耗时处理。
"#]

pub mod config;
mod connection;
mod error;
mod listener;
mod server;
pub mod socket;
pub mod telemetry;

pub use config::{ConfigError, PoolConfig, ServerConfig};
pub use connection::Connection;
pub use error::StartupError;
pub use listener::{
    AcceptOutcome, Acceptor, DiscardHandler, ListenerLoop, ListenerState, ListenerStats,
    RequestHandler,
};
pub use server::start;
