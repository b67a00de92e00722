use std::{io, net::SocketAddr};

use slotd_pool::PoolError;
use thiserror::Error;

use crate::config::ConfigError;

/// 描述一次底层套接字操作对应的稳定错误码与默认文案。
#[derive(Clone, Copy, Debug)]
pub(crate) struct OperationKind {
    pub code: &'static str,
    pub message: &'static str,
}

pub(crate) const RESOLVE: OperationKind = OperationKind {
    code: "slotd.server.resolve_failed",
    message: "address resolution",
};
pub(crate) const SOCKET: OperationKind = OperationKind {
    code: "slotd.server.socket_failed",
    message: "tcp socket",
};
pub(crate) const CONFIGURE: OperationKind = OperationKind {
    code: "slotd.server.configure_failed",
    message: "tcp configure",
};
pub(crate) const BIND: OperationKind = OperationKind {
    code: "slotd.server.bind_failed",
    message: "tcp bind",
};
pub(crate) const LISTEN: OperationKind = OperationKind {
    code: "slotd.server.listen_failed",
    message: "tcp listen",
};
pub(crate) const ACCEPT: OperationKind = OperationKind {
    code: "slotd.server.accept_failed",
    message: "tcp accept",
};
pub(crate) const HANDLE: OperationKind = OperationKind {
    code: "slotd.server.handler_failed",
    message: "request handler",
};

/// 启动阶段的致命错误，每个变体对应一个稳定的进程退出码。
///
/// # 教案式说明
/// - **意图 (Why)**：接入循环本身从不正常退出，进程唯一可观测的退出状态来自启动失败；
///   退出码必须稳定，运维脚本据此区分“地址解析失败”“端口被占用”“listen 失败”等情形；
/// - **契约 (What)**：
///   - `Resolve` → 1，`Bind` → 2，`Listen` → 3 与既有约定一致；
///   - `Pool` → 4，`Config` → 5，`Runtime` → 6 为新增的启动前置步骤；
///   - 全部变体均不重试，调用方记录日志后直接以 [`exit_code`](Self::exit_code) 退出。
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to resolve `{target}`: {detail}")]
    Resolve { target: String, detail: String },

    /// 所有候选地址均无法创建、配置或绑定套接字；各候选的失败原因已逐条记录日志。
    #[error("no usable local address among {attempted} candidate(s)")]
    Bind { attempted: usize },

    #[error("failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to allocate request buffer pool: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build async runtime: {0}")]
    Runtime(#[source] io::Error),
}

impl StartupError {
    /// 进程退出码。
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Resolve { .. } => 1,
            StartupError::Bind { .. } => 2,
            StartupError::Listen { .. } => 3,
            StartupError::Pool(_) => 4,
            StartupError::Config(_) => 5,
            StartupError::Runtime(_) => 6,
        }
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            StartupError::Resolve { .. } => RESOLVE.code,
            StartupError::Bind { .. } => BIND.code,
            StartupError::Listen { .. } => LISTEN.code,
            StartupError::Pool(error) => error.code(),
            StartupError::Config(_) => "slotd.server.config_invalid",
            StartupError::Runtime(_) => "slotd.server.runtime_failed",
        }
    }
}
