//! 进程级日志安装。
//!
//! # 契约（What）
//! - `fmt` Layer 输出到标准错误，过滤规则取自 `RUST_LOG`，缺省为 `info`；
//! - 只能安装一次；外部已设置全局 Subscriber 时返回错误而非覆盖。

use std::io;

use thiserror::Error;
use tracing::dispatcher;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// 日志安装失败。
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("a global tracing subscriber has already been installed")]
    SubscriberAlreadySet,

    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// 安装全局 `tracing` Subscriber。
pub fn install() -> Result<(), TelemetryError> {
    if dispatcher::has_been_set() {
        return Err(TelemetryError::SubscriberAlreadySet);
    }

    let subscriber = tracing_subscriber::registry()
        .with(build_env_filter())
        .with(fmt::layer().with_writer(io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
