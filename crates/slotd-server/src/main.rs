//! `slotd`：预分配缓冲池 TCP 接入服务的进程入口。
//!
//! # 使用契约（What）
//! - **输入**：`slotd [CONFIG.toml]`，唯一可选参数为配置文件路径，缺省使用内置默认值；
//! - **日志**：输出到标准错误，过滤规则取自 `RUST_LOG`；
//! - **退出码**：正常运行时永不退出；启动失败时以 [`StartupError::exit_code`] 结束。

use std::{env, path::Path, process};

use slotd_server::{DiscardHandler, ServerConfig, StartupError, start, telemetry};
use tracing::{error, info};

fn main() {
    if let Err(error) = telemetry::install() {
        eprintln!("slotd: 日志初始化失败：{error}");
    }

    if let Err(error) = run() {
        error!(
            code = error.code(),
            exit_code = error.exit_code(),
            error = %error,
            "startup failed"
        );
        process::exit(error.exit_code());
    }
}

fn run() -> Result<(), StartupError> {
    let config = match env::args_os().nth(1) {
        Some(path) => ServerConfig::load(Path::new(&path))?,
        None => ServerConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(async {
        let mut listener = start(&config, DiscardHandler).await?;
        info!(local_addr = %listener.local_addr(), "starting server");
        listener.run().await;
        Ok::<_, StartupError>(())
    })
}
