use std::{
    fs,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;
use tracing::{debug, warn};

use crate::{
    config::ServerConfig,
    error::{BIND, CONFIGURE, LISTEN, OperationKind, RESOLVE, SOCKET, StartupError},
};

/// 地址解析 → 创建套接字 → 绑定 → 监听 的一次性启动序列，产出唯一的监听套接字。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 这是接入循环的外部协作者：没有状态机，也没有可复用的数据结构，只负责按顺序完成系统调用，
///   并把每一步的失败映射到固定的 [`StartupError`] 变体（进而映射到退出码）。
///
/// ## 逻辑 (How)
/// - [`resolve`]：服务名先按数字端口解析，否则查 `/etc/services` 的 TCP 条目；
///   未配置主机时按被动模式生成 `0.0.0.0` 与 `::` 两个候选，否则通过 Tokio 做 DNS 解析；
/// - [`bind_first`]：依次尝试候选地址，套接字创建、`SO_REUSEADDR` 设置或绑定失败时记录日志并尝试下一个；
/// - [`listen`]：以配置的 backlog 进入监听状态，再转交给 Tokio。
///
/// ## 契约 (What)
/// - 解析失败发生在创建任何套接字之前；
/// - 失败的候选套接字在尝试下一个前即被关闭，不会泄漏文件描述符。
pub async fn open_listener(config: &ServerConfig) -> Result<TcpListener, StartupError> {
    let candidates = resolve(config).await?;
    let (socket, addr) = bind_first(&candidates)?;
    debug!(%addr, "socket bound");
    listen(socket, addr, config.backlog)
}

/// 系统服务名表，格式见 services(5)。
const SERVICES_PATH: &str = "/etc/services";

/// 将配置中的主机与服务解析为候选地址列表。
pub async fn resolve(config: &ServerConfig) -> Result<Vec<SocketAddr>, StartupError> {
    let target = format!("{}:{}", config.host.as_deref().unwrap_or("*"), config.port);
    let port = service_port(&config.port).ok_or_else(|| {
        resolve_failed(&target, format!("unknown service `{}`", config.port))
    })?;

    let Some(host) = config.host.as_deref() else {
        return Ok(vec![
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
        ]);
    };

    let candidates: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|err| resolve_failed(&target, err.to_string()))?
        .collect();
    if candidates.is_empty() {
        return Err(resolve_failed(&target, "no addresses returned".to_owned()));
    }
    Ok(candidates)
}

/// 依次尝试候选地址，返回第一个成功绑定的套接字。
pub fn bind_first(candidates: &[SocketAddr]) -> Result<(Socket, SocketAddr), StartupError> {
    for addr in candidates {
        let socket = match Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))
        {
            Ok(socket) => socket,
            Err(err) => {
                log_candidate_failure(SOCKET, addr, &err);
                continue;
            }
        };
        if let Err(err) = socket.set_reuse_address(true) {
            log_candidate_failure(CONFIGURE, addr, &err);
            continue;
        }
        if let Err(err) = socket.bind(&(*addr).into()) {
            log_candidate_failure(BIND, addr, &err);
            continue;
        }
        return Ok((socket, *addr));
    }
    Err(StartupError::Bind {
        attempted: candidates.len(),
    })
}

/// 进入监听状态并转换为 Tokio 监听器。
///
/// 必须在启用了 IO 驱动的 Tokio 运行时内调用。
pub fn listen(socket: Socket, addr: SocketAddr, backlog: u32) -> Result<TcpListener, StartupError> {
    let listen_failed = |source| StartupError::Listen { addr, source };
    let backlog = i32::try_from(backlog).unwrap_or(i32::MAX);

    socket.listen(backlog).map_err(listen_failed)?;
    socket.set_nonblocking(true).map_err(listen_failed)?;
    let listener = TcpListener::from_std(socket.into()).map_err(listen_failed)?;
    debug!(%addr, backlog, op = LISTEN.message, "socket listening");
    Ok(listener)
}

/// 数字端口直接使用；否则在系统服务名表中查找同名（或别名）的 TCP 服务。
fn service_port(service: &str) -> Option<u16> {
    if let Ok(port) = service.parse() {
        return Some(port);
    }
    let table = fs::read_to_string(SERVICES_PATH).ok()?;
    lookup_service(&table, service)
}

/// 在 services(5) 格式的文本中查找 TCP 服务端口，`#` 之后为注释。
fn lookup_service(table: &str, name: &str) -> Option<u16> {
    table.lines().find_map(|line| {
        let entry = line.split('#').next().unwrap_or_default();
        let mut fields = entry.split_whitespace();
        let official = fields.next()?;
        let (port, protocol) = fields.next()?.split_once('/')?;
        if protocol != "tcp" {
            return None;
        }
        if official != name && !fields.any(|alias| alias == name) {
            return None;
        }
        port.parse().ok()
    })
}

fn resolve_failed(target: &str, detail: String) -> StartupError {
    warn!(code = RESOLVE.code, target, %detail, "{} failed", RESOLVE.message);
    StartupError::Resolve {
        target: target.to_owned(),
        detail,
    }
}

fn log_candidate_failure(kind: OperationKind, addr: &SocketAddr, err: &std::io::Error) {
    warn!(code = kind.code, %addr, error = %err, "{} failed, trying next address", kind.message);
}
