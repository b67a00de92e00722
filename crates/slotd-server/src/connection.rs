use std::net::SocketAddr;

use tokio::net::TcpStream;

/// 已接受的入站连接，携带本地与对端地址。
///
/// 所有权随 [`RequestHandler::handle`](crate::RequestHandler::handle) 转移给处理器，
/// 处理器返回（或丢弃连接）时套接字关闭。
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl Connection {
    pub(crate) fn from_parts(stream: TcpStream, local_addr: SocketAddr, peer_addr: SocketAddr) -> Self {
        Self {
            stream,
            local_addr,
            peer_addr,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// 底层流的可变引用，供处理器读写。
    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// 拆出底层流。
    pub fn into_stream(self) -> TcpStream {
        self.stream
    }
}
