// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 服务宿主
//!
//! [`Host`] 把一棵处理器树挂到 TCP 端口上：
//! - 每个连接一个 Tokio 任务，读取请求头后交给根处理器；
//! - 处理器树在所有任务之间共享且只读；
//! - 收到停机通知后停止接受新连接，已经开始的任务继续完成。

use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::{
        atomic::{AtomicU32, AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Notify,
};

use crate::{
    config::Config,
    exception::Exception,
    handler::Handler,
    param::{HttpRequestMethod, ALLOWED_METHODS},
    request::Request,
    response::Response,
};

/// 单次读取请求头的缓冲区大小
const BUFFER_SIZE: usize = 8192;

pub struct Host {
    root: Arc<dyn Handler>,
    port: u16,
    local: bool,
    shutdown: Arc<Notify>,
    active_connection: Arc<AtomicU32>,
    next_id: AtomicU64,
}

impl Host {
    pub fn new(root: Arc<dyn Handler>, config: &Config) -> Self {
        Self {
            root,
            port: config.port(),
            local: config.local(),
            shutdown: Arc::new(Notify::new()),
            active_connection: Arc::new(AtomicU32::new(0)),
            next_id: AtomicU64::new(0),
        }
    }

    /// 用于从其他任务发出停机通知
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// 当前活跃连接数
    pub fn active_connections(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.active_connection)
    }

    /// 绑定端口。支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    pub async fn bind(&self) -> Result<TcpListener, Exception> {
        let address = match self.local {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        let socket = SocketAddrV4::new(address, self.port);

        let listener = TcpListener::bind(socket).await.map_err(|e| {
            error!("无法绑定端口：{}，错误：{}", self.port, e);
            Exception::Io(e)
        })?;
        info!("服务端将在{}上监听Socket连接", listener.local_addr()?);
        Ok(listener)
    }

    pub async fn run(&self) -> Result<(), Exception> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// 持续接收新连接，直到收到停机通知
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Exception> {
        loop {
            let (stream, addr) = tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("主循环接收到停机指令，正在退出...");
                    return Ok(());
                }
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("接受连接失败：{}", e);
                        continue;
                    }
                },
            };

            let id = u128::from(self.next_id.fetch_add(1, Ordering::Relaxed));
            debug!("[ID{}]TCP连接已建立：{}", id, addr);

            let root = Arc::clone(&self.root);
            let active_connection = Arc::clone(&self.active_connection);

            tokio::spawn(async move {
                active_connection.fetch_add(1, Ordering::Relaxed);
                handle_connection(stream, addr, id, root).await;
                active_connection.fetch_sub(1, Ordering::Relaxed);
            });
        }
    }
}

/// # 连接处理器
///
/// 读取请求头、交给处理器树、写回响应。
async fn handle_connection(mut stream: TcpStream, addr: SocketAddr, id: u128, root: Arc<dyn Handler>) {
    let mut buffer = vec![0; BUFFER_SIZE];

    let size = match stream.read(&mut buffer).await {
        Ok(0) => return, // 客户端主动关闭连接
        Ok(size) => size,
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕，{}字节，来自{}", id, size, addr);

    let response = respond(&buffer[..size], id, &root);

    let response_bytes = response.as_bytes();
    debug!("[ID{}]发送全量响应，长度: {}", id, response_bytes.len());
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}

/// 解析请求并交给处理器树，总是得到一个可以发送的响应。
///
/// 请求无法解析时直接按错误类型回应，不经过处理器树。
pub fn respond(buffer: &[u8], id: u128, root: &Arc<dyn Handler>) -> Response {
    let start_time = Instant::now();

    let mut request = match Request::try_from(buffer, id, Arc::clone(root)) {
        Ok(request) => request,
        Err(e) => {
            warn!("[ID{}]解析HTTP请求失败: {}", id, e);
            return Response::from_status_code(e.status_code(), None);
        }
    };
    debug!("[ID{}]成功解析HTTP请求", id);

    // `OPTIONS *` 针对整个服务器，没有对应的处理器
    let response = if request.method() == HttpRequestMethod::Options && request.path() == "*" {
        Ok(Some(Response::new().status(204).allow(&ALLOWED_METHODS)))
    } else {
        Arc::clone(root).handle(&mut request)
    };

    let response = match response {
        Ok(Some(response)) => response,
        Ok(None) => Response::from_status_code(404, None),
        Err(e) => {
            error!("[ID{}]处理请求时发生异常: {}", id, e);
            Response::from_status_code(500, None)
        }
    }
    .finalize(&request);

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    info!(
        "[ID{}] {}, {}, {}, {}, {}, {}, ",
        id,
        request.version(),
        request.path(),
        request.method(),
        response.status_code(),
        response.information(),
        request.user_agent(),
    );

    response
}
