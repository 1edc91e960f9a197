use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::node::{NodeName, RemoteCall, RpcNode};
use crate::protocol::parser::MAX_BULK_LEN;
use crate::protocol::{RespEncoder, RespParser, RespValue, Term};
use crate::Result;

/// 读取缓冲的上限：一个回复帧是 tag 加一个 bulk string
const MAX_FRAME_LEN: usize = MAX_BULK_LEN + 64 * 1024;

const HELLO: &str = "HELLO";
const CALL: &str = "CALL";
const QUIT: &str = "QUIT";

type ReplySender = oneshot::Sender<Result<Term>>;
type PendingReplies = Arc<Mutex<HashMap<u64, ReplySender>>>;

/// 建立节点会话所需的参数
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub local: NodeName,
    pub cookie: String,
    pub remote: NodeName,
    /// 远端主机上网关的端口
    pub port: u16,
    /// 连接与握手的超时，`None` 表示不限
    pub connect_timeout: Option<Duration>,
    /// 记录每一个收发的帧
    pub debug: bool,
}

impl NodeSettings {
    pub fn gateway_addr(&self) -> String {
        format!("{}:{}", self.remote.host(), self.port)
    }
}

/// 一次客户端调用期间的本地节点身份
///
/// 所有远程调用复用同一条会话：每个调用分配一个 tag 并登记回复槽位，
/// 后台读取任务按 tag 把回复路由给对应的等待者，因此回复可以乱序到达。
/// `disconnect` 释放身份并让所有未完成的调用失败；`Drop` 兜底停止读取任务。
pub struct NodeConnection {
    local: NodeName,
    remote: NodeName,
    writer: AsyncMutex<Option<OwnedWriteHalf>>,
    pending: PendingReplies,
    next_tag: AtomicU64,
    reader: JoinHandle<()>,
    debug: bool,
}

impl NodeConnection {
    /// 连接网关并完成握手
    pub async fn connect(settings: &NodeSettings) -> Result<Self> {
        let addr = settings.gateway_addr();
        info!(
            "Connecting node {} to {} via {}",
            settings.local, settings.remote, addr
        );

        let establish = Self::establish(settings, &addr);
        let (stream, leftover) = match settings.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, establish).await.map_err(|_| {
                ClientError::Connection(format!(
                    "timed out connecting to {} after {:?}",
                    addr, limit
                ))
            })??,
            None => establish.await?,
        };

        let (read_half, write_half) = stream.into_split();
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(
            read_replies(read_half, leftover, Arc::clone(&pending), settings.debug)
                .with_current_subscriber(),
        );

        info!("Node {} connected to {}", settings.local, settings.remote);

        Ok(Self {
            local: settings.local.clone(),
            remote: settings.remote.clone(),
            writer: AsyncMutex::new(Some(write_half)),
            pending,
            next_tag: AtomicU64::new(1),
            reader,
            debug: settings.debug,
        })
    }

    async fn establish(settings: &NodeSettings, addr: &str) -> Result<(TcpStream, Vec<u8>)> {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::Connection(format!("failed to connect to {}: {}", addr, e)))?;

        let hello = RespEncoder::command(&[HELLO, &settings.local.to_string(), &settings.cookie]);
        if settings.debug {
            debug!(frame = %hello.trim_end(), ">> handshake");
        }
        stream
            .write_all(hello.as_bytes())
            .await
            .map_err(|e| ClientError::Connection(format!("handshake with {} failed: {}", addr, e)))?;

        let mut buffer = Vec::new();
        match read_frame(&mut stream, &mut buffer).await? {
            Some(RespValue::SimpleString(_)) => Ok((stream, buffer)),
            Some(RespValue::Error(reason)) => Err(ClientError::Connection(format!(
                "handshake rejected by {}: {}",
                addr, reason
            ))),
            Some(other) => Err(ClientError::Protocol(format!(
                "unexpected handshake reply: {:?}",
                other
            ))),
            None => Err(ClientError::Connection(format!(
                "{} closed the connection during handshake",
                addr
            ))),
        }
    }

    /// 发送一个调用并等待它的回复（不带超时，超时由分发器负责）
    pub async fn send_call(&self, call: &RemoteCall) -> Result<Term> {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        let args = serde_json::to_string(&call.args)?;
        let frame = RespEncoder::command(&[
            CALL,
            &tag.to_string(),
            &call.node.to_string(),
            &call.module,
            &call.function,
            &args,
        ]);

        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(tag, tx);
        // 调用被放弃（例如超时）时清理槽位
        let _slot = ReplySlot {
            tag,
            pending: &self.pending,
        };

        {
            let mut writer = self.writer.lock().await;
            let writer = writer.as_mut().ok_or_else(|| {
                ClientError::Connection(format!("node {} is disconnected", self.local))
            })?;
            if self.debug {
                debug!(tag, frame = %frame.trim_end(), ">> call");
            }
            writer.write_all(frame.as_bytes()).await.map_err(|e| {
                ClientError::Connection(format!("failed to send call to {}: {}", self.remote, e))
            })?;
        }

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ClientError::Connection(
                "session closed before the reply arrived".to_string(),
            )),
        }
    }

    /// 释放本地节点身份，可重复调用
    pub async fn disconnect(&self) {
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            info!("Disconnecting node {}", self.local);
            let quit = RespEncoder::command(&[QUIT]);
            if let Err(e) = writer.write_all(quit.as_bytes()).await {
                debug!("Failed to send QUIT to {}: {}", self.remote, e);
            }
            if let Err(e) = writer.shutdown().await {
                debug!("Failed to shut down session with {}: {}", self.remote, e);
            }
        }
        self.reader.abort();
        fail_pending(&self.pending, "node disconnected");
    }
}

impl RpcNode for NodeConnection {
    fn call(&self, call: &RemoteCall) -> impl Future<Output = Result<Term>> + Send {
        self.send_call(call)
    }
}

impl Drop for NodeConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

struct ReplySlot<'a> {
    tag: u64,
    pending: &'a PendingReplies,
}

impl Drop for ReplySlot<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.tag);
    }
}

fn lock_pending(pending: &PendingReplies) -> MutexGuard<'_, HashMap<u64, ReplySender>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn fail_pending(pending: &PendingReplies, reason: &str) {
    let waiters: Vec<ReplySender> = lock_pending(pending).drain().map(|(_, tx)| tx).collect();
    if !waiters.is_empty() {
        warn!("Failing {} outstanding call(s): {}", waiters.len(), reason);
    }
    for tx in waiters {
        let _ = tx.send(Err(ClientError::Connection(reason.to_string())));
    }
}

/// 从流中读取一个完整帧，`buffer` 保存跨读取的剩余字节
pub(crate) async fn read_frame<R>(reader: &mut R, buffer: &mut Vec<u8>) -> Result<Option<RespValue>>
where
    R: AsyncRead + Unpin,
{
    let parser = RespParser::new();
    let mut chunk = [0u8; 4096];

    loop {
        if let Some((value, used)) = parser.parse_frame(buffer)? {
            buffer.drain(..used);
            return Ok(Some(value));
        }
        if buffer.len() > MAX_FRAME_LEN {
            return Err(ClientError::Protocol(format!(
                "frame exceeds {} bytes",
                MAX_FRAME_LEN
            )));
        }

        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            if !buffer.is_empty() {
                debug!("Discarding {} byte(s) of truncated frame", buffer.len());
            }
            return Ok(None);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

async fn read_replies(
    mut reader: OwnedReadHalf,
    mut buffer: Vec<u8>,
    pending: PendingReplies,
    trace_frames: bool,
) {
    let reason = loop {
        match read_frame(&mut reader, &mut buffer).await {
            Ok(Some(frame)) => {
                if trace_frames {
                    debug!(?frame, "<< reply");
                }
                route_reply(frame, &pending);
            }
            Ok(None) => break "remote node closed the connection".to_string(),
            Err(e) => break format!("session failed: {}", e),
        }
    };

    debug!("Reply reader stopped: {}", reason);
    fail_pending(&pending, &reason);
}

fn route_reply(frame: RespValue, pending: &PendingReplies) {
    let (tag, outcome) = match frame {
        RespValue::Array(Some(mut items)) if items.len() == 2 => {
            let body = items.pop();
            let tag = items.pop();
            match (tag, body) {
                (Some(RespValue::Integer(tag)), Some(RespValue::BulkString(Some(json)))) => {
                    (tag, Term::from_json(&json))
                }
                (Some(RespValue::Integer(tag)), Some(RespValue::Error(reason))) => {
                    (tag, Err(ClientError::Remote(reason)))
                }
                (tag, body) => {
                    warn!("Ignoring malformed reply: tag={:?} body={:?}", tag, body);
                    return;
                }
            }
        }
        other => {
            warn!("Ignoring unexpected frame from node: {:?}", other);
            return;
        }
    };

    let Ok(tag) = u64::try_from(tag) else {
        warn!("Ignoring reply with negative tag {}", tag);
        return;
    };

    match lock_pending(pending).remove(&tag) {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => debug!("Dropping reply for unknown or abandoned call {}", tag),
    }
}
