use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use crate::node::connection::read_frame;
use crate::node::{NodeName, NodeSettings};
use crate::protocol::{RespValue, Term};

/// 进程内的假网关
pub struct FakeGateway {
    listener: TcpListener,
}

impl FakeGateway {
    pub async fn bind() -> Self {
        Self {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
        }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    pub fn settings(&self) -> NodeSettings {
        NodeSettings {
            local: NodeName::local("py_rtree").unwrap(),
            cookie: "rtree".to_string(),
            remote: "rtree@127.0.0.1".parse().unwrap(),
            port: self.port(),
            connect_timeout: Some(Duration::from_secs(5)),
            debug: true,
        }
    }

    pub async fn accept(&self) -> GatewaySession {
        let (stream, _) = self.listener.accept().await.unwrap();
        GatewaySession {
            stream,
            buffer: Vec::new(),
        }
    }
}

/// 网关侧的一条会话
pub struct GatewaySession {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl GatewaySession {
    /// 读取下一个帧；客户端关闭连接时返回 `None`
    pub async fn next_frame(&mut self) -> Option<RespValue> {
        read_frame(&mut self.stream, &mut self.buffer)
            .await
            .ok()
            .flatten()
    }

    /// 读取一个由 bulk string 组成的请求帧
    pub async fn expect_frame(&mut self) -> Vec<String> {
        match self.next_frame().await {
            Some(RespValue::Array(Some(items))) => items
                .into_iter()
                .map(|item| match item {
                    RespValue::BulkString(Some(s)) => s,
                    other => panic!("unexpected item {:?}", other),
                })
                .collect(),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    /// 读取 HELLO 并接受握手
    pub async fn accept_handshake(&mut self) -> Vec<String> {
        let hello = self.expect_frame().await;
        self.send(b"+OK\r\n").await;
        hello
    }

    pub async fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    pub async fn reply(&mut self, tag: &str, term: &Term) {
        let json = term.to_json().unwrap();
        let frame = format!("*2\r\n:{}\r\n${}\r\n{}\r\n", tag, json.len(), json);
        self.send(frame.as_bytes()).await;
    }

    pub async fn reply_error(&mut self, tag: &str, reason: &str) {
        let frame = format!("*2\r\n:{}\r\n-{}\r\n", tag, reason);
        self.send(frame.as_bytes()).await;
    }
}
