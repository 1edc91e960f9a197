use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::node::{RemoteCall, RpcNode};
use crate::protocol::Term;
use crate::Result;

/// 批量调用中单个调用的结果
#[derive(Debug)]
pub struct CallOutcome {
    /// 调用在批次中的位置
    pub index: usize,
    pub call: RemoteCall,
    pub result: Result<Term>,
}

/// 远程调用分发器
///
/// `send_sync` 发送一个调用并等待唯一的回复；`send_async` 为每个调用派生一个任务，
/// 结果（成功或失败）都推入共享通道，由 `PendingResponses` 在调用方任务上逐个取出。
pub struct Dispatcher<N: RpcNode> {
    node: Arc<N>,
    timeout: Option<Duration>,
}

impl<N: RpcNode> Dispatcher<N> {
    /// `timeout` 为 `None` 时不限时等待
    pub fn new(node: Arc<N>, timeout: Option<Duration>) -> Self {
        Self { node, timeout }
    }

    /// 同步调用，超时返回 `ClientError::Timeout`，不重试
    pub async fn send_sync(&self, call: &RemoteCall) -> Result<Term> {
        debug!(%call, "Sending call");
        call_with_timeout(self.node.as_ref(), call, self.timeout).await
    }

    /// 并发发送所有调用，返回结果集合
    ///
    /// 每个任务都会恰好推送一个结果；`deadline` 是整个批次的总时限。
    pub fn send_async(&self, calls: Vec<RemoteCall>, deadline: Option<Duration>) -> PendingResponses {
        let (tx, rx) = mpsc::unbounded_channel();
        let expected = calls.len();

        for (index, call) in calls.into_iter().enumerate() {
            let node = Arc::clone(&self.node);
            let tx = tx.clone();
            let timeout = self.timeout;

            tokio::spawn(
                async move {
                    debug!(index, %call, "Sending call");
                    let result = call_with_timeout(node.as_ref(), &call, timeout).await;
                    if tx.send(CallOutcome { index, call, result }).is_err() {
                        debug!(index, "Response collector is gone, dropping outcome");
                    }
                }
                .with_current_subscriber(),
            );
        }

        info!(
            "Dispatched {} call(s). Timeout between messages: {:?}",
            expected, self.timeout
        );
        PendingResponses::new(rx, expected, self.timeout, deadline)
    }
}

async fn call_with_timeout<N: RpcNode>(
    node: &N,
    call: &RemoteCall,
    timeout: Option<Duration>,
) -> Result<Term> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, node.call(call))
            .await
            .map_err(|_| ClientError::Timeout { timeout: limit })?,
        None => node.call(call).await,
    }
}

/// 一个批次尚未取出的结果
///
/// 每次取结果都有一个有界等待（`poll_interval`）；等待期满只是“暂时没有”，
/// 不计数也不结束循环。剩余计数归零时结束；设置了 `deadline` 时，
/// 总时限用尽也会结束并报告未到达的数量。
pub struct PendingResponses {
    rx: mpsc::UnboundedReceiver<CallOutcome>,
    expected: usize,
    remaining: usize,
    poll_interval: Option<Duration>,
    deadline: Option<(Instant, Duration)>,
}

impl PendingResponses {
    pub fn new(
        rx: mpsc::UnboundedReceiver<CallOutcome>,
        expected: usize,
        poll_interval: Option<Duration>,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            rx,
            expected,
            remaining: expected,
            poll_interval,
            deadline: deadline.map(|total| (Instant::now() + total, total)),
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// 取出下一个结果；批次完成后返回 `None`
    pub async fn next(&mut self) -> Option<Result<CallOutcome>> {
        if self.remaining == 0 {
            return None;
        }

        loop {
            let mut wait = self.poll_interval;
            if let Some((at, total)) = self.deadline {
                let now = Instant::now();
                if now >= at {
                    return Some(Err(self.abandon(ClientError::BatchTimeout {
                        outstanding: self.remaining,
                        deadline: total,
                    })));
                }
                let left = at - now;
                wait = Some(wait.map_or(left, |w| w.min(left)));
            }

            let received = match wait {
                Some(limit) => match tokio::time::timeout(limit, self.rx.recv()).await {
                    Ok(received) => received,
                    Err(_) => {
                        debug!(
                            remaining = self.remaining,
                            "No response within {:?}, waiting again", limit
                        );
                        continue;
                    }
                },
                None => self.rx.recv().await,
            };

            return match received {
                Some(outcome) => {
                    self.remaining -= 1;
                    Some(Ok(outcome))
                }
                None => {
                    let outstanding = self.remaining;
                    Some(Err(self.abandon(ClientError::Connection(format!(
                        "dispatch tasks ended with {} response(s) outstanding",
                        outstanding
                    )))))
                }
            };
        }
    }

    fn abandon(&mut self, err: ClientError) -> ClientError {
        self.remaining = 0;
        self.rx.close();
        err
    }
}
