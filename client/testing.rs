use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::node::{RemoteCall, RpcNode};
use crate::protocol::Term;
use crate::Result;

/// 一次调用的预设行为：等待多久，以及回复什么（`None` 表示永不回复）
pub type Behavior = Box<dyn Fn(&RemoteCall) -> (Duration, Option<Result<Term>>) + Send + Sync>;

/// 测试用的节点替身，记录收到的调用
pub struct MockNode {
    seen: Mutex<Vec<RemoteCall>>,
    behavior: Behavior,
}

impl MockNode {
    pub fn new<F>(behavior: F) -> Self
    where
        F: Fn(&RemoteCall) -> (Duration, Option<Result<Term>>) + Send + Sync + 'static,
    {
        Self {
            seen: Mutex::new(Vec::new()),
            behavior: Box::new(behavior),
        }
    }

    /// 立即回复 `{ok, Args}`
    pub fn echo() -> Self {
        Self::new(|call| (Duration::ZERO, Some(Ok(echo_reply(call)))))
    }

    pub fn seen(&self) -> Vec<RemoteCall> {
        self.seen.lock().unwrap().clone()
    }
}

pub fn echo_reply(call: &RemoteCall) -> Term {
    Term::Tuple(vec![Term::atom("ok"), Term::List(call.args.clone())])
}

impl RpcNode for MockNode {
    fn call(&self, call: &RemoteCall) -> impl Future<Output = Result<Term>> + Send {
        self.seen.lock().unwrap().push(call.clone());
        let (delay, reply) = (self.behavior)(call);
        async move {
            tokio::time::sleep(delay).await;
            match reply {
                Some(reply) => reply,
                None => std::future::pending().await,
            }
        }
    }
}
