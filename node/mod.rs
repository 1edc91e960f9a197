pub mod call;
pub mod connection;
pub mod name;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;

use crate::protocol::Term;
use crate::Result;

pub use call::RemoteCall;
pub use connection::{NodeConnection, NodeSettings};
pub use name::NodeName;

/// 可以执行远程调用的节点
///
/// 分发器只依赖这个接口，会话实现与测试替身都通过它接入。
pub trait RpcNode: Send + Sync + 'static {
    fn call(&self, call: &RemoteCall) -> impl Future<Output = Result<Term>> + Send;
}
