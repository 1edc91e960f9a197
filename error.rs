use std::time::Duration;

/// 客户端错误类型
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// 参数解析失败（发生在任何网络活动之前）
    #[error("parse error: {0}")]
    Parse(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("no response within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("batch deadline of {deadline:?} elapsed with {outstanding} response(s) outstanding")]
    BatchTimeout { outstanding: usize, deadline: Duration },

    #[error("{failed} of {total} remote call(s) failed")]
    BatchFailed { failed: usize, total: usize },

    /// 远端节点返回的 badrpc
    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
