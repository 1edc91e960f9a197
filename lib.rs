//! # erlrtree-client
//!
//! ErlRTree 空间索引节点的命令行客户端。
//!
//! 一条命令（create / load / build / intersects）被翻译成一个或多个远程调用，
//! 通过同一个本地节点会话发往远端节点；`intersects` 的每个点并发查询，
//! 回复到达一个输出一行 `RESPONSE <value>`。

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod protocol;

// 重新导出常用类型，便于二进制文件使用
pub use client::{CliArgs, CommandRunner, OutputFormatter};
pub use commands::Command;
pub use config::ClientConfig;
pub use error::ClientError;
pub use node::{NodeConnection, NodeName, RemoteCall, RpcNode};
pub use protocol::Term;

pub type Result<T> = std::result::Result<T, ClientError>;
