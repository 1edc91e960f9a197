use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, info_span, Instrument};

use crate::client::cli_args::Action;
use crate::client::dispatcher::Dispatcher;
use crate::client::formatter::OutputFormatter;
use crate::commands::{Command, CommandRegistry};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::node::{NodeConnection, NodeName, RemoteCall, RpcNode};
use crate::Result;

/// 执行一个命令行动作，返回进程退出码
///
/// 未识别的动作输出 `Action not understood.` 并以 1 退出；
/// 命令失败时错误写到 `err`，同样以 1 退出。
pub async fn run_action<W, E>(config: &ClientConfig, action: Action, out: &mut W, err: &mut E) -> u8
where
    W: Write,
    E: Write,
{
    let Some(command) = action.into_command() else {
        let _ = writeln!(out, "{}", OutputFormatter::format_unknown_action());
        return 1;
    };

    config.log_summary();
    let span = info_span!(
        "command",
        action = command.action(),
        tree = %command.tree_name()
    );

    match execute(config, &command, out, err).instrument(span).await {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "{}", OutputFormatter::format_error(&e));
            1
        }
    }
}

/// 翻译、连接、分发、断开
pub async fn execute<W, E>(
    config: &ClientConfig,
    command: &Command,
    out: &mut W,
    err: &mut E,
) -> Result<()>
where
    W: Write,
    E: Write,
{
    // 先翻译，参数错误不会触发任何网络活动
    let runner = CommandRunner::new(config)?;
    let calls = runner.translate(command)?;
    let settings = config.node_settings()?;

    info!("Connecting node");
    let node = Arc::new(NodeConnection::connect(&settings).await?);

    let result = runner
        .dispatch(Arc::clone(&node), command, calls, out, err)
        .await;

    // 无论成功与否都释放本地节点身份
    node.disconnect().await;
    result
}

/// 执行一条命令：翻译、分发、输出
///
/// 翻译（`translate`）不需要节点，调用方应在建立会话之前完成，
/// 参数错误因此不会触发任何网络活动。
pub struct CommandRunner {
    registry: CommandRegistry,
    target: NodeName,
    timeout: Option<Duration>,
    config: ClientConfig,
}

impl CommandRunner {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            registry: CommandRegistry::new(),
            target: config.node.remote.parse()?,
            timeout: config.call_timeout(),
            config: config.clone(),
        })
    }

    pub fn translate(&self, command: &Command) -> Result<Vec<RemoteCall>> {
        command.to_remote_calls(&self.registry, &self.target)
    }

    /// 分发已翻译的调用，把回复逐行写到 `out`，单个调用的失败写到 `err`
    pub async fn dispatch<N, W, E>(
        &self,
        node: Arc<N>,
        command: &Command,
        calls: Vec<RemoteCall>,
        out: &mut W,
        err: &mut E,
    ) -> Result<()>
    where
        N: RpcNode,
        W: Write,
        E: Write,
    {
        let dispatcher = Dispatcher::new(node, self.timeout);

        if !command.is_batch() {
            let call = calls.into_iter().next().ok_or_else(|| {
                ClientError::Parse(format!("'{}' produced no remote call", command.action()))
            })?;

            let value = match dispatcher.send_sync(&call).await {
                Ok(value) => value,
                Err(e) => {
                    error!("{} failed: {}", call, e);
                    return Err(e);
                }
            };
            writeln!(out, "{}", OutputFormatter::format_response(&value))?;
            out.flush()?;
            return Ok(());
        }

        let total = calls.len();
        let deadline = self.config.batch_deadline(total);
        info!(
            "Waiting for messages. Timeout between messages: {:?}, batch deadline: {:?}",
            self.timeout, deadline
        );

        let mut pending = dispatcher.send_async(calls, deadline);
        let mut failed = 0;
        while let Some(next) = pending.next().await {
            let outcome = match next {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Batch aborted: {}", e);
                    return Err(e);
                }
            };

            match outcome.result {
                Ok(value) => {
                    writeln!(out, "{}", OutputFormatter::format_response(&value))?;
                    out.flush()?;
                }
                Err(e) => {
                    failed += 1;
                    error!(index = outcome.index, "{} failed: {}", outcome.call, e);
                    writeln!(err, "{}", OutputFormatter::format_call_failure(&outcome.call, &e))?;
                }
            }
        }

        if failed > 0 {
            return Err(ClientError::BatchFailed { failed, total });
        }
        Ok(())
    }
}
