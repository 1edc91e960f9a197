use std::sync::Mutex;

use tracing::{Dispatch, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;

use crate::config::LoggingConfig;
use crate::error::ClientError;
use crate::Result;

/// 命令行可选的日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Verbosity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Verbosity {
    pub fn parse(level: &str) -> Option<Self> {
        match level.to_lowercase().as_str() {
            "debug" => Some(Verbosity::Debug),
            "info" => Some(Verbosity::Info),
            "warning" => Some(Verbosity::Warning),
            "error" => Some(Verbosity::Error),
            "critical" => Some(Verbosity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Debug => "debug",
            Verbosity::Info => "info",
            Verbosity::Warning => "warning",
            Verbosity::Error => "error",
            Verbosity::Critical => "critical",
        }
    }

    /// tracing 没有 critical，归入 ERROR
    pub fn level(&self) -> Level {
        match self {
            Verbosity::Debug => Level::DEBUG,
            Verbosity::Info => Level::INFO,
            Verbosity::Warning => Level::WARN,
            Verbosity::Error | Verbosity::Critical => Level::ERROR,
        }
    }
}

/// 根据日志配置构建 dispatcher
///
/// 返回的 `Dispatch` 不会注册为全局默认值：调用方把它挂到命令的 future 上
/// （`WithSubscriber`），派生的任务再通过 `with_current_subscriber` 继承，
/// 日志的作用域因此与一次命令执行相同。
pub fn build_dispatch(config: &LoggingConfig) -> Result<Dispatch> {
    let verbosity = Verbosity::parse(&config.level).ok_or_else(|| {
        ClientError::Config(format!("Invalid log level: '{}'", config.level))
    })?;
    let filter = LevelFilter::from_level(verbosity.level());

    let dispatch = match config.output.as_str() {
        "stdout" => Dispatch::new(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
                .with(filter),
        ),
        "file" => {
            let log_file = config.log_file.as_ref().ok_or_else(|| {
                ClientError::Config(
                    "Log output is 'file' but log_file path is not specified".to_string(),
                )
            })?;

            // 确保日志目录存在
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;

            Dispatch::new(
                tracing_subscriber::registry()
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(Mutex::new(file))
                            .with_ansi(false),
                    )
                    .with(filter),
            )
        }
        _ => Dispatch::new(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(filter),
        ),
    };

    Ok(dispatch)
}
