use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ClientError;
use crate::logging::Verbosity;
use crate::node::{NodeName, NodeSettings};

/// 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 节点会话配置
    pub node: NodeConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

/// 节点会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// 本地节点名
    #[serde(default = "default_node_name")]
    pub name: String,

    /// 共享 cookie
    #[serde(default = "default_cookie")]
    pub cookie: String,

    /// 远端节点 `name@host`
    #[serde(default = "default_remote")]
    pub remote: String,

    /// 网关端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 单次调用超时（秒），0 表示不限
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// 批量查询总时限（秒），0 表示不限
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_deadline: Option<u64>,

    /// 记录收发的每一个帧
    #[serde(default)]
    pub debug: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别：debug, info, warning, error, critical
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 日志输出：stderr, stdout, file
    #[serde(default = "default_log_output")]
    pub output: String,

    /// 日志文件路径（当 output = file 时）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

// ============================================================================
// 默认值函数
// ============================================================================

fn default_node_name() -> String {
    "py_rtree".to_string()
}

fn default_cookie() -> String {
    "rtree".to_string()
}

fn default_remote() -> String {
    "rtree@127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4370
}

fn default_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_log_output() -> String {
    "stderr".to_string()
}

// ============================================================================
// 实现
// ============================================================================

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                name: default_node_name(),
                cookie: default_cookie(),
                remote: default_remote(),
                port: default_port(),
                timeout: default_timeout(),
                batch_deadline: None,
                debug: false,
            },
            logging: LoggingConfig {
                level: default_log_level(),
                output: default_log_output(),
                log_file: None,
            },
        }
    }
}

impl ClientConfig {
    /// 从文件加载配置
    ///
    /// 配置加载顺序（优先级从低到高）：
    /// 1. 默认配置（内嵌的 default.toml）
    /// 2. 用户配置文件（可选）
    /// 3. 环境变量（ERLRTREE__ 前缀，使用双下划线分隔嵌套）
    ///
    /// 命令行参数由调用方在此之后覆盖。
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use erlrtree::config::ClientConfig;
    ///
    /// let config = ClientConfig::from_file("erlrtree.toml").unwrap();
    /// ```
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ERLRTREE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to load config: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {}", e)))
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> Result<(), String> {
        if Verbosity::parse(&self.logging.level).is_none() {
            return Err(format!(
                "Invalid log level: '{}'. Must be one of: debug, info, warning, error, critical",
                self.logging.level
            ));
        }

        match self.logging.output.as_str() {
            "stderr" | "stdout" => {}
            "file" => {
                if self.logging.log_file.is_none() {
                    return Err(
                        "Log output is 'file' but log_file path is not specified".to_string()
                    );
                }
            }
            other => {
                return Err(format!(
                    "Invalid log output: '{}'. Must be one of: stderr, stdout, file",
                    other
                ))
            }
        }

        if self.node.cookie.is_empty() {
            return Err("Cookie must not be empty".to_string());
        }

        if self.node.port == 0 {
            return Err("Port must be greater than 0".to_string());
        }

        NodeName::local(&self.node.name).map_err(|e| e.to_string())?;
        self.node
            .remote
            .parse::<NodeName>()
            .map_err(|e| e.to_string())?;

        Ok(())
    }

    /// 单次调用超时，`None` 表示不限
    pub fn call_timeout(&self) -> Option<Duration> {
        match self.node.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// `calls` 个调用组成的批量查询的总时限
    ///
    /// 显式配置优先；否则为单次超时乘以调用数；任一为 0 则不限。
    pub fn batch_deadline(&self, calls: usize) -> Option<Duration> {
        match self.node.batch_deadline {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => self
                .call_timeout()
                .map(|timeout| {
                    let calls = u32::try_from(calls.max(1)).unwrap_or(u32::MAX);
                    timeout.saturating_mul(calls)
                }),
        }
    }

    /// 生成节点会话参数
    pub fn node_settings(&self) -> crate::Result<NodeSettings> {
        let verbose_debug = Verbosity::parse(&self.logging.level) == Some(Verbosity::Debug);
        Ok(NodeSettings {
            local: NodeName::local(&self.node.name)?,
            cookie: self.node.cookie.clone(),
            remote: self.node.remote.parse()?,
            port: self.node.port,
            connect_timeout: self.call_timeout(),
            debug: self.node.debug || verbose_debug,
        })
    }

    /// 打印配置摘要（debug 级别日志）
    pub fn log_summary(&self) {
        tracing::debug!(
            node = %self.node.name,
            remote = %self.node.remote,
            port = self.node.port,
            timeout = self.node.timeout,
            batch_deadline = ?self.node.batch_deadline,
            level = %self.logging.level,
            output = %self.logging.output,
            "Client configuration"
        );
    }
}
