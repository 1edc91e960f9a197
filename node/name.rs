use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::Result;

const DEFAULT_HOST: &str = "127.0.0.1";

/// 分布式节点名 `name@host`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName {
    name: String,
    host: String,
}

impl NodeName {
    pub fn new(name: &str, host: &str) -> Result<Self> {
        if name.is_empty() || host.is_empty() {
            return Err(ClientError::Parse(format!(
                "invalid node name '{}@{}': name and host must not be empty",
                name, host
            )));
        }
        if name.contains(char::is_whitespace) || host.contains(char::is_whitespace) {
            return Err(ClientError::Parse(format!(
                "invalid node name '{}@{}': whitespace is not allowed",
                name, host
            )));
        }
        Ok(Self {
            name: name.to_string(),
            host: host.to_string(),
        })
    }

    /// 解析本地节点名，没有 `@host` 时视为本机短名
    pub fn local(raw: &str) -> Result<Self> {
        match raw.split_once('@') {
            Some(_) => raw.parse(),
            None => Self::new(raw, DEFAULT_HOST),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl FromStr for NodeName {
    type Err = ClientError;

    /// 远端节点名必须完整，主机部分用于定位网关
    fn from_str(raw: &str) -> Result<Self> {
        match raw.split_once('@') {
            Some((name, host)) if !host.contains('@') => Self::new(name, host),
            _ => Err(ClientError::Parse(format!(
                "invalid node name '{}': expected <name>@<host>",
                raw
            ))),
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.host)
    }
}
