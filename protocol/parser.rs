use crate::error::ClientError;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<String>),
    Array(Option<Vec<RespValue>>),
}

/// 单个 bulk string 的最大长度（RESP 的上限）
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// 数组的最大嵌套层数
pub const MAX_DEPTH: usize = 32;

/// 增量式 RESP 帧解析器
///
/// 网关的回复按 TCP 流到达，一次读取可能只包含半个帧，也可能包含多个帧。
/// `parse_frame` 在数据不足时返回 `Ok(None)`，调用方继续读取后重试；
/// 成功时返回解析出的值以及该帧占用的字节数。
/// 超过 `MAX_BULK_LEN` 的长度或超过 `MAX_DEPTH` 的嵌套直接判为协议错误。
pub struct RespParser;

impl Default for RespParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RespParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析缓冲区开头的一个完整帧
    pub fn parse_frame(&self, input: &[u8]) -> Result<Option<(RespValue, usize)>> {
        self.parse_value(input, 0, 0)
    }

    fn parse_value(
        &self,
        input: &[u8],
        start: usize,
        depth: usize,
    ) -> Result<Option<(RespValue, usize)>> {
        let line_end = match find_crlf(input, start) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        if line_end == start {
            return Err(ClientError::Protocol("empty line".to_string()));
        }

        let kind = input[start];
        let content = std::str::from_utf8(&input[start + 1..line_end])
            .map_err(|e| ClientError::Protocol(format!("invalid UTF-8 in frame header: {}", e)))?;
        let next = line_end + 2;

        match kind {
            b'+' => Ok(Some((RespValue::SimpleString(content.to_string()), next))),
            b'-' => Ok(Some((RespValue::Error(content.to_string()), next))),
            b':' => {
                let num = parse_length(content)?;
                Ok(Some((RespValue::Integer(num), next)))
            }
            b'$' => {
                let len = parse_length(content)?;
                if len == -1 {
                    return Ok(Some((RespValue::BulkString(None), next)));
                }
                if len < 0 {
                    return Err(ClientError::Protocol(format!(
                        "invalid bulk string length: {}",
                        len
                    )));
                }
                if len as u64 > MAX_BULK_LEN as u64 {
                    return Err(ClientError::Protocol(format!(
                        "bulk string length {} exceeds {} bytes",
                        len, MAX_BULK_LEN
                    )));
                }

                let end = next + len as usize;
                if input.len() < end + 2 {
                    return Ok(None);
                }
                if &input[end..end + 2] != b"\r\n" {
                    return Err(ClientError::Protocol(
                        "bulk string is not terminated by CRLF".to_string(),
                    ));
                }

                let s = String::from_utf8(input[next..end].to_vec())
                    .map_err(|e| ClientError::Protocol(format!("invalid UTF-8 in bulk string: {}", e)))?;
                Ok(Some((RespValue::BulkString(Some(s)), end + 2)))
            }
            b'*' => {
                let len = parse_length(content)?;
                if len == -1 {
                    return Ok(Some((RespValue::Array(None), next)));
                }
                if len < 0 {
                    return Err(ClientError::Protocol(format!("invalid array length: {}", len)));
                }
                if depth >= MAX_DEPTH {
                    return Err(ClientError::Protocol(format!(
                        "arrays nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                }

                // 长度来自对端，预分配设上限
                let mut items = Vec::with_capacity((len as usize).min(64));
                let mut pos = next;
                for _ in 0..len {
                    match self.parse_value(input, pos, depth + 1)? {
                        Some((value, consumed)) => {
                            items.push(value);
                            pos = consumed;
                        }
                        None => return Ok(None),
                    }
                }
                Ok(Some((RespValue::Array(Some(items)), pos)))
            }
            other => Err(ClientError::Protocol(format!(
                "unknown RESP type: {}",
                other as char
            ))),
        }
    }
}

fn find_crlf(input: &[u8], start: usize) -> Option<usize> {
    input[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|pos| start + pos)
}

fn parse_length(content: &str) -> Result<i64> {
    content
        .parse::<i64>()
        .map_err(|e| ClientError::Protocol(format!("invalid integer '{}': {}", content, e)))
}
