/// 请求帧编码
///
/// 客户端发往网关的每个请求（HELLO / CALL / QUIT）都是由 bulk string 组成的数组。
pub struct RespEncoder;

impl RespEncoder {
    /// 构建由 bulk string 组成的命令帧
    pub fn command(parts: &[&str]) -> String {
        let mut result = format!("*{}\r\n", parts.len());
        for part in parts {
            // 长度按字节计
            result.push_str(&format!("${}\r\n{}\r\n", part.len(), part));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command() {
        assert_eq!(RespEncoder::command(&["QUIT"]), "*1\r\n$4\r\nQUIT\r\n");
        assert_eq!(
            RespEncoder::command(&["HELLO", "py_rtree@127.0.0.1", "rtree"]),
            "*3\r\n$5\r\nHELLO\r\n$18\r\npy_rtree@127.0.0.1\r\n$5\r\nrtree\r\n"
        );
    }

    #[test]
    fn test_multibyte_length_counts_bytes() {
        assert_eq!(RespEncoder::command(&["é"]), "*1\r\n$2\r\né\r\n");
    }
}
