use colored::*;

use crate::error::ClientError;
use crate::node::RemoteCall;
use crate::protocol::Term;

pub struct OutputFormatter;

impl OutputFormatter {
    /// 每个收到的回复输出一行，不做任何转换
    pub fn format_response(value: &Term) -> String {
        format!("RESPONSE {}", value)
    }

    pub fn format_error(err: &ClientError) -> String {
        format!("{} {}", "error:".red().bold(), err)
    }

    pub fn format_call_failure(call: &RemoteCall, err: &ClientError) -> String {
        format!("{} {} failed: {}", "error:".red().bold(), call, err)
    }

    pub fn format_unknown_action() -> String {
        "Action not understood.".to_string()
    }

    pub fn format_generated_config(path: &str) -> String {
        format!("Generated default configuration: {}", path.green())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_response() {
        let value = Term::Tuple(vec![
            Term::atom("ok"),
            Term::List(vec![Term::string("feature-17")]),
        ]);
        assert_eq!(
            OutputFormatter::format_response(&value),
            "RESPONSE {ok,[\"feature-17\"]}"
        );
    }

    #[test]
    fn test_format_error() {
        let err = ClientError::Remote("badrpc nodedown".to_string());
        let result = OutputFormatter::format_error(&err);
        // 不检查颜色代码，只检查内容
        assert!(result.contains("error:"));
        assert!(result.contains("badrpc nodedown"));
    }

    #[test]
    fn test_format_call_failure() {
        let call = RemoteCall::new(
            "rtree@127.0.0.1".parse().unwrap(),
            "rtree_server",
            "intersects",
            vec![Term::atom("mytree"), Term::Float(1.0), Term::Float(2.0)],
        );
        let err = ClientError::Timeout {
            timeout: std::time::Duration::from_secs(10),
        };
        let result = OutputFormatter::format_call_failure(&call, &err);
        assert!(result.contains("rtree_server:intersects(mytree, 1.0, 2.0)"));
        assert!(result.contains("no response within 10s"));
    }
}
