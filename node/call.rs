use std::fmt;

use crate::node::NodeName;
use crate::protocol::Term;

/// 一次远程过程调用：`node` 上的 `module:function(args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub node: NodeName,
    pub module: String,
    pub function: String,
    pub args: Vec<Term>,
}

impl RemoteCall {
    pub fn new(node: NodeName, module: &str, function: &str, args: Vec<Term>) -> Self {
        Self {
            node,
            module: module.to_string(),
            function: function.to_string(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}(", self.module, self.function)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ") on {}", self.node)
    }
}
