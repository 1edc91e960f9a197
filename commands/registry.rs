use std::collections::HashMap;

/// 树服务所在的远端模块
pub const TREE_SERVER_MODULE: &str = "rtree_server";

/// 客户端动作对应的远端函数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFunction {
    pub action: &'static str,
    pub module: &'static str,
    pub function: &'static str,
}

/// 命令注册表，管理所有可用的动作
pub struct CommandRegistry {
    functions: HashMap<&'static str, RemoteFunction>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register(RemoteFunction {
            action: "create",
            module: TREE_SERVER_MODULE,
            function: "create",
        });
        registry.register(RemoteFunction {
            action: "load",
            module: TREE_SERVER_MODULE,
            function: "load",
        });
        // build 对应服务端的 tree 函数
        registry.register(RemoteFunction {
            action: "build",
            module: TREE_SERVER_MODULE,
            function: "tree",
        });
        registry.register(RemoteFunction {
            action: "intersects",
            module: TREE_SERVER_MODULE,
            function: "intersects",
        });

        registry
    }

    pub fn register(&mut self, function: RemoteFunction) {
        self.functions.insert(function.action, function);
    }

    pub fn lookup(&self, action: &str) -> Option<&RemoteFunction> {
        self.functions.get(action)
    }
}
