pub mod args;
pub mod registry;

use crate::error::ClientError;
use crate::node::{NodeName, RemoteCall};
use crate::protocol::Term;
use crate::Result;

pub use args::ArgumentParser;
pub use registry::{CommandRegistry, RemoteFunction, TREE_SERVER_MODULE};

/// 解析后的客户端命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create {
        tree_name: String,
    },
    Load {
        tree_name: String,
        dsn: String,
    },
    Build {
        tree_name: String,
        filter: Option<String>,
    },
    Intersects {
        tree_name: String,
        points: Vec<String>,
    },
}

impl Command {
    pub fn action(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Load { .. } => "load",
            Command::Build { .. } => "build",
            Command::Intersects { .. } => "intersects",
        }
    }

    pub fn tree_name(&self) -> &str {
        match self {
            Command::Create { tree_name }
            | Command::Load { tree_name, .. }
            | Command::Build { tree_name, .. }
            | Command::Intersects { tree_name, .. } => tree_name,
        }
    }

    /// 是否以并发批量方式分发
    pub fn is_batch(&self) -> bool {
        matches!(self, Command::Intersects { .. })
    }

    /// 把命令翻译成发往 `target` 的远程调用
    ///
    /// 只构造描述，不做任何网络操作。`intersects` 的所有点先全部解析，
    /// 任何一个点非法都会返回错误且不产生调用。
    pub fn to_remote_calls(
        &self,
        registry: &CommandRegistry,
        target: &NodeName,
    ) -> Result<Vec<RemoteCall>> {
        let function = registry.lookup(self.action()).ok_or_else(|| {
            ClientError::Parse(format!("no remote function registered for '{}'", self.action()))
        })?;
        let parser = ArgumentParser::new(function.action);
        let tree = parser.tree_name(self.tree_name())?;

        let call = |args: Vec<Term>| {
            RemoteCall::new(target.clone(), function.module, function.function, args)
        };

        match self {
            Command::Create { .. } => Ok(vec![call(vec![tree])]),
            Command::Load { dsn, .. } => Ok(vec![call(vec![tree, Term::string(dsn.as_str())])]),
            Command::Build { filter, .. } => {
                let mut args = vec![tree];
                if let Some(filter) = filter {
                    args.push(Term::string(filter.as_str()));
                }
                Ok(vec![call(args)])
            }
            Command::Intersects { points, .. } => {
                if points.is_empty() {
                    return Err(ClientError::Parse(
                        "intersects requires at least one point".to_string(),
                    ));
                }

                let coordinates = points
                    .iter()
                    .map(|raw| -> Result<(Term, Term)> {
                        let point = parser.point(raw)?;
                        Ok((Term::float(point.x())?, Term::float(point.y())?))
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(coordinates
                    .into_iter()
                    .map(|(x, y)| call(vec![tree.clone(), x, y]))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> NodeName {
        "rtree@127.0.0.1".parse().unwrap()
    }

    fn translate(command: &Command) -> Result<Vec<RemoteCall>> {
        command.to_remote_calls(&CommandRegistry::new(), &target())
    }

    #[test]
    fn test_create_and_load() {
        let calls = translate(&Command::Create {
            tree_name: "mytree".to_string(),
        })
        .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].module, "rtree_server");
        assert_eq!(calls[0].function, "create");
        assert_eq!(calls[0].args, vec![Term::atom("mytree")]);

        let calls = translate(&Command::Load {
            tree_name: "mytree".to_string(),
            dsn: "PG:dbname=gis".to_string(),
        })
        .unwrap();
        assert_eq!(calls[0].function, "load");
        assert_eq!(
            calls[0].args,
            vec![Term::atom("mytree"), Term::string("PG:dbname=gis")]
        );
    }

    #[test]
    fn test_build_filter_is_optional() {
        let calls = translate(&Command::Build {
            tree_name: "mytree".to_string(),
            filter: None,
        })
        .unwrap();
        assert_eq!(calls[0].function, "tree");
        assert_eq!(calls[0].arity(), 1);

        let calls = translate(&Command::Build {
            tree_name: "mytree".to_string(),
            filter: Some("population > 1000".to_string()),
        })
        .unwrap();
        assert_eq!(calls[0].arity(), 2);
        assert_eq!(calls[0].args[1], Term::string("population > 1000"));
    }

    #[test]
    fn test_intersects_one_call_per_point() {
        let points = ["10.0,20.0", "30.5,-40.25", "-0.001,89.999"];
        let calls = translate(&Command::Intersects {
            tree_name: "mytree".to_string(),
            points: points.iter().map(|p| p.to_string()).collect(),
        })
        .unwrap();

        assert_eq!(calls.len(), points.len());
        for (call, raw) in calls.iter().zip(points) {
            let (x, y) = raw.split_once(',').unwrap();
            assert_eq!(call.function, "intersects");
            assert_eq!(call.node, target());
            assert_eq!(call.args[0], Term::atom("mytree"));
            assert_eq!(call.args[1].as_float(), Some(x.parse::<f64>().unwrap()));
            assert_eq!(call.args[2].as_float(), Some(y.parse::<f64>().unwrap()));
        }
    }

    #[test]
    fn test_malformed_point_issues_no_calls() {
        let result = translate(&Command::Intersects {
            tree_name: "mytree".to_string(),
            points: vec!["10.0,20.0".to_string(), "30.0".to_string()],
        });
        assert!(matches!(result, Err(ClientError::Parse(_))));

        let result = translate(&Command::Intersects {
            tree_name: "mytree".to_string(),
            points: Vec::new(),
        });
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        for raw in ["NaN,1", "1,inf", "-inf,0"] {
            let result = translate(&Command::Intersects {
                tree_name: "mytree".to_string(),
                points: vec!["10.0,20.0".to_string(), raw.to_string()],
            });
            assert!(
                matches!(result, Err(ClientError::Parse(_))),
                "expected parse error for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_empty_tree_name_rejected() {
        let result = translate(&Command::Create {
            tree_name: String::new(),
        });
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_command_metadata() {
        let command = Command::Intersects {
            tree_name: "roads".to_string(),
            points: vec!["1,2".to_string()],
        };
        assert_eq!(command.action(), "intersects");
        assert_eq!(command.tree_name(), "roads");
        assert!(command.is_batch());
        assert!(!Command::Create {
            tree_name: "roads".to_string()
        }
        .is_batch());
    }
}
