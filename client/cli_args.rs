use clap::{Parser, Subcommand};

use crate::commands::Command;
use crate::config::ClientConfig;
use crate::logging::Verbosity;

#[derive(Parser, Debug)]
#[command(
    name = "erlrtree-client",
    version,
    about = "ErlRTree client.",
    long_about = "erlrtree-client connects to a remote ErlRTree node and issues create, load, build and intersects calls.\nOptions override the configuration file and ERLRTREE__ environment variables."
)]
pub struct CliArgs {
    /// Enable debugging. Default warning.
    #[arg(short = 'v', long = "verbose", value_enum)]
    pub verbose: Option<Verbosity>,

    /// Set the local node's <name|sname>. Default py_rtree.
    #[arg(short = 'n', long = "node-name", visible_alias = "python_node_name")]
    pub node_name: Option<String>,

    /// Set cookie. Default rtree.
    #[arg(short = 'c', long = "cookie")]
    pub cookie: Option<String>,

    /// Node <name|sname> to connect to. Default rtree@127.0.0.1.
    #[arg(long = "remote-node", visible_alias = "remote_node")]
    pub remote_node: Option<String>,

    /// Node gateway port on the remote host. Default 4370.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Timeout for response in seconds. `0` disables the timeout. Default 10.
    #[arg(short = 't', long = "timeout")]
    pub timeout: Option<u64>,

    /// Overall deadline for batched queries in seconds. Default timeout x number of calls, `0` disables it.
    #[arg(long = "batch-deadline")]
    pub batch_deadline: Option<u64>,

    /// Configuration file
    #[arg(long = "config", default_value = "erlrtree.toml")]
    pub config: String,

    /// Write the effective configuration to the configuration file and exit
    #[arg(long)]
    pub generate_config: bool,

    #[command(subcommand)]
    pub action: Option<Action>,
}

/// ErlRTree actions.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Action {
    /// Create an rtree server.
    Create {
        /// Server name of tree to query.
        tree_name: String,
    },

    /// Load a datasource.
    Load {
        /// Server name of tree to query.
        tree_name: String,

        /// OGR Data Source Name to load.
        #[arg(value_name = "DSN")]
        dsn: String,
    },

    /// Build STRTree from loaded DSNs.
    Build {
        /// Server name of tree to query.
        tree_name: String,

        /// Filter to apply on elements before creating tree.
        filter: Option<String>,
    },

    /// Query for intersects.
    Intersects {
        /// Server name of tree to query.
        tree_name: String,

        /// Point 'X,Y' (Longitude,Latitude) to intersect with RTree.
        #[arg(
            value_name = "X,Y",
            required = true,
            num_args = 1..,
            allow_hyphen_values = true
        )]
        points: Vec<String>,
    },

    #[command(external_subcommand)]
    Other(Vec<String>),
}

impl Action {
    /// 未识别的动作返回 `None`
    pub fn into_command(self) -> Option<Command> {
        match self {
            Action::Create { tree_name } => Some(Command::Create { tree_name }),
            Action::Load { tree_name, dsn } => Some(Command::Load { tree_name, dsn }),
            Action::Build { tree_name, filter } => Some(Command::Build { tree_name, filter }),
            Action::Intersects { tree_name, points } => {
                Some(Command::Intersects { tree_name, points })
            }
            Action::Other(_) => None,
        }
    }
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.generate_config && self.action.is_none() {
            return Err("No action specified. Use one of: create, load, build, intersects.".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be greater than 0".to_string());
        }

        Ok(())
    }

    /// 命令行参数覆盖配置
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(verbose) = self.verbose {
            config.logging.level = verbose.as_str().to_string();
        }
        if let Some(name) = &self.node_name {
            config.node.name = name.clone();
        }
        if let Some(cookie) = &self.cookie {
            config.node.cookie = cookie.clone();
        }
        if let Some(remote) = &self.remote_node {
            config.node.remote = remote.clone();
        }
        if let Some(port) = self.port {
            config.node.port = port;
        }
        if let Some(timeout) = self.timeout {
            config.node.timeout = timeout;
        }
        if let Some(deadline) = self.batch_deadline {
            config.node.batch_deadline = Some(deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_global_options_override_config() {
        let args = parse(&[
            "erlrtree-client",
            "-v",
            "debug",
            "--python_node_name",
            "gis_client",
            "-c",
            "secret",
            "--remote_node",
            "tree@10.0.0.7",
            "-t",
            "0",
            "create",
            "mytree",
        ]);

        let mut config = ClientConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.node.name, "gis_client");
        assert_eq!(config.node.cookie, "secret");
        assert_eq!(config.node.remote, "tree@10.0.0.7");
        assert_eq!(config.node.timeout, 0);
        assert_eq!(config.node.port, 4370);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_actions() {
        let args = parse(&["erlrtree-client", "load", "mytree", "roads.shp"]);
        assert_eq!(
            args.action.unwrap().into_command(),
            Some(Command::Load {
                tree_name: "mytree".to_string(),
                dsn: "roads.shp".to_string(),
            })
        );

        let args = parse(&["erlrtree-client", "build", "mytree"]);
        assert_eq!(
            args.action.unwrap().into_command(),
            Some(Command::Build {
                tree_name: "mytree".to_string(),
                filter: None,
            })
        );
    }

    #[test]
    fn test_intersects_accepts_negative_points() {
        let args = parse(&[
            "erlrtree-client",
            "intersects",
            "mytree",
            "10.0,20.0",
            "-73.98,40.75",
        ]);
        match args.action {
            Some(Action::Intersects { tree_name, points }) => {
                assert_eq!(tree_name, "mytree");
                assert_eq!(points, vec!["10.0,20.0", "-73.98,40.75"]);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_intersects_requires_points() {
        assert!(CliArgs::try_parse_from(["erlrtree-client", "intersects", "mytree"]).is_err());
    }

    #[test]
    fn test_unknown_action() {
        let args = parse(&["erlrtree-client", "delete", "mytree"]);
        let action = args.action.clone().unwrap();
        assert_eq!(
            action,
            Action::Other(vec!["delete".to_string(), "mytree".to_string()])
        );
        assert_eq!(action.into_command(), None);
    }

    #[test]
    fn test_validate() {
        let args = parse(&["erlrtree-client"]);
        assert!(args.validate().is_err());

        let args = parse(&["erlrtree-client", "--generate-config"]);
        assert!(args.validate().is_ok());

        let args = parse(&["erlrtree-client", "-p", "0", "create", "t"]);
        assert!(args.validate().is_err());
    }
}
