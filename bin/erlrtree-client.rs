use std::process::ExitCode;

use clap::CommandFactory;
use colored::*;
use tracing::instrument::WithSubscriber;

use erlrtree::client::run_action;
use erlrtree::{logging, CliArgs, ClientConfig, OutputFormatter};

fn main() -> ExitCode {
    let args = CliArgs::parse_args();

    // 验证参数
    if let Err(e) = args.validate() {
        eprintln!("{} {}", "Error:".red(), e);
        return ExitCode::FAILURE;
    }

    // 加载配置，命令行参数覆盖配置文件
    let mut config = match ClientConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", OutputFormatter::format_error(&e));
            return ExitCode::FAILURE;
        }
    };
    args.apply_to(&mut config);

    if let Err(e) = config.validate() {
        eprintln!("{} {}", "Error:".red(), e);
        return ExitCode::FAILURE;
    }

    // 生成默认配置文件
    if args.generate_config {
        return match config.save_to_file(&args.config) {
            Ok(()) => {
                println!("{}", OutputFormatter::format_generated_config(&args.config));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", OutputFormatter::format_error(&e));
                ExitCode::FAILURE
            }
        };
    }

    let Some(action) = args.action else {
        let _ = CliArgs::command().print_help();
        return ExitCode::FAILURE;
    };

    // 日志只作用于这一次命令执行
    let dispatch = match logging::build_dispatch(&config.logging) {
        Ok(dispatch) => dispatch,
        Err(e) => {
            eprintln!("{}", OutputFormatter::format_error(&e));
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} failed to start runtime: {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let status = runtime.block_on(
        run_action(&config, action, &mut stdout, &mut stderr).with_subscriber(dispatch),
    );
    ExitCode::from(status)
}
