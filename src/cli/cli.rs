use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hostd - 进程与硬件 FRU 健康监控守护进程
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// 存储连接与守护进程配置
    #[arg(short, long, env = "HOSTD_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// 被跟踪的进程列表
    #[arg(long, env = "HOSTD_PROCESSES", default_value = "processes.json")]
    pub processes: PathBuf,

    /// 监听端口
    #[arg(short, long, env = "PORT", default_value_t = 9999)]
    pub port: u16,

    /// 监听地址
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "0.0.0.0")]
    pub address: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 运行守护进程（默认）
    Run,
    /// 查询一次所有 FRU 的状态后退出
    Hardware,
}

impl CommandArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}
