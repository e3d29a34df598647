use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use notebook_pipeline::models::{FileDescriptor, SourceKind};
use notebook_pipeline::utils::logging::{self, log_state};
use notebook_pipeline::{App, Config, HostMode};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "notebook-pipeline", version, about = "把文档或链接生成为带多种产物的笔记本")]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 以 URL / YouTube / 文本启动新任务
    Start {
        source: String,
        #[arg(long, value_enum, default_value_t = KindArg::Url)]
        kind: KindArg,
        /// 在前台等待直到任务结束
        #[arg(long)]
        wait: bool,
    },
    /// 以本地文件启动新任务
    StartFile {
        path: PathBuf,
        #[arg(long)]
        mime: Option<String>,
        #[arg(long)]
        wait: bool,
    },
    /// 执行一次 tick（供 cron 等外部定时器调用）
    Tick,
    /// 进程内定时唤醒，直到任务结束
    Run,
    /// 查看当前状态
    State,
    /// 重置为空闲状态
    Reset,
    /// 中止正在运行的任务
    Abort,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Url,
    Youtube,
    Text,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Url => SourceKind::Url,
            KindArg::Youtube => SourceKind::Youtube,
            KindArg::Text => SourceKind::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(cli.verbose || config.verbose_logging);
    logging::log_startup(&config);

    let mode = match cli.command {
        Command::Run => HostMode::Interval,
        _ => HostMode::External,
    };
    let mut app = App::initialize(config, mode).await?;

    let state = match cli.command {
        Command::Start { source, kind, wait } => {
            let state = app.pipeline().start_pipeline(&source, kind.into()).await?;
            if wait {
                app.wait_in_foreground().await?
            } else {
                info!("💡 之后请定时执行 `notebook-pipeline tick`，或运行 `notebook-pipeline run`");
                state
            }
        }
        Command::StartFile { path, mime, wait } => {
            let size = tokio::fs::metadata(&path).await?.len();
            let file = FileDescriptor::from_path(path, mime, Some(size));
            let state = app.pipeline().start_pipeline_from_file(file).await?;
            if wait {
                app.wait_in_foreground().await?
            } else {
                state
            }
        }
        Command::Tick => app.pipeline().tick().await?,
        Command::Run => app.run_daemon().await?,
        Command::State => app.pipeline().get_state().await?,
        Command::Reset => app.pipeline().reset_state().await?,
        Command::Abort => app.pipeline().abort_pipeline().await?,
    };

    log_state(&state);
    if let Some(message) = &state.error {
        error!("❌ {}", message);
    }

    Ok(())
}
