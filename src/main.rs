//! 课程门禁码工作流 - 主程序入口

use anyhow::Context;
use clap::{Parser, Subcommand};
use class_access_workflow::{
    config::{AppConfig, Secrets},
    mail::{EmailTemplate, GraphMailer},
    services::{IssuerService, NotifierService},
    types::{CleanupOutcome, IssueOutcome, WorkflowOutcome},
    vendor::SeamClient,
    workflow::{default_picker, FilePicker, PresetPicker, WorkflowOptions, WorkflowRunner},
};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "access_workflow")]
#[command(version, about = "为课程学员签发门禁码并发送通知邮件")]
struct Cli {
    /// 配置文件路径（可不存在）
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 为名单中的学员签发门禁码
    Issue {
        /// 学员名单CSV
        input: PathBuf,
    },
    /// 根据中间文件发送通知邮件
    Notify,
    /// 运行完整工作流：选择文件、签发、发送
    Run {
        /// 学员名单CSV，省略时弹出文件选择
        #[arg(long)]
        input: Option<PathBuf>,

        /// 完成后删除中间文件
        #[arg(long)]
        cleanup: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // 先加载 .env，再初始化日志，RUST_LOG 也可以写在 .env 中
    let dotenv = dotenvy::dotenv();
    init_logger();
    if let Ok(path) = dotenv {
        log::debug!("已加载环境文件: {}", path.display());
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    log::info!("🚀 课程门禁码工作流启动");

    let config = AppConfig::load(&cli.config, Secrets::from_env())
        .with_context(|| format!("无法加载配置 {}", cli.config.display()))?;

    match cli.command {
        Command::Issue { input } => {
            config.validate_for_issuer()?;
            let vendor = SeamClient::new(&config.seam)?;
            let outcome = IssuerService::new(&vendor, &config)?
                .issue_codes(&input)
                .await?;
            log_issue_outcome(&outcome);
        }
        Command::Notify => {
            config.validate_for_mail()?;
            let template = EmailTemplate::load(&config.mail.template_path)?;
            let mailer = GraphMailer::new(&config.graph, &config.mail.from_address);
            let report = NotifierService::new(&mailer, template, &config.mail)
                .send_notifications(&config.files.grants_path)
                .await?;
            if report.failed() > 0 {
                log::warn!("⚠️ {} 封邮件发送失败", report.failed());
            }
        }
        Command::Run { input, cleanup } => {
            // 任何配置问题都在签发门禁码之前暴露
            config.validate()?;
            let template = EmailTemplate::load(&config.mail.template_path)?;
            let vendor = SeamClient::new(&config.seam)?;
            let mailer = GraphMailer::new(&config.graph, &config.mail.from_address);

            let picker: Box<dyn FilePicker> = match input {
                Some(path) => Box::new(PresetPicker(Some(path))),
                None => default_picker(),
            };

            let runner = WorkflowRunner::new(
                &config,
                &vendor,
                &mailer,
                template,
                WorkflowOptions { cleanup },
            );
            let outcome = runner.run(picker.as_ref()).await?;
            log_workflow_outcome(&outcome);
        }
    }

    Ok(())
}

/// 初始化日志记录器
fn init_logger() {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&log_level))
        .format_timestamp_secs()
        .init();

    log::debug!("📝 日志级别: {}", log_level);
}

fn log_issue_outcome(outcome: &IssueOutcome) {
    match outcome {
        IssueOutcome::NoDevice => log::warn!("⚠️ 未签发任何门禁码"),
        IssueOutcome::Issued {
            device_id,
            grants,
            output,
        } => log::info!(
            "🎯 已在门锁 {} 上签发 {} 个门禁码，结果保存在 {}",
            device_id,
            grants.len(),
            output.display()
        ),
    }
}

fn log_workflow_outcome(outcome: &WorkflowOutcome) {
    match outcome {
        WorkflowOutcome::Cancelled => log::info!("👋 工作流已取消"),
        WorkflowOutcome::Completed {
            issued,
            notifications,
            cleanup,
        } => {
            log_issue_outcome(issued);
            log::info!(
                "📊 邮件: 成功 {} 封，失败 {} 封",
                notifications.sent,
                notifications.failed()
            );
            match cleanup {
                CleanupOutcome::Skipped => {}
                CleanupOutcome::Deleted => log::info!("🧹 中间文件已清理"),
                CleanupOutcome::Missing => log::info!("🧹 中间文件不存在，无需清理"),
                CleanupOutcome::Failed(reason) => log::warn!("⚠️ 中间文件清理失败: {}", reason),
            }
            log::info!("👋 工作流完成");
        }
    }
}
