use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};

use deep_research::app::{App, AppOptions};
use deep_research::config::Config;
use deep_research::models::ResearchInput;
use deep_research::services::LlmBackend;
use deep_research::utils::logging;

/// 深度调研：从一个或多个身份标识出发，收集公开资料并生成人物报告
#[derive(Debug, Parser)]
#[command(name = "deep_research", version, about)]
#[command(group(
    ArgGroup::new("identifier")
        .required(true)
        .multiple(true)
        .args(["email", "linkedin", "twitter", "instagram"])
))]
struct Cli {
    /// 邮箱地址
    #[arg(long)]
    email: Option<String>,
    /// LinkedIn 主页 URL
    #[arg(long)]
    linkedin: Option<String>,
    /// Twitter/X 主页 URL
    #[arg(long)]
    twitter: Option<String>,
    /// Instagram 主页 URL
    #[arg(long)]
    instagram: Option<String>,
    /// 姓名（未提供时从画像中提取）
    #[arg(long)]
    name: Option<String>,
    /// 公司（未提供时从画像中提取）
    #[arg(long)]
    company: Option<String>,
    /// 输出文件路径
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 输出原始 JSON，不生成报告
    #[arg(long)]
    json: bool,
    /// 生成报告使用的 LLM
    #[arg(long, value_enum, default_value_t = LlmBackend::Auto)]
    llm: LlmBackend,
    /// 只输出警告与错误
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载 .env（不存在时忽略）
    dotenvy::dotenv().ok();

    // 初始化日志
    logging::init(cli.quiet, cli.verbose)?;

    // 加载配置
    let config = Config::from_env();

    let input = ResearchInput {
        email: cli.email,
        linkedin_url: cli.linkedin,
        twitter_url: cli.twitter,
        instagram_url: cli.instagram,
        name: cli.name,
        company: cli.company,
    };
    let options = AppOptions {
        json: cli.json,
        output: cli.output,
        llm: cli.llm,
    };

    // 初始化并运行应用
    App::initialize(config, options)
        .context("初始化失败")?
        .run(&input)
        .await?;

    Ok(())
}
