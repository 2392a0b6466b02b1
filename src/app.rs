use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, FileError};
use crate::models::{ResearchInput, ResearchResult};
use crate::orchestrator::generate_dossier;
use crate::services::LlmBackend;
use crate::utils::logging::{log_final_stats, log_startup};
use crate::workflow::ResearchFlow;

/// 没有生成报告时的输出
pub const FALLBACK_REPORT: &str = "# No dossier generated\n\nEither no data was found or no LLM API key is configured.";

const RESULT_SLOTS: usize = 4;

/// 命令行选项（与调研输入无关的部分）
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// 输出原始 JSON，不调用 LLM
    pub json: bool,
    /// 输出文件路径，None 时写到 stdout
    pub output: Option<PathBuf>,
    pub llm: LlmBackend,
}

/// 应用主结构
pub struct App {
    config: Config,
    flow: ResearchFlow,
    options: AppOptions,
}

impl App {
    /// 初始化应用
    ///
    /// 数据源凭证缺失时在这里失败，不会提交任何任务。
    pub fn initialize(config: Config, options: AppOptions) -> Result<Self> {
        let flow = ResearchFlow::from_config(&config).map_err(AppError::from)?;
        Ok(Self {
            config,
            flow,
            options,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self, input: &ResearchInput) -> Result<()> {
        let subject = input.subject_label();
        log_startup(&subject, self.options.llm.as_str());

        // 收集数据
        let result = self.flow.run(input).await;

        // 生成输出
        let output = if self.options.json {
            render_json(&result)?
        } else {
            let dossier =
                generate_dossier(&self.config, self.options.llm, input, &result).await;
            render_report(&subject, dossier.as_deref())
        };

        // 写出
        let destination = match &self.options.output {
            Some(path) => {
                write_output(path, &output)?;
                info!("💾 已保存至: {}", path.display());
                path.display().to_string()
            }
            None => {
                println!("\n{}", output);
                "stdout".to_string()
            }
        };

        log_final_stats(result.filled_count(), RESULT_SLOTS, &destination);
        Ok(())
    }
}

/// `--json` 模式的输出
fn render_json(result: &ResearchResult) -> Result<String> {
    serde_json::to_string_pretty(&result.to_raw_json()).context("序列化调研结果失败")
}

/// 报告模式的输出：报告前加标题与生成时间，没有报告时输出兜底文本
fn render_report(subject: &str, dossier: Option<&str>) -> String {
    match dossier {
        Some(dossier) => format!(
            "# Dossier: {}\n\n_Generated {}_\n\n---\n\n{}\n",
            subject,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            dossier
        ),
        None => FALLBACK_REPORT.to_string(),
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|source| {
        AppError::from(FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
    })?;
    Ok(())
}
