//! 报告生成流水线与程序化入口
//!
//! ```text
//! ResearchResult → 合并关注列表 → BatchAnalyzer → Synthesizer → 报告
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::clients::TextGenerator;
use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{merge_following, EnrichmentProfile, PersonContext, ResearchInput, ResearchResult};
use crate::orchestrator::batch_analyzer::BatchAnalyzer;
use crate::orchestrator::synthesizer::Synthesizer;
use crate::services::{LlmBackend, LlmService};
use crate::workflow::ResearchFlow;

/// 报告生成流水线
pub struct DossierPipeline {
    analyzer: BatchAnalyzer,
    synthesizer: Synthesizer,
}

impl DossierPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &Config) -> Self {
        Self {
            analyzer: BatchAnalyzer::new(generator.clone(), config),
            synthesizer: Synthesizer::new(generator, config.synthesis_max_tokens),
        }
    }

    /// 由调研结果生成报告
    ///
    /// 调研结果完全为空时不发出任何生成调用。
    pub async fn generate(&self, input: &ResearchInput, result: &ResearchResult) -> Option<String> {
        if result.is_empty() {
            warn!("⚠️ 没有任何调研数据，跳过报告生成");
            return None;
        }

        let profile = result.enrichment.as_ref().map(EnrichmentProfile::from_payload);
        let context = PersonContext::resolve(input.name(), input.company(), profile.as_ref());

        let following = merge_following(result);
        let analyses = self.analyzer.analyze(following, &context).await;

        self.synthesizer
            .synthesize(result.enrichment.as_ref(), &analyses, result.articles.as_ref())
            .await
    }
}

/// 使用指定的 LLM 后端生成报告
///
/// 没有可用后端时记录警告并返回 None。
pub async fn generate_dossier(
    config: &Config,
    selection: LlmBackend,
    input: &ResearchInput,
    result: &ResearchResult,
) -> Option<String> {
    let llm = LlmService::new(config, selection);
    if !llm.is_available() {
        warn!(
            "⚠️ 没有可用的 LLM ({})，请设置 GEMINI_API_KEY、OPENAI_API_KEY 或 ANTHROPIC_API_KEY",
            selection.as_str()
        );
        return None;
    }
    info!("🤖 LLM 后端: {}", llm.backend_names().join(" → "));

    DossierPipeline::new(Arc::new(llm), config)
        .generate(input, result)
        .await
}

/// 程序化调用选项
#[derive(Debug, Clone, Copy)]
pub struct ResearchOptions {
    pub generate_dossier: bool,
    pub llm: LlmBackend,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            generate_dossier: true,
            llm: LlmBackend::Auto,
        }
    }
}

/// 一次完整调研的输出
#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub data: ResearchResult,
    pub dossier: Option<String>,
}

impl ResearchReport {
    /// `{data: {enrichment, following, articles}, dossier}`
    pub fn to_json(&self) -> JsonValue {
        json!({
            "data": self.data.to_raw_json(),
            "dossier": self.dossier,
        })
    }
}

/// 程序化入口：调研一个人，并按需生成报告
///
/// # 参数
/// - `config`: 程序配置
/// - `input`: 调研输入
/// - `options`: 是否生成报告、使用哪个 LLM
///
/// # 返回
/// 只有数据源凭证缺失时返回错误；其余失败都体现为空数据或空报告
pub async fn research_person(
    config: &Config,
    input: &ResearchInput,
    options: ResearchOptions,
) -> Result<ResearchReport, ConfigError> {
    let flow = ResearchFlow::from_config(config)?;
    let data = flow.run(input).await;

    let dossier = if options.generate_dossier {
        generate_dossier(config, options.llm, input, &data).await
    } else {
        None
    };

    Ok(ResearchReport { data, dossier })
}
