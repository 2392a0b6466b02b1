//! 最终汇总：画像 + 分批分析 + 文章 → 一次生成调用

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::clients::TextGenerator;
use crate::services::prompts::synthesis_prompt;
use crate::utils::logging::truncate_text;

pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self {
            generator,
            max_tokens,
        }
    }

    /// 生成最终报告，生成失败时返回 None
    pub async fn synthesize(
        &self,
        enrichment: Option<&JsonValue>,
        analyses: &[String],
        articles: Option<&JsonValue>,
    ) -> Option<String> {
        let prompt = synthesis_prompt(enrichment, analyses, articles);
        debug!("汇总提示词长度: {} 字符", prompt.len());
        info!("📝 正在生成最终报告 ({})...", self.generator.name());

        match self.generator.generate(&prompt, self.max_tokens).await {
            Ok(report) => {
                info!("✓ 报告生成完成，共 {} 字符", report.chars().count());
                debug!("报告预览: {}", truncate_text(&report, 120));
                Some(report)
            }
            Err(e) => {
                warn!("⚠️ 报告生成失败: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::services::prompts::NO_FOLLOWING_ANALYSIS;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct CapturingGenerator {
        prompts: Mutex<Vec<String>>,
        reply: Option<String>,
    }

    #[async_trait]
    impl TextGenerator for CapturingGenerator {
        fn name(&self) -> &str {
            "capturing"
        }

        async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().ok_or(LlmError::AllBackendsFailed { attempted: 1 })
        }
    }

    #[tokio::test]
    async fn test_empty_analyses_use_sentinel_in_prompt() {
        let generator = Arc::new(CapturingGenerator {
            prompts: Mutex::new(Vec::new()),
            reply: Some("# Dossier".to_string()),
        });
        let synthesizer = Synthesizer::new(generator.clone(), 16000);

        let enrichment = json!({"result": {"firstname": "Jane"}});
        let report = synthesizer.synthesize(Some(&enrichment), &[], None).await;

        assert_eq!(report.as_deref(), Some("# Dossier"));
        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].matches(NO_FOLLOWING_ANALYSIS).count(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_yields_none() {
        let generator = Arc::new(CapturingGenerator {
            prompts: Mutex::new(Vec::new()),
            reply: None,
        });
        let synthesizer = Synthesizer::new(generator, 16000);
        assert_eq!(synthesizer.synthesize(None, &[], None).await, None);
    }
}
