//! LLM 服务 - 业务能力层
//!
//! 只负责"生成文本"能力，不关心流程。
//!
//! 持有一个按优先级排序的后端列表，依次尝试直到某个后端成功；
//! 选择哪些后端由 `LlmBackend` 决定，在组装时完成。

use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use tracing::{debug, warn};

use crate::clients::{AnthropicBackend, OpenAiCompatibleBackend, TextGenerator};
use crate::config::Config;
use crate::error::LlmError;

/// 后端选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LlmBackend {
    /// 按 gemini → openai → anthropic 顺序尝试
    #[default]
    Auto,
    Gemini,
    Openai,
    Anthropic,
}

impl LlmBackend {
    /// 该选项对应的后端尝试顺序
    pub fn preference_order(&self) -> &'static [LlmBackend] {
        match self {
            LlmBackend::Auto => &[LlmBackend::Gemini, LlmBackend::Openai, LlmBackend::Anthropic],
            LlmBackend::Gemini => &[LlmBackend::Gemini],
            LlmBackend::Openai => &[LlmBackend::Openai],
            LlmBackend::Anthropic => &[LlmBackend::Anthropic],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::Auto => "auto",
            LlmBackend::Gemini => "gemini",
            LlmBackend::Openai => "openai",
            LlmBackend::Anthropic => "anthropic",
        }
    }
}

/// LLM 服务
///
/// 职责：
/// - 按顺序尝试多个后端，第一个成功的结果即为输出
/// - 未配置 API Key 的后端不进入列表
pub struct LlmService {
    selection: LlmBackend,
    backends: Vec<Arc<dyn TextGenerator>>,
}

impl LlmService {
    /// 根据配置与后端选择组装服务
    pub fn new(config: &Config, selection: LlmBackend) -> Self {
        let mut backends: Vec<Arc<dyn TextGenerator>> = Vec::new();

        for backend in selection.preference_order() {
            match backend {
                LlmBackend::Gemini => {
                    if let Some(key) = &config.gemini_api_key {
                        backends.push(Arc::new(OpenAiCompatibleBackend::new(
                            "gemini",
                            key,
                            &config.gemini_api_base_url,
                            &config.gemini_model_name,
                        )));
                    }
                }
                LlmBackend::Openai => {
                    if let Some(key) = &config.openai_api_key {
                        backends.push(Arc::new(OpenAiCompatibleBackend::new(
                            "openai",
                            key,
                            &config.openai_api_base_url,
                            &config.openai_model_name,
                        )));
                    }
                }
                LlmBackend::Anthropic => {
                    if let Some(key) = &config.anthropic_api_key {
                        backends.push(Arc::new(AnthropicBackend::new(
                            key,
                            &config.anthropic_api_base_url,
                            &config.anthropic_model_name,
                        )));
                    }
                }
                LlmBackend::Auto => {}
            }
        }

        debug!(
            "LLM 服务已组装: 选择 {}, 可用后端 {} 个",
            selection.as_str(),
            backends.len()
        );

        Self { selection, backends }
    }

    /// 直接使用给定的后端列表
    pub fn with_backends(backends: Vec<Arc<dyn TextGenerator>>) -> Self {
        Self {
            selection: LlmBackend::Auto,
            backends,
        }
    }

    /// 是否至少有一个可用后端
    pub fn is_available(&self) -> bool {
        !self.backends.is_empty()
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}

#[async_trait]
impl TextGenerator for LlmService {
    fn name(&self) -> &str {
        self.selection.as_str()
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        if self.backends.is_empty() {
            return Err(LlmError::NotConfigured {
                backend: self.selection.as_str().to_string(),
            });
        }

        for backend in &self.backends {
            debug!("尝试 LLM 后端: {}", backend.name());
            match backend.generate(prompt, max_tokens).await {
                Ok(text) => {
                    debug!("✓ 由 {} 生成", backend.name());
                    return Ok(text);
                }
                Err(e) => warn!("LLM 后端 {} 失败，尝试下一个: {}", backend.name(), e),
            }
        }

        warn!("⚠️ 所有 LLM 后端均不可用");
        Err(LlmError::AllBackendsFailed {
            attempted: self.backends.len(),
        })
    }
}
