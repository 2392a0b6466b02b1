//! LLM 后端客户端
//!
//! ## 技术栈
//! - OpenAI 与 Gemini 走 `async-openai`（Gemini 使用其 OpenAI 兼容端点）
//! - Anthropic 直接用 `reqwest` 调用 Messages API

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::LlmError;

const SYSTEM_MESSAGE: &str =
    "You are an elite intelligence analyst. You write precise, well-sourced analysis in Markdown.";
const TEMPERATURE: f32 = 0.7;

/// 文本生成能力
///
/// 输入提示词，返回生成的文本；输出长度由 `max_tokens` 限制。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 后端名称（用于日志）
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

/// OpenAI 兼容接口的后端
pub struct OpenAiCompatibleBackend {
    name: String,
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiCompatibleBackend {
    /// 创建新的后端
    ///
    /// # 参数
    /// - `name`: 后端名称，例如 "openai" / "gemini"
    /// - `api_key`: API密钥
    /// - `api_base`: API基础URL
    /// - `model_name`: 模型名称
    pub fn new(name: &str, api_key: &str, api_base: &str, model_name: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            name: name.to_string(),
            client: Client::with_config(openai_config),
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        debug!("调用 LLM API，后端: {}, 模型: {}", self.name, self.model_name);
        debug!("用户消息长度: {} 字符", prompt.len());

        let model = self.model_name.as_str();
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(|e| LlmError::api_failed(model, e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| LlmError::api_failed(model, e))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| LlmError::api_failed(model, e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败 ({}): {}", self.name, e);
            LlmError::api_failed(model, e)
        })?;

        debug!("LLM API 调用成功 ({})", self.name);

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })
    }
}

/// Anthropic Messages API 后端
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model_name: String,
}

impl AnthropicBackend {
    pub fn new(api_key: &str, api_base: &str, model_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        }
    }

    /// 拼接所有 text 类型的内容块
    fn extract_text(body: &JsonValue) -> Option<String> {
        let text: String = body
            .get("content")?
            .as_array()?
            .iter()
            .filter(|block| block.get("type").and_then(JsonValue::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(JsonValue::as_str))
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[async_trait]
impl TextGenerator for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        debug!("调用 Anthropic API，模型: {}", self.model_name);

        let request_body = json!({
            "model": self.model_name,
            "max_tokens": max_tokens,
            "temperature": TEMPERATURE,
            "system": SYSTEM_MESSAGE,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!("Anthropic API 调用失败: {}", e);
                LlmError::api_failed(&self.model_name, e)
            })?;

        let status = response.status();
        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| LlmError::api_failed(&self.model_name, e))?;

        if !status.is_success() {
            warn!("Anthropic API 返回错误 {}: {}", status, body);
            return Err(LlmError::api_failed(
                &self.model_name,
                std::io::Error::other(format!("HTTP {}: {}", status, body)),
            ));
        }

        Self::extract_text(&body).ok_or_else(|| LlmError::EmptyContent {
            model: self.model_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anthropic_extract_text_joins_text_blocks() {
        let body = json!({
            "content": [
                {"type": "text", "text": "## Dossier\n"},
                {"type": "tool_use", "name": "ignored"},
                {"type": "text", "text": "Body"}
            ]
        });
        assert_eq!(
            AnthropicBackend::extract_text(&body).as_deref(),
            Some("## Dossier\nBody")
        );
        assert_eq!(AnthropicBackend::extract_text(&json!({"content": []})), None);
    }

    /// 真实 API 冒烟测试：需要 OPENAI_API_KEY
    #[tokio::test]
    #[ignore]
    async fn test_openai_backend_smoke() {
        let _ = tracing_subscriber::fmt::try_init();
        let api_key = std::env::var("OPENAI_API_KEY").expect("需要 OPENAI_API_KEY");
        let backend =
            OpenAiCompatibleBackend::new("openai", &api_key, "https://api.openai.com/v1", "gpt-4o");

        let response = backend.generate("Reply with the single word: ok", 16).await;
        match response {
            Ok(text) => {
                println!("LLM 响应: {}", text);
                assert!(!text.is_empty());
            }
            Err(e) => panic!("测试失败: {}", e),
        }
    }
}
