use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// 程序配置
///
/// 进程启动时构建一次，之后只读，显式传入各个组件。
#[derive(Clone, Debug)]
pub struct Config {
    // --- 数据源 API 配置 ---
    pub provider_base_url: String,
    pub provider_api_key: Option<String>,
    pub provider_api_secret: Option<String>,
    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    // --- 轮询配置 ---
    /// 单个任务最多轮询次数
    pub poll_max_attempts: usize,
    /// 两次轮询之间的间隔（秒）
    pub poll_delay_secs: u64,
    /// 第一轮同时轮询的任务数量
    pub max_concurrent_polls: usize,
    // --- 请求参数 ---
    pub following_max_results: u32,
    pub article_limit: u32,
    // --- 分批分析配置 ---
    /// 每批关注列表条目数
    pub analysis_batch_size: usize,
    /// 同时分析的批次数量
    pub max_concurrent_batches: usize,
    pub batch_max_tokens: u32,
    pub synthesis_max_tokens: u32,
    // --- LLM 配置 ---
    pub gemini_api_key: Option<String>,
    pub gemini_api_base_url: String,
    pub gemini_model_name: String,
    pub openai_api_key: Option<String>,
    pub openai_api_base_url: String,
    pub openai_model_name: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_api_base_url: String,
    pub anthropic_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_base_url: "https://api.nyne.ai".to_string(),
            provider_api_key: None,
            provider_api_secret: None,
            request_timeout_secs: 30,
            poll_max_attempts: 60,
            poll_delay_secs: 5,
            max_concurrent_polls: 4,
            following_max_results: 500,
            article_limit: 15,
            analysis_batch_size: 75,
            max_concurrent_batches: 5,
            batch_max_tokens: 4096,
            synthesis_max_tokens: 16000,
            gemini_api_key: None,
            gemini_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            gemini_model_name: "gemini-2.0-flash".to_string(),
            openai_api_key: None,
            openai_api_base_url: "https://api.openai.com/v1".to_string(),
            openai_model_name: "gpt-4o".to_string(),
            anthropic_api_key: None,
            anthropic_api_base_url: "https://api.anthropic.com/v1".to_string(),
            anthropic_model_name: "claude-sonnet-4-20250514".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            provider_base_url: std::env::var("NYNE_BASE_URL").unwrap_or(default.provider_base_url),
            provider_api_key: secret_var("NYNE_API_KEY"),
            provider_api_secret: secret_var("NYNE_API_SECRET"),
            request_timeout_secs: parsed_var("REQUEST_TIMEOUT_SECS", default.request_timeout_secs),
            poll_max_attempts: parsed_var("POLL_MAX_ATTEMPTS", default.poll_max_attempts),
            poll_delay_secs: parsed_var("POLL_DELAY_SECS", default.poll_delay_secs),
            max_concurrent_polls: parsed_var("MAX_CONCURRENT_POLLS", default.max_concurrent_polls),
            following_max_results: parsed_var("FOLLOWING_MAX_RESULTS", default.following_max_results),
            article_limit: parsed_var("ARTICLE_LIMIT", default.article_limit),
            analysis_batch_size: parsed_var("ANALYSIS_BATCH_SIZE", default.analysis_batch_size),
            max_concurrent_batches: parsed_var("MAX_CONCURRENT_BATCHES", default.max_concurrent_batches),
            batch_max_tokens: parsed_var("BATCH_MAX_TOKENS", default.batch_max_tokens),
            synthesis_max_tokens: parsed_var("SYNTHESIS_MAX_TOKENS", default.synthesis_max_tokens),
            gemini_api_key: secret_var("GEMINI_API_KEY"),
            gemini_api_base_url: std::env::var("GEMINI_API_BASE_URL").unwrap_or(default.gemini_api_base_url),
            gemini_model_name: std::env::var("GEMINI_MODEL").unwrap_or(default.gemini_model_name),
            openai_api_key: secret_var("OPENAI_API_KEY"),
            openai_api_base_url: std::env::var("OPENAI_API_BASE_URL").unwrap_or(default.openai_api_base_url),
            openai_model_name: std::env::var("OPENAI_MODEL").unwrap_or(default.openai_model_name),
            anthropic_api_key: secret_var("ANTHROPIC_API_KEY"),
            anthropic_api_base_url: std::env::var("ANTHROPIC_API_BASE_URL").unwrap_or(default.anthropic_api_base_url),
            anthropic_model_name: std::env::var("ANTHROPIC_MODEL").unwrap_or(default.anthropic_model_name),
        }
    }

    /// 数据源凭证，两个值都存在才返回
    pub fn provider_credentials(&self) -> Result<(String, String), ConfigError> {
        match (&self.provider_api_key, &self.provider_api_secret) {
            (Some(key), Some(secret)) => Ok((key.clone(), secret.clone())),
            _ => Err(ConfigError::MissingProviderCredentials),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }
}

/// 读取密钥类环境变量，空字符串视为未设置
fn secret_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 读取并解析环境变量，解析失败时记录警告并使用默认值
fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    let Ok(raw) = std::env::var(name) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            let err = ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: std::any::type_name::<T>().to_string(),
            };
            warn!("⚠️ {}，使用默认值", err);
            default
        }
    }
}
