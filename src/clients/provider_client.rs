/// 数据源 API 客户端
///
/// 封装三类任务的提交请求构建与响应解析；HTTP 细节在 `ProviderTransport` 之后。
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::models::{JobHandle, JobKind};

/// 数据源传输层
///
/// `submit` 对应 `POST <endpoint>`，`status` 对应 `GET <endpoint>?request_id=...`，
/// 两者都返回完整的响应 JSON（`{success, data}`）。
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn submit(&self, endpoint: &str, body: &JsonValue) -> Result<JsonValue, ApiError>;
    async fn status(&self, endpoint: &str, request_id: &str) -> Result<JsonValue, ApiError>;
}

/// 基于 reqwest 的 HTTP 传输层
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// 创建 HTTP 传输层，凭证缺失时返回错误（不发出任何请求）
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let (api_key, api_secret) = config.provider_credentials()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("X-API-Key", header_value("NYNE_API_KEY", &api_key)?);
        headers.insert("X-API-Secret", header_value("NYNE_API_SECRET", &api_secret)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.provider_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_json(endpoint: &str, response: reqwest::Response) -> Result<JsonValue, ApiError> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::request_failed(endpoint, e))?;
        serde_json::from_str(&text).map_err(|e| ApiError::json_parse_failed(endpoint, e))
    }
}

fn header_value(var_name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeaderValue {
        var_name: var_name.to_string(),
    })
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn submit(&self, endpoint: &str, body: &JsonValue) -> Result<JsonValue, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {} Payload: {}", url, body);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::request_failed(endpoint, e))?;

        Self::read_json(endpoint, response).await
    }

    async fn status(&self, endpoint: &str, request_id: &str) -> Result<JsonValue, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[("request_id", request_id)])
            .send()
            .await
            .map_err(|e| ApiError::request_failed(endpoint, e))?;

        Self::read_json(endpoint, response).await
    }
}

/// 提交失败的原因
#[derive(Debug, Error)]
pub enum SubmitError {
    /// 输入不足以发起该类任务（未发出请求）
    #[error("没有可用的输入 ({kind})")]
    NoValidInput { kind: JobKind },
    /// 请求发出但没有拿到任务句柄
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// 数据源 API 客户端
#[derive(Clone)]
pub struct ProviderClient {
    transport: Arc<dyn ProviderTransport>,
    following_max_results: u32,
    article_limit: u32,
}

impl ProviderClient {
    /// 创建新的数据源客户端
    pub fn new(transport: Arc<dyn ProviderTransport>, config: &Config) -> Self {
        Self {
            transport,
            following_max_results: config.following_max_results,
            article_limit: config.article_limit,
        }
    }

    /// 提交画像补全任务
    ///
    /// # 参数
    /// - `email`: 邮箱（可选）
    /// - `social_url`: 社交主页 URL，通常是 LinkedIn（可选）
    pub async fn submit_enrichment(
        &self,
        email: Option<&str>,
        social_url: Option<&str>,
    ) -> Result<JobHandle, SubmitError> {
        if email.is_none() && social_url.is_none() {
            return Err(SubmitError::NoValidInput {
                kind: JobKind::ProfileEnrichment,
            });
        }

        let mut body = json!({
            "newsfeed": ["all"],
            "ai_enhanced_search": true,
        });
        if let Some(email) = email {
            body["email"] = json!(email);
        }
        if let Some(url) = social_url {
            body["social_media_url"] = json!(url);
        }

        self.submit(JobKind::ProfileEnrichment, &body).await
    }

    /// 提交"关注列表"任务
    pub async fn submit_following(&self, social_url: &str) -> Result<JobHandle, SubmitError> {
        let social_url = social_url.trim();
        if social_url.is_empty() {
            return Err(SubmitError::NoValidInput {
                kind: JobKind::SocialFollowing,
            });
        }

        let body = json!({
            "type": "following",
            "social_media_url": social_url,
            "max_results": self.following_max_results,
        });

        self.submit(JobKind::SocialFollowing, &body).await
    }

    /// 提交文章搜索任务（姓名与公司缺一不可）
    pub async fn submit_article_search(
        &self,
        name: &str,
        company: &str,
    ) -> Result<JobHandle, SubmitError> {
        let (name, company) = (name.trim(), company.trim());
        if name.is_empty() || company.is_empty() {
            return Err(SubmitError::NoValidInput {
                kind: JobKind::ArticleSearch,
            });
        }

        let body = json!({
            "name": name,
            "company": company,
            "sort": "recent",
            "limit": self.article_limit,
        });

        self.submit(JobKind::ArticleSearch, &body).await
    }

    async fn submit(&self, kind: JobKind, body: &JsonValue) -> Result<JobHandle, SubmitError> {
        let endpoint = kind.endpoint();
        let response = self.transport.submit(endpoint, body).await?;
        let request_id = Self::extract_request_id(endpoint, &response)?;
        debug!("{} 任务已提交, request_id: {}", kind, request_id);
        Ok(JobHandle::new(request_id, kind))
    }

    /// 从提交响应中提取 request_id
    fn extract_request_id(endpoint: &str, response: &JsonValue) -> Result<String, ApiError> {
        if !Self::is_success_response(response) {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                message: Self::error_message(response),
            });
        }

        response
            .get("data")
            .and_then(|d| d.get("request_id"))
            .and_then(|id| match id {
                JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| ApiError::MissingRequestId {
                endpoint: endpoint.to_string(),
            })
    }

    /// 检查 API 响应是否成功
    pub fn is_success_response(response: &JsonValue) -> bool {
        response
            .get("success")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    fn error_message(response: &JsonValue) -> Option<String> {
        ["error", "message"]
            .iter()
            .find_map(|key| response.get(*key))
            .map(|v| match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}
