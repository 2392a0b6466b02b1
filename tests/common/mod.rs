#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deep_research::clients::{ProviderTransport, TextGenerator};
use deep_research::config::Config;
use deep_research::error::{ApiError, LlmError};
use serde_json::{json, Value as JsonValue};

type Responder = Box<dyn Fn(&str, &JsonValue) -> Option<JsonValue> + Send + Sync>;

/// 内存中的数据源
///
/// 每次提交都会拿到新的 request_id；`responder` 决定该任务的完成载荷，
/// 返回 None 表示任务永远处于 pending。
/// 每次状态查询先等待 `status_delay`，并记录同时进行中的查询数峰值。
pub struct ScriptedTransport {
    responder: Responder,
    status_delay: Duration,
    submissions: Mutex<Vec<(String, JsonValue)>>,
    jobs: Mutex<HashMap<String, Option<JsonValue>>>,
    status_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&str, &JsonValue) -> Option<JsonValue> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::with_status_delay(responder, Duration::ZERO)
    }

    pub fn with_status_delay(
        responder: impl Fn(&str, &JsonValue) -> Option<JsonValue> + Send + Sync + 'static,
        status_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            status_delay,
            submissions: Mutex::new(Vec::new()),
            jobs: Mutex::new(HashMap::new()),
            status_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(String, JsonValue)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submissions_to(&self, endpoint: &str) -> Vec<JsonValue> {
        self.submissions()
            .into_iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, body)| body)
            .collect()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderTransport for ScriptedTransport {
    async fn submit(&self, endpoint: &str, body: &JsonValue) -> Result<JsonValue, ApiError> {
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push((endpoint.to_string(), body.clone()));
        let request_id = format!("req-{}", submissions.len());

        let payload = (self.responder)(endpoint, body);
        self.jobs.lock().unwrap().insert(request_id.clone(), payload);

        Ok(json!({"success": true, "data": {"request_id": request_id}}))
    }

    async fn status(&self, _endpoint: &str, request_id: &str) -> Result<JsonValue, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }

        let response = match self.jobs.lock().unwrap().get(request_id) {
            Some(Some(payload)) => {
                let mut data = payload.clone();
                data["status"] = json!("completed");
                json!({"success": true, "data": data})
            }
            Some(None) => json!({"success": true, "data": {"status": "pending"}}),
            None => json!({"success": false, "error": "unknown request_id"}),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(response)
    }
}

/// 记录所有提示词的生成器
///
/// 分批提示词返回 `batch analysis N`，其余返回 `FINAL_DOSSIER`。
pub struct ScriptedGenerator {
    prompts: Mutex<Vec<String>>,
}

pub const FINAL_DOSSIER: &str = "## 1. IDENTITY SNAPSHOT\nJane Doe, CTO at Acme";

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let marker = "This is batch ";
        match prompt.find(marker) {
            Some(start) => {
                let number = prompt[start + marker.len()..]
                    .split_whitespace()
                    .next()
                    .unwrap_or("?")
                    .to_string();
                Ok(format!("batch analysis {}", number))
            }
            None => Ok(FINAL_DOSSIER.to_string()),
        }
    }
}

/// 测试用配置：有凭证，轮询不等待
pub fn test_config() -> Config {
    Config {
        provider_api_key: Some("test-key".to_string()),
        provider_api_secret: Some("test-secret".to_string()),
        poll_max_attempts: 3,
        poll_delay_secs: 0,
        ..Default::default()
    }
}

/// 一份 Jane Doe @ Acme 的 enrichment 结果
pub fn jane_doe_enrichment(twitter: Option<&str>, instagram: Option<&str>) -> JsonValue {
    json!({
        "result": {
            "firstname": "Jane",
            "lastname": "Doe",
            "headline": "CTO at Acme",
            "careers_info": [{"company_name": "Acme", "title": "CTO"}],
            "social_profiles": {
                "twitter": {"url": twitter},
                "instagram": {"url": instagram}
            }
        }
    })
}

/// 指定数量的关注列表载荷
pub fn following_payload(count: usize, prefix: &str) -> JsonValue {
    let users: Vec<JsonValue> = (0..count)
        .map(|i| {
            json!({
                "username": format!("{}{}", prefix, i),
                "name": format!("Account {}", i),
                "followers_count": i * 10,
            })
        })
        .collect();
    json!({"result": {"following": users}})
}
