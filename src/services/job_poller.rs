//! 任务轮询服务 - 业务能力层
//!
//! 只负责"把一个任务句柄轮询到终态"，不关心是哪一轮、哪个槽位。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::clients::{ProviderClient, ProviderTransport};
use crate::config::Config;
use crate::models::{JobHandle, JobResult};

/// 单次状态查询的判定
enum PollStep {
    Done(JobResult),
    Pending(String),
}

/// 任务轮询器
///
/// 最坏情况下的耗时上限为 `max_attempts × delay`。
#[derive(Clone)]
pub struct JobPoller {
    transport: Arc<dyn ProviderTransport>,
    max_attempts: usize,
    delay: Duration,
}

impl JobPoller {
    /// 创建新的轮询器
    pub fn new(transport: Arc<dyn ProviderTransport>, config: &Config) -> Self {
        Self::with_settings(transport, config.poll_max_attempts, config.poll_delay())
    }

    pub fn with_settings(
        transport: Arc<dyn ProviderTransport>,
        max_attempts: usize,
        delay: Duration,
    ) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 轮询任务直到完成、失败或超出次数
    ///
    /// 每次尝试只发一次状态查询；最后一次尝试之后不再等待。
    pub async fn poll(&self, handle: &JobHandle) -> JobResult {
        let endpoint = handle.endpoint();

        for attempt in 1..=self.max_attempts {
            match self.transport.status(endpoint, handle.request_id()).await {
                Ok(response) => match Self::classify(&response) {
                    PollStep::Done(result) => {
                        debug!(
                            "{} 任务 {} 在第 {} 次查询时结束",
                            handle.kind(),
                            handle.request_id(),
                            attempt
                        );
                        return result;
                    }
                    PollStep::Pending(status) => {
                        debug!(
                            "{} 任务状态: {} ({}/{})",
                            handle.kind(),
                            status,
                            attempt,
                            self.max_attempts
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "{} 状态查询失败 ({}/{}): {}",
                        handle.kind(),
                        attempt,
                        self.max_attempts,
                        e
                    );
                }
            }

            if attempt < self.max_attempts {
                sleep(self.delay).await;
            }
        }

        warn!(
            "⏱️ {} 任务 {} 轮询超时，已查询 {} 次",
            handle.kind(),
            handle.request_id(),
            self.max_attempts
        );
        JobResult::TimedOut
    }

    /// 判定一次状态查询响应
    fn classify(response: &JsonValue) -> PollStep {
        if !ProviderClient::is_success_response(response) {
            return PollStep::Done(JobResult::Failed);
        }

        let data = response.get("data").cloned().unwrap_or(JsonValue::Null);
        let status = data
            .get("status")
            .and_then(JsonValue::as_str)
            .unwrap_or("")
            .to_string();

        match status.as_str() {
            "completed" => PollStep::Done(JobResult::Completed(data)),
            "failed" => PollStep::Done(JobResult::Failed),
            _ => PollStep::Pending(status),
        }
    }
}
