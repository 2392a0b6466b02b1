//! 调研流程 - 流程层
//!
//! 核心职责：定义"一个人"的完整数据收集流程
//!
//! 流程顺序：
//! 1. 第一轮：按调用方输入提交任务，并发轮询，等待全部结束
//! 2. 从画像中补全姓名 / 公司
//! 3. 第二轮：按需补做文章搜索与社交关注列表（顺序执行）

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::clients::{HttpTransport, ProviderClient, ProviderTransport, SubmitError};
use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{
    EnrichmentProfile, JobHandle, JobResult, ResearchInput, ResearchResult, ResearchSlot,
    SocialNetwork,
};
use crate::services::JobPoller;
use crate::utils::logging::log_phase;

/// 调研流程
///
/// - 决定何时提交哪类任务、何时进入第二轮
/// - 只依赖数据源客户端与轮询器
/// - 任何单个任务失败都只会让对应槽位为空
pub struct ResearchFlow {
    client: ProviderClient,
    poller: JobPoller,
    max_concurrent_polls: usize,
}

impl ResearchFlow {
    /// 使用 HTTP 传输层创建流程
    ///
    /// 数据源凭证缺失时直接返回错误，不会发出任何请求。
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// 使用给定的传输层创建流程
    pub fn with_transport(transport: Arc<dyn ProviderTransport>, config: &Config) -> Self {
        Self {
            client: ProviderClient::new(transport.clone(), config),
            poller: JobPoller::new(transport, config),
            max_concurrent_polls: config.max_concurrent_polls.max(1),
        }
    }

    pub async fn run(&self, input: &ResearchInput) -> ResearchResult {
        let mut result = ResearchResult::default();
        if input.is_empty() {
            warn!("⚠️ 调研输入为空，不提交任何任务");
            return result;
        }

        // ========== 第一轮：提交 ==========
        log_phase(1, 3, "提交数据源任务...");
        let mut active: Vec<(ResearchSlot, JobHandle)> = Vec::new();

        let enrichment = self
            .client
            .submit_enrichment(input.email(), input.linkedin_url())
            .await;
        if let Some(handle) = accept(ResearchSlot::Enrichment, enrichment) {
            active.push((ResearchSlot::Enrichment, handle));
        }

        for network in SocialNetwork::ALL {
            if let Some(url) = input.social_url(network) {
                let slot = ResearchSlot::following(network);
                if let Some(handle) = accept(slot, self.client.submit_following(url).await) {
                    active.push((slot, handle));
                }
            }
        }

        let mut articles_started = false;
        if let (Some(name), Some(company)) = (input.name(), input.company()) {
            let submitted = self.client.submit_article_search(name, company).await;
            if let Some(handle) = accept(ResearchSlot::Articles, submitted) {
                active.push((ResearchSlot::Articles, handle));
                articles_started = true;
            }
        }

        if active.is_empty() {
            warn!("⚠️ 没有成功提交任何任务，请检查输入");
            log_phase(3, 3, "调研结束（无数据）");
            return result;
        }

        // ========== 第一轮：并发轮询 ==========
        log_phase(2, 3, &format!("等待 {} 个任务结果...", active.len()));
        for (slot, job) in self.poll_all(active).await {
            self.store(&mut result, slot, job);
        }

        // ========== 补全身份信息 ==========
        let profile = result.enrichment.as_ref().map(EnrichmentProfile::from_payload);
        let name = input
            .name()
            .map(str::to_string)
            .or_else(|| profile.as_ref().and_then(EnrichmentProfile::full_name));
        let company = input
            .company()
            .map(str::to_string)
            .or_else(|| profile.as_ref().and_then(EnrichmentProfile::current_company));

        // ========== 第二轮：文章搜索 ==========
        if !articles_started && !result.is_filled(ResearchSlot::Articles) {
            if let (Some(name), Some(company)) = (&name, &company) {
                info!("  → Found: {} @ {}", name, company);
                info!("  → 获取相关文章...");
                let submitted = self.client.submit_article_search(name, company).await;
                if let Some(handle) = accept(ResearchSlot::Articles, submitted) {
                    let job = self.poller.poll(&handle).await;
                    self.store(&mut result, ResearchSlot::Articles, job);
                }
            }
        }

        // ========== 第二轮：社交关注列表 ==========
        if let Some(profile) = &profile {
            for network in SocialNetwork::ALL {
                let slot = ResearchSlot::following(network);
                if input.social_url(network).is_some() || result.is_filled(slot) {
                    continue;
                }
                let Some(url) = profile.social_url(network) else {
                    continue;
                };

                info!("  → Found {}: {}", network, url);
                info!("  → 获取关注列表...");
                if let Some(handle) = accept(slot, self.client.submit_following(&url).await) {
                    let job = self.poller.poll(&handle).await;
                    self.store(&mut result, slot, job);
                }
            }
        }

        log_phase(3, 3, &format!("调研完成，获得 {} 项数据", result.filled_count()));
        result
    }

    /// 并发轮询所有任务，全部结束后一起返回
    async fn poll_all(&self, active: Vec<(ResearchSlot, JobHandle)>) -> Vec<(ResearchSlot, JobResult)> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_polls));

        let handles: Vec<_> = active
            .into_iter()
            .map(|(slot, handle)| {
                let semaphore = semaphore.clone();
                let poller = self.poller.clone();
                let task = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    poller.poll(&handle).await
                });
                (slot, task)
            })
            .collect();

        let (slots, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes = join_all(tasks).await;

        slots
            .into_iter()
            .zip(outcomes)
            .map(|(slot, outcome)| match outcome {
                Ok(job) => (slot, job),
                Err(e) => {
                    error!("[{}] 轮询任务执行失败: {}", slot, e);
                    (slot, JobResult::Failed)
                }
            })
            .collect()
    }

    /// 将任务结果写入槽位
    fn store(&self, result: &mut ResearchResult, slot: ResearchSlot, job: JobResult) {
        match job {
            JobResult::Completed(payload) => {
                if result.fill(slot, payload) {
                    info!("  ✓ {}: completed", slot);
                } else {
                    warn!("[{}] 槽位已有数据，忽略重复结果", slot);
                }
            }
            JobResult::Failed => info!("  - {}: 任务失败，无数据", slot),
            JobResult::TimedOut => info!("  - {}: 轮询超时，无数据", slot),
        }
    }
}

/// 处理提交结果：拿到句柄返回 Some，否则记录原因
fn accept(slot: ResearchSlot, submitted: Result<JobHandle, SubmitError>) -> Option<JobHandle> {
    match submitted {
        Ok(handle) => {
            info!("  ✓ {} 任务已提交", slot);
            Some(handle)
        }
        Err(SubmitError::NoValidInput { .. }) => {
            debug!("  - {}: 跳过（没有可用输入）", slot);
            None
        }
        Err(SubmitError::Api(e)) => {
            warn!("  - {}: 提交失败: {}", slot, e);
            None
        }
    }
}
