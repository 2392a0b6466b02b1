//! 分批分析器 - 编排层
//!
//! 把合并后的关注列表切成固定大小的窗口，每个窗口一次生成调用，
//! 并发执行后按批次序号还原顺序。

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::clients::TextGenerator;
use crate::config::Config;
use crate::models::{partition_batches, FollowingEntry, PersonContext};
use crate::services::prompts::batch_analysis_prompt;

/// 分批分析器
pub struct BatchAnalyzer {
    generator: Arc<dyn TextGenerator>,
    batch_size: usize,
    max_concurrent: usize,
    max_tokens: u32,
}

impl BatchAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &Config) -> Self {
        Self::with_settings(
            generator,
            config.analysis_batch_size,
            config.max_concurrent_batches,
            config.batch_max_tokens,
        )
    }

    pub fn with_settings(
        generator: Arc<dyn TextGenerator>,
        batch_size: usize,
        max_concurrent: usize,
        max_tokens: u32,
    ) -> Self {
        Self {
            generator,
            batch_size: batch_size.max(1),
            max_concurrent: max_concurrent.max(1),
            max_tokens,
        }
    }

    /// 分析关注列表
    ///
    /// # 参数
    /// - `entries`: 合并后的关注列表（twitter 在前）
    /// - `context`: 人物上下文
    ///
    /// # 返回
    /// 按批次序号排列的分析文本；失败的批次被跳过
    pub async fn analyze(&self, entries: Vec<FollowingEntry>, context: &PersonContext) -> Vec<String> {
        if entries.is_empty() {
            debug!("关注列表为空，跳过分批分析");
            return Vec::new();
        }

        let total_entries = entries.len();
        let batches = partition_batches(entries, self.batch_size);
        let total_batches = batches.len();
        info!(
            "🧩 关注列表 {} 条，分 {} 批分析（每批 {} 条，并发 {}）",
            total_entries, total_batches, self.batch_size, self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut batch_handles = Vec::with_capacity(total_batches);

        for batch in batches {
            let prompt = batch_analysis_prompt(context, &batch);
            let index = batch.index;
            let generator = self.generator.clone();
            let semaphore = semaphore.clone();
            let max_tokens = self.max_tokens;

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                match generator.generate(&prompt, max_tokens).await {
                    Ok(text) => {
                        info!("  ✓ 第 {}/{} 批分析完成", index + 1, total_batches);
                        Some(text)
                    }
                    Err(e) => {
                        warn!("  ⚠️ 第 {}/{} 批分析失败，跳过: {}", index + 1, total_batches, e);
                        None
                    }
                }
            });
            batch_handles.push((index, handle));
        }

        // 每个批次写入自己的槽位，完成顺序不影响输出顺序
        let mut slots: Vec<Option<String>> = vec![None; total_batches];
        for (index, handle) in batch_handles {
            match handle.await {
                Ok(output) => slots[index] = output,
                Err(e) => error!("第 {} 批分析任务执行失败: {}", index + 1, e),
            }
        }

        let analyses: Vec<String> = slots.into_iter().flatten().collect();
        info!("📊 分批分析完成: 成功 {}/{}", analyses.len(), total_batches);
        analyses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::models::SocialNetwork;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 从提示词中读出批次序号，序号越小睡得越久，使完成顺序与序号相反
    struct ReversingGenerator {
        calls: AtomicUsize,
        fail_batch: Option<usize>,
    }

    fn batch_number(prompt: &str) -> usize {
        let marker = "This is batch ";
        let start = prompt.find(marker).map(|i| i + marker.len()).unwrap_or(0);
        prompt[start..]
            .split_whitespace()
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }

    #[async_trait]
    impl TextGenerator for ReversingGenerator {
        fn name(&self) -> &str {
            "reversing"
        }

        async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = batch_number(prompt);
            tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(20 * n as u64))).await;
            if Some(n) == self.fail_batch {
                return Err(LlmError::EmptyContent {
                    model: "reversing".to_string(),
                });
            }
            Ok(format!("analysis {}", n))
        }
    }

    /// 记录同时进行中的生成调用数峰值
    #[derive(Default)]
    struct ConcurrencyGenerator {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for ConcurrencyGenerator {
        fn name(&self) -> &str {
            "concurrency"
        }

        async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("analysis {}", batch_number(prompt)))
        }
    }

    fn entries(count: usize) -> Vec<FollowingEntry> {
        (0..count)
            .map(|i| FollowingEntry {
                handle: Some(format!("account{}", i)),
                display_name: None,
                followers_count: Some(i as u64),
                bio: None,
                verified: false,
                profile_url: None,
                source: SocialNetwork::Twitter,
            })
            .collect()
    }

    fn context() -> PersonContext {
        PersonContext::resolve(Some("Jane Doe"), Some("Acme"), None)
    }

    fn analyzer(generator: Arc<ReversingGenerator>) -> BatchAnalyzer {
        BatchAnalyzer::with_settings(generator, 75, 5, 1024)
    }

    #[tokio::test]
    async fn test_output_follows_batch_index_not_completion_order() {
        let generator = Arc::new(ReversingGenerator {
            calls: AtomicUsize::new(0),
            fail_batch: None,
        });
        let analyses = analyzer(generator.clone()).analyze(entries(200), &context()).await;

        assert_eq!(analyses, vec!["analysis 1", "analysis 2", "analysis 3"]);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_calls_never_exceed_limit() {
        let config = Config::default();
        let generator = Arc::new(ConcurrencyGenerator::default());
        let analyses = BatchAnalyzer::new(generator.clone(), &config)
            .analyze(entries(750), &context())
            .await;

        assert_eq!(analyses.len(), 10);
        assert_eq!(analyses[9], "analysis 10");
        assert_eq!(generator.peak.load(Ordering::SeqCst), config.max_concurrent_batches);
        assert_eq!(generator.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_a_gap() {
        let generator = Arc::new(ReversingGenerator {
            calls: AtomicUsize::new(0),
            fail_batch: Some(2),
        });
        let analyses = analyzer(generator).analyze(entries(200), &context()).await;
        assert_eq!(analyses, vec!["analysis 1", "analysis 3"]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let generator = Arc::new(ReversingGenerator {
            calls: AtomicUsize::new(0),
            fail_batch: None,
        });
        let analyses = analyzer(generator.clone()).analyze(Vec::new(), &context()).await;
        assert!(analyses.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
