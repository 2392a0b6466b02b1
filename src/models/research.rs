//! 调研输入、任务句柄与结果累加器

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::following::SocialNetwork;

/// 调研输入
///
/// 所有字段都是可选的；空白字符串视为未提供。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchInput {
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub instagram_url: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
}

impl ResearchInput {
    pub fn email(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    pub fn linkedin_url(&self) -> Option<&str> {
        non_blank(&self.linkedin_url)
    }

    pub fn name(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    pub fn company(&self) -> Option<&str> {
        non_blank(&self.company)
    }

    /// 调用方显式提供的社交主页 URL
    pub fn social_url(&self, network: SocialNetwork) -> Option<&str> {
        match network {
            SocialNetwork::Twitter => non_blank(&self.twitter_url),
            SocialNetwork::Instagram => non_blank(&self.instagram_url),
        }
    }

    /// 是否没有任何可用于识别的字段
    pub fn is_empty(&self) -> bool {
        self.email().is_none()
            && self.linkedin_url().is_none()
            && self.social_url(SocialNetwork::Twitter).is_none()
            && self.social_url(SocialNetwork::Instagram).is_none()
            && self.name().is_none()
            && self.company().is_none()
    }

    /// 用于日志显示的主体描述
    pub fn subject_label(&self) -> String {
        self.name()
            .or(self.email())
            .or(self.linkedin_url())
            .or(self.social_url(SocialNetwork::Twitter))
            .or(self.social_url(SocialNetwork::Instagram))
            .unwrap_or("未知对象")
            .to_string()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 数据源任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    ProfileEnrichment,
    SocialFollowing,
    ArticleSearch,
}

impl JobKind {
    /// 提交与轮询共用的端点路径
    pub fn endpoint(&self) -> &'static str {
        match self {
            JobKind::ProfileEnrichment => "/person/enrichment",
            JobKind::SocialFollowing => "/person/interactions",
            JobKind::ArticleSearch => "/person/articlesearch",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobKind::ProfileEnrichment => "enrichment",
            JobKind::SocialFollowing => "following",
            JobKind::ArticleSearch => "articles",
        };
        f.write_str(label)
    }
}

/// 已提交任务的句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    request_id: String,
    kind: JobKind,
}

impl JobHandle {
    pub fn new(request_id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            request_id: request_id.into(),
            kind,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn endpoint(&self) -> &'static str {
        self.kind.endpoint()
    }
}

/// 单个任务的轮询结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Completed(JsonValue),
    Failed,
    TimedOut,
}

/// 结果槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResearchSlot {
    Enrichment,
    TwitterFollowing,
    InstagramFollowing,
    Articles,
}

impl ResearchSlot {
    pub fn following(network: SocialNetwork) -> Self {
        match network {
            SocialNetwork::Twitter => ResearchSlot::TwitterFollowing,
            SocialNetwork::Instagram => ResearchSlot::InstagramFollowing,
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            ResearchSlot::Enrichment => JobKind::ProfileEnrichment,
            ResearchSlot::TwitterFollowing | ResearchSlot::InstagramFollowing => {
                JobKind::SocialFollowing
            }
            ResearchSlot::Articles => JobKind::ArticleSearch,
        }
    }
}

impl std::fmt::Display for ResearchSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResearchSlot::Enrichment => "enrichment",
            ResearchSlot::TwitterFollowing => "twitter following",
            ResearchSlot::InstagramFollowing => "instagram following",
            ResearchSlot::Articles => "articles",
        };
        f.write_str(label)
    }
}

/// 一次调研的结果累加器
///
/// 每个槽位最多写入一次，已有数据的槽位拒绝覆盖。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchResult {
    pub enrichment: Option<JsonValue>,
    pub twitter_following: Option<JsonValue>,
    pub instagram_following: Option<JsonValue>,
    pub articles: Option<JsonValue>,
}

impl ResearchResult {
    pub fn get(&self, slot: ResearchSlot) -> Option<&JsonValue> {
        match slot {
            ResearchSlot::Enrichment => self.enrichment.as_ref(),
            ResearchSlot::TwitterFollowing => self.twitter_following.as_ref(),
            ResearchSlot::InstagramFollowing => self.instagram_following.as_ref(),
            ResearchSlot::Articles => self.articles.as_ref(),
        }
    }

    pub fn is_filled(&self, slot: ResearchSlot) -> bool {
        self.get(slot).is_some()
    }

    /// 写入槽位；槽位已有数据时返回 false 且不改动
    pub fn fill(&mut self, slot: ResearchSlot, payload: JsonValue) -> bool {
        let target = match slot {
            ResearchSlot::Enrichment => &mut self.enrichment,
            ResearchSlot::TwitterFollowing => &mut self.twitter_following,
            ResearchSlot::InstagramFollowing => &mut self.instagram_following,
            ResearchSlot::Articles => &mut self.articles,
        };
        if target.is_some() {
            return false;
        }
        *target = Some(payload);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.enrichment.is_none()
            && self.twitter_following.is_none()
            && self.instagram_following.is_none()
            && self.articles.is_none()
    }

    pub fn filled_count(&self) -> usize {
        [
            ResearchSlot::Enrichment,
            ResearchSlot::TwitterFollowing,
            ResearchSlot::InstagramFollowing,
            ResearchSlot::Articles,
        ]
        .iter()
        .filter(|slot| self.is_filled(**slot))
        .count()
    }

    /// `--json` 模式的原始数据输出
    pub fn to_raw_json(&self) -> JsonValue {
        serde_json::json!({
            "enrichment": self.enrichment,
            "following": {
                "twitter": self.twitter_following,
                "instagram": self.instagram_following,
            },
            "articles": self.articles,
        })
    }
}
