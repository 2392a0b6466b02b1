//! 画像数据（enrichment）的宽松解析视图

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::models::following::SocialNetwork;
use crate::models::lenient::{default_on_error, lenient_string};

/// 未知字段在提示词里的占位
pub const UNKNOWN: &str = "Unknown";

/// enrichment 结果中 `result` 对象的宽松视图
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichmentProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lastname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub headline: Option<String>,
    #[serde(default, deserialize_with = "default_on_error")]
    pub careers_info: Vec<CareerInfo>,
    #[serde(default, deserialize_with = "default_on_error")]
    pub social_profiles: SocialProfiles,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CareerInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialProfiles {
    #[serde(default, deserialize_with = "default_on_error")]
    pub twitter: SocialProfile,
    #[serde(default, deserialize_with = "default_on_error")]
    pub instagram: SocialProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

impl EnrichmentProfile {
    /// 从 enrichment 任务的完成载荷中解析画像
    ///
    /// 载荷形如 `{status, result: {...}}`；缺失或格式异常时返回空画像。
    pub fn from_payload(payload: &JsonValue) -> Self {
        let Some(result) = payload.get("result") else {
            debug!("enrichment 载荷中没有 result 字段");
            return Self::default();
        };
        serde_json::from_value(result.clone()).unwrap_or_else(|e| {
            debug!("enrichment 画像解析失败，使用空画像: {}", e);
            Self::default()
        })
    }

    /// 名 + 姓，两者都存在才返回
    pub fn full_name(&self) -> Option<String> {
        match (&self.firstname, &self.lastname) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        }
    }

    /// 职业列表第一项的公司名
    pub fn current_company(&self) -> Option<String> {
        self.careers_info.first()?.company_name.clone()
    }

    /// 职业列表第一项的职位，缺失时退回 headline
    pub fn current_role(&self) -> Option<String> {
        self.careers_info
            .first()
            .and_then(|c| c.title.clone())
            .or_else(|| self.headline.clone())
    }

    pub fn social_url(&self, network: SocialNetwork) -> Option<String> {
        match network {
            SocialNetwork::Twitter => self.social_profiles.twitter.url.clone(),
            SocialNetwork::Instagram => self.social_profiles.instagram.url.clone(),
        }
    }
}

/// 分批分析提示词中的人物上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonContext {
    pub name: String,
    pub role: String,
    pub company: String,
}

impl PersonContext {
    /// 调用方提供的字段优先，其次取画像中的字段，都没有时用 "Unknown"
    pub fn resolve(
        name: Option<&str>,
        company: Option<&str>,
        profile: Option<&EnrichmentProfile>,
    ) -> Self {
        let name = name
            .map(str::to_string)
            .or_else(|| profile.and_then(EnrichmentProfile::full_name));
        let company = company
            .map(str::to_string)
            .or_else(|| profile.and_then(EnrichmentProfile::current_company));
        let role = profile.and_then(EnrichmentProfile::current_role);

        Self {
            name: name.unwrap_or_else(|| UNKNOWN.to_string()),
            role: role.unwrap_or_else(|| UNKNOWN.to_string()),
            company: company.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}
