//! 关注列表条目、跨平台合并与分批

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::models::lenient::{lenient_bool, lenient_count, lenient_string};
use crate::models::research::ResearchResult;

/// 社交平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialNetwork {
    Twitter,
    Instagram,
}

impl SocialNetwork {
    /// 合并顺序：先 twitter 后 instagram
    pub const ALL: [SocialNetwork; 2] = [SocialNetwork::Twitter, SocialNetwork::Instagram];
}

impl std::fmt::Display for SocialNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocialNetwork::Twitter => f.write_str("twitter"),
            SocialNetwork::Instagram => f.write_str("instagram"),
        }
    }
}

/// 单个被关注账号
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowingEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    /// 来源平台（合并时打标）
    pub source: SocialNetwork,
}

impl FollowingEntry {
    /// 宽松解析单条记录；同一含义的字段按优先级取第一个有效值
    fn from_value(value: &JsonValue, source: SocialNetwork) -> Option<Self> {
        let object = value.as_object()?;
        let pick = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .filter_map(|key| object.get(*key))
                .find_map(|v| lenient_string(v.clone()).ok().flatten())
        };

        let profile_url = pick(&["profile_url", "url", "link"]);
        let handle = pick(&["handle", "username", "screen_name"])
            .map(|h| h.trim_start_matches('@').to_string())
            .or_else(|| profile_url.as_deref().and_then(handle_from_url));
        let followers_count = ["followers_count", "follower_count", "followers"]
            .iter()
            .filter_map(|key| object.get(*key))
            .find_map(|v| lenient_count(v.clone()).ok().flatten());
        let verified = ["verified", "is_verified"]
            .iter()
            .filter_map(|key| object.get(*key))
            .any(|v| lenient_bool(v.clone()).unwrap_or(false));

        Some(Self {
            handle,
            display_name: pick(&["display_name", "name", "full_name"]),
            followers_count,
            bio: pick(&["bio", "description", "biography"]),
            verified,
            profile_url,
            source,
        })
    }
}

/// 从主页 URL 推导账号名，例如 `https://x.com/jack` → `jack`
pub fn handle_from_url(url: &str) -> Option<String> {
    static PROFILE_URL: OnceLock<Regex> = OnceLock::new();
    let re = PROFILE_URL.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:https?://)?(?:www\.|mobile\.)?(?:twitter\.com|x\.com|instagram\.com)/@?([A-Za-z0-9_.]+)/?(?:[?#].*)?$",
        )
        .expect("静态正则表达式无效")
    });
    re.captures(url.trim())
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// 在 interactions 完成载荷中定位关注列表
///
/// 依次尝试：`result` 本身是数组；`result.{following,data,results,users}`；
/// 顶层 `{following,data,results,users}`。
fn locate_following_list(payload: &JsonValue) -> Option<&Vec<JsonValue>> {
    const LIST_KEYS: [&str; 4] = ["following", "data", "results", "users"];

    if let Some(result) = payload.get("result") {
        if let Some(list) = result.as_array() {
            return Some(list);
        }
        for key in LIST_KEYS {
            if let Some(list) = result.get(key).and_then(JsonValue::as_array) {
                return Some(list);
            }
        }
    }
    LIST_KEYS
        .iter()
        .find_map(|key| payload.get(*key).and_then(JsonValue::as_array))
}

/// 解析单个平台的关注列表，保持数据源给出的顺序
pub fn extract_following_entries(payload: &JsonValue, source: SocialNetwork) -> Vec<FollowingEntry> {
    let Some(list) = locate_following_list(payload) else {
        debug!("{} 关注载荷中没有找到列表", source);
        return Vec::new();
    };
    let entries: Vec<FollowingEntry> = list
        .iter()
        .filter_map(|item| FollowingEntry::from_value(item, source))
        .collect();
    debug!(
        "{} 关注列表: 原始 {} 条，解析 {} 条",
        source,
        list.len(),
        entries.len()
    );
    entries
}

/// 合并两个平台的关注列表：twitter 在前，instagram 追加在后
pub fn merge_following(result: &ResearchResult) -> Vec<FollowingEntry> {
    let mut merged = Vec::new();
    for network in SocialNetwork::ALL {
        let payload = match network {
            SocialNetwork::Twitter => result.twitter_following.as_ref(),
            SocialNetwork::Instagram => result.instagram_following.as_ref(),
        };
        if let Some(payload) = payload {
            merged.extend(extract_following_entries(payload, network));
        }
    }
    merged
}

/// 关注列表的一个分析批次
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisBatch {
    /// 批次序号（从 0 开始）
    pub index: usize,
    /// 批次总数
    pub total: usize,
    pub entries: Vec<FollowingEntry>,
}

/// 按固定窗口大小切分，保持原有顺序
pub fn partition_batches(entries: Vec<FollowingEntry>, window: usize) -> Vec<AnalysisBatch> {
    let window = window.max(1);
    let total = entries.len().div_ceil(window);
    let mut batches = Vec::with_capacity(total);
    let mut iter = entries.into_iter().peekable();
    let mut index = 0;

    while iter.peek().is_some() {
        let chunk: Vec<FollowingEntry> = iter.by_ref().take(window).collect();
        batches.push(AnalysisBatch {
            index,
            total,
            entries: chunk,
        });
        index += 1;
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::research::ResearchSlot;
    use serde_json::json;

    fn entry(handle: &str) -> FollowingEntry {
        FollowingEntry {
            handle: Some(handle.to_string()),
            display_name: None,
            followers_count: None,
            bio: None,
            verified: false,
            profile_url: None,
            source: SocialNetwork::Twitter,
        }
    }

    #[test]
    fn test_partition_200_into_75_75_50() {
        let entries: Vec<_> = (0..200).map(|i| entry(&format!("user{}", i))).collect();
        let batches = partition_batches(entries, 75);

        let sizes: Vec<usize> = batches.iter().map(|b| b.entries.len()).collect();
        assert_eq!(sizes, vec![75, 75, 50]);
        assert!(batches.iter().all(|b| b.total == 3));
        assert_eq!(batches[1].index, 1);
        assert_eq!(batches[1].entries[0].handle.as_deref(), Some("user75"));
        assert_eq!(batches[2].entries[49].handle.as_deref(), Some("user199"));
    }

    #[test]
    fn test_partition_empty_and_zero_window() {
        assert!(partition_batches(Vec::new(), 75).is_empty());
        let batches = partition_batches(vec![entry("a"), entry("b")], 0);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_extract_aliases_and_url_handle() {
        let payload = json!({
            "status": "completed",
            "result": {
                "following": [
                    {"screen_name": "jack", "name": "Jack", "followers_count": "6.5M", "verified": true},
                    {"url": "https://x.com/elonmusk", "description": "rockets"},
                    "garbage",
                    {"username": "pg", "follower_count": 1900000}
                ]
            }
        });

        let entries = extract_following_entries(&payload, SocialNetwork::Twitter);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].handle.as_deref(), Some("jack"));
        assert_eq!(entries[0].followers_count, Some(6_500_000));
        assert!(entries[0].verified);
        assert_eq!(entries[1].handle.as_deref(), Some("elonmusk"));
        assert_eq!(entries[1].bio.as_deref(), Some("rockets"));
        assert_eq!(entries[2].followers_count, Some(1_900_000));
    }

    #[test]
    fn test_merge_is_twitter_then_instagram() {
        let mut result = ResearchResult::default();
        result.fill(
            ResearchSlot::InstagramFollowing,
            json!({"result": [{"username": "ig1"}, {"username": "ig2"}]}),
        );
        result.fill(
            ResearchSlot::TwitterFollowing,
            json!({"data": [{"username": "tw1"}]}),
        );

        let merged = merge_following(&result);
        let handles: Vec<_> = merged.iter().filter_map(|e| e.handle.clone()).collect();
        assert_eq!(handles, vec!["tw1", "ig1", "ig2"]);
        assert_eq!(merged[0].source, SocialNetwork::Twitter);
        assert_eq!(merged[2].source, SocialNetwork::Instagram);
    }

    #[test]
    fn test_handle_from_url() {
        assert_eq!(handle_from_url("https://twitter.com/jack/").as_deref(), Some("jack"));
        assert_eq!(
            handle_from_url("https://www.instagram.com/nasa?hl=en").as_deref(),
            Some("nasa")
        );
        assert_eq!(handle_from_url("https://example.com/jack"), None);
    }
}
