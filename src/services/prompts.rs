//! 提示词构建
//!
//! 分批分析与最终汇总两类提示词。输入中缺失的部分用固定占位文本代替。

use serde_json::Value as JsonValue;

use crate::models::{AnalysisBatch, PersonContext};

/// 没有 enrichment 数据时的占位文本
pub const NO_ENRICHMENT: &str = "No enrichment data available.";
/// 没有任何分批分析结果时的占位文本
pub const NO_FOLLOWING_ANALYSIS: &str = "No following data analyzed.";
/// 没有文章数据时的占位文本
pub const NO_ARTICLES: &str = "No articles found.";
/// 多段分批分析之间的分隔符
pub const ANALYSIS_SEPARATOR: &str = "\n\n---\n\n";

/// 构建单个批次的关注列表分析提示词
///
/// # 参数
/// - `context`: 被调研人物的姓名、职位、公司
/// - `batch`: 当前批次（含序号与总数）
pub fn batch_analysis_prompt(context: &PersonContext, batch: &AnalysisBatch) -> String {
    let entries_json = serde_json::to_string_pretty(&batch.entries).unwrap_or_default();

    format!(
        r#"You are analyzing a slice of the accounts that {name} follows on social media.

SUBJECT:
- Name: {name}
- Role: {role}
- Company: {company}

This is batch {current} of {total}, containing {count} accounts.

For this batch:
1. Cluster the accounts into categories (VCs, Founders, Tech, Media, Sports, Personal, etc.)
2. Name the most notable accounts with their follower counts
3. Flag unexpected follows that reveal personal interests or hobbies
4. Flag low-follower accounts that suggest personal relationships
5. Note what the pattern says about the subject's interests and values

Attribute every observation to specific accounts [Source: @handle].

ACCOUNTS (JSON):
{entries}

Write the analysis for batch {current} of {total} now:"#,
        name = context.name,
        role = context.role,
        company = context.company,
        current = batch.index + 1,
        total = batch.total,
        count = batch.entries.len(),
        entries = entries_json,
    )
}

/// 构建最终汇总提示词
///
/// # 参数
/// - `enrichment`: 画像数据，缺失时使用占位文本
/// - `analyses`: 按批次顺序排列的分析结果，为空时使用占位文本
/// - `articles`: 文章数据，缺失时使用占位文本
pub fn synthesis_prompt(
    enrichment: Option<&JsonValue>,
    analyses: &[String],
    articles: Option<&JsonValue>,
) -> String {
    let enrichment = enrichment
        .map(pretty_json)
        .unwrap_or_else(|| NO_ENRICHMENT.to_string());
    let following = if analyses.is_empty() {
        NO_FOLLOWING_ANALYSIS.to_string()
    } else {
        analyses.join(ANALYSIS_SEPARATOR)
    };
    let articles = articles
        .map(pretty_json)
        .unwrap_or_else(|| NO_ARTICLES.to_string());

    format!(
        r#"You are an elite intelligence analyst. Create an exhaustive, deeply researched dossier on this person.

RULES:
1. EVERY insight MUST be attributed to a specific data point [Source: ...]
2. Be specific - use exact quotes, dates, company names, follower counts
3. Focus on insights that show deep research, not surface facts
4. Include conversation starters that reference specific posts, follows or articles
5. The following analysis below was produced batch by batch; merge its clusters into one view

STRUCTURE:
## 1. IDENTITY SNAPSHOT
- Full name, nicknames, current role, locations, age estimate

## 2. CAREER DNA
- Complete trajectory with timeline
- What they are known for

## 3. PSYCHOGRAPHIC PROFILE (from following)
- Core archetypes (Builder, Intellectual, Networker, etc.)
- Interests and values inferred from who they follow
- Cluster analysis of followed accounts

## 4. HIDDEN INTERESTS
- Unexpected follows revealing personal interests
- Low-follower accounts (personal relationships)

## 5. KEY INFLUENCERS THEY FOLLOW
- Top 15 most notable accounts with follower counts

## 6. CONTENT ANALYSIS (from posts and articles)
- Topics, tone and style
- Recent wins and frustrations

## 7. CONVERSATION STARTERS
15+ specific hooks based on their follows, posts and career

## 8. WARNINGS & LANDMINES
- Topics to avoid

## 9. NON-OBVIOUS INSIGHTS
- Unusual patterns most people miss

=== PROFILE DATA ===
{enrichment}

=== FOLLOWING ANALYSIS ===
{following}

=== ARTICLES & PRESS ===
{articles}

Create the dossier now:"#
    )
}

fn pretty_json(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FollowingEntry, SocialNetwork};
    use serde_json::json;

    #[test]
    fn test_synthesis_prompt_uses_sentinels_for_missing_parts() {
        let prompt = synthesis_prompt(None, &[], None);
        assert!(prompt.contains(NO_ENRICHMENT));
        assert!(prompt.contains(NO_FOLLOWING_ANALYSIS));
        assert!(prompt.contains(NO_ARTICLES));
    }

    #[test]
    fn test_synthesis_prompt_joins_analyses_in_order() {
        let analyses = vec!["first".to_string(), "second".to_string()];
        let enrichment = json!({"result": {"firstname": "Jane"}});
        let prompt = synthesis_prompt(Some(&enrichment), &analyses, None);

        assert!(prompt.contains("first\n\n---\n\nsecond"));
        assert!(prompt.contains("\"firstname\": \"Jane\""));
        assert!(!prompt.contains(NO_FOLLOWING_ANALYSIS));
        assert!(!prompt.contains(NO_ENRICHMENT));
    }

    #[test]
    fn test_batch_prompt_carries_context_and_position() {
        let context = PersonContext {
            name: "Jane Doe".to_string(),
            role: "CTO".to_string(),
            company: "Acme".to_string(),
        };
        let batch = AnalysisBatch {
            index: 1,
            total: 3,
            entries: vec![FollowingEntry {
                handle: Some("rustlang".to_string()),
                display_name: Some("Rust Language".to_string()),
                followers_count: Some(1_200_000),
                bio: None,
                verified: true,
                profile_url: None,
                source: SocialNetwork::Twitter,
            }],
        };

        let prompt = batch_analysis_prompt(&context, &batch);
        assert!(prompt.contains("batch 2 of 3"));
        assert!(prompt.contains("Role: CTO"));
        assert!(prompt.contains("\"handle\": \"rustlang\""));
        assert!(prompt.contains("\"source\": \"twitter\""));
    }
}
