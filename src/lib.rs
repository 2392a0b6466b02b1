//! # Deep Research
//!
//! 一个从邮箱 / 社交主页出发，收集人物公开资料并生成调研报告的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持有外部资源（HTTP 连接、API Key），只暴露能力
//! - `ProviderClient` - 数据源任务提交（enrichment / following / articles）
//! - `TextGenerator` - 文本生成后端（Gemini / OpenAI / Anthropic）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个任务
//! - `JobPoller` - 把一个任务轮询到终态
//! - `LlmService` - 按顺序尝试多个后端
//! - `prompts` - 提示词构建
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个人"的数据收集流程
//! - `ResearchFlow` - 第一轮并发 → 补全身份 → 第二轮顺序
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_analyzer` - 关注列表分批并发分析
//! - `orchestrator/synthesizer` - 汇总生成最终报告
//! - `orchestrator/dossier` - 流水线与 `research_person` 入口
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::AppError;
pub use models::{ResearchInput, ResearchResult};
pub use orchestrator::{research_person, ResearchOptions, ResearchReport};
pub use services::LlmBackend;
pub use workflow::ResearchFlow;
