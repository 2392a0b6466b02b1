//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 把收集到的数据变成一份报告，是"map-reduce"的调度中心。
//!
//! ## 模块划分
//!
//! ### `batch_analyzer` - 分批分析器
//! - 切分关注列表（每批 75 条）
//! - 控制并发数量（Semaphore）
//! - 按批次序号还原输出顺序
//!
//! ### `synthesizer` - 最终汇总
//! - 组装画像、分析结果与文章
//! - 一次生成调用产出报告
//!
//! ### `dossier` - 流水线与程序化入口
//! - 无数据时短路
//! - `research_person` 串起流程层与编排层
//!
//! ## 层次关系
//!
//! ```text
//! dossier (research_person)
//!     ↓
//! workflow::ResearchFlow (收集数据)   batch_analyzer / synthesizer (生成报告)
//!     ↓                                  ↓
//! services (JobPoller)               services (LlmService, prompts)
//!     ↓                                  ↓
//! clients (ProviderClient)           clients (TextGenerator 后端)
//! ```

pub mod batch_analyzer;
pub mod dossier;
pub mod synthesizer;

pub use batch_analyzer::BatchAnalyzer;
pub use dossier::{
    generate_dossier, research_person, DossierPipeline, ResearchOptions, ResearchReport,
};
pub use synthesizer::Synthesizer;
