pub mod research_flow;

pub use research_flow::ResearchFlow;
