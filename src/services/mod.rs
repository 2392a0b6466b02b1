pub mod job_poller;
pub mod llm_service;
pub mod prompts;

pub use job_poller::JobPoller;
pub use llm_service::{LlmBackend, LlmService};
