pub mod llm_client;
pub mod provider_client;

pub use llm_client::{AnthropicBackend, OpenAiCompatibleBackend, TextGenerator};
pub use provider_client::{HttpTransport, ProviderClient, ProviderTransport, SubmitError};
