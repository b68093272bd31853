pub mod llm_client;

pub use llm_client::{classify_api_error, LlmClient, TextModel};
