pub mod factory;
pub mod openai;

pub use factory::{DEFAULT_PROVIDER, create_provider, provider_names};
pub use openai::OpenAIProvider;
