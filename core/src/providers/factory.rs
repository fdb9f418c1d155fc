use crate::config::Config;
use crate::providers::OpenAIProvider;
use anyhow::{Result, anyhow};

pub const DEFAULT_PROVIDER: &str = "groq";

struct Preset {
    name: &'static str,
    base_url: &'static str,
    model: &'static str,
    env_vars: &'static [&'static str],
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        model: "llama3-70b-8192",
        env_vars: &["GROQ_API_KEY", "LOOPBOT_GROQ_API_KEY"],
    },
    Preset {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        model: "gpt-4o",
        env_vars: &["OPENAI_API_KEY", "LOOPBOT_OPENAI_API_KEY"],
    },
    Preset {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        model: "meta-llama/llama-3.3-70b-instruct",
        env_vars: &["OPENROUTER_API_KEY", "LOOPBOT_OPENROUTER_API_KEY"],
    },
];

pub fn provider_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

pub fn create_provider(config: &Config) -> Result<OpenAIProvider> {
    create_provider_with_env(config, |var| std::env::var(var).ok())
}

fn create_provider_with_env(
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<OpenAIProvider> {
    let provider_name = config
        .provider
        .as_deref()
        .unwrap_or(DEFAULT_PROVIDER)
        .to_lowercase();

    let preset = PRESETS
        .iter()
        .find(|p| p.name == provider_name)
        .ok_or_else(|| {
            anyhow!(
                "Unknown provider: {}. Available: {}",
                provider_name,
                provider_names().join(", ")
            )
        })?;

    let api_key = resolve_api_key_with_fallback(preset.env_vars, &config.api_key, env)?;

    Ok(OpenAIProvider::new(api_key)
        .with_name(preset.name)
        .with_model(config.model.as_deref().unwrap_or(preset.model))
        .with_base_url(config.base_url.as_deref().unwrap_or(preset.base_url))
        .with_temperature(config.temperature))
}

fn resolve_api_key_with_fallback(
    env_vars: &[&str],
    config_key: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(key) = env_vars
        .iter()
        .filter_map(|&var| env(var))
        .find(|key| !key.trim().is_empty())
    {
        return Ok(key);
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found. Set {} or run 'loopbot onboard'.",
            env_vars.join(" or ")
        ))
    }
}
