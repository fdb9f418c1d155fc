use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Password, Select};
use loopbot_core::config::Config;
use loopbot_core::providers;
use std::path::Path;

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<String> {
    let names = providers::provider_names();
    let selection = Select::new()
        .with_prompt("Select your provider")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(names[selection].to_string())
}

fn setup_api_key(provider: &str) -> Result<String> {
    let api_key: String = Password::new()
        .with_prompt(format!(
            "Enter your {} API key (leave empty to use the environment)",
            provider
        ))
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key")?;

    Ok(api_key.trim().to_string())
}

fn setup_model() -> Result<Option<String>> {
    let model: String = Input::new()
        .with_prompt("Model (leave empty for the provider default)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read model")?;

    let model = model.trim();
    Ok((!model.is_empty()).then(|| model.to_string()))
}

pub fn run_onboard() -> Result<Config> {
    println!("  {}", style("Welcome to loopbot!").white().bold());
    println!(
        "  {}",
        style("This wizard writes the provider settings used by ask, chat and react.").dim()
    );

    print_step(1, 3, "Provider");
    let provider = setup_provider()?;

    print_step(2, 3, "API Key");
    let api_key = setup_api_key(&provider)?;

    print_step(3, 3, "Model");
    let model = setup_model()?;

    let config = Config {
        provider: Some(provider),
        api_key,
        model,
        ..Default::default()
    };

    Ok(config)
}

/// Printed once the config has actually been written to `path`.
pub fn print_saved(path: &Path) {
    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!("{}", saved_line(path));
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("loopbot chat").cyan().bold()
    );
    println!();
}

fn saved_line(path: &Path) -> String {
    format!(
        "  {} Config saved to {}",
        style("→").green(),
        style(path.display()).cyan()
    )
}
