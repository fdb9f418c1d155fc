use anyhow::Result;
use clap::{Parser, Subcommand};
use loopbot_core::{
    AgentLoop, ChatMessage, ContextBuilder, Conversation, Provider, ToolRegistry, agent, config,
    providers, tools,
};
mod onboard;
mod render;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const EXIT_COMMAND: &str = "exit";
const PROMPT: &str = "Enter: ";

#[derive(Parser)]
#[command(name = "loopbot")]
#[command(about = "loopbot - LLM chat bots and a tool-using agent loop", long_about = None)]
struct Cli {
    /// Provider preset (groq, openai, openrouter); overrides the config file
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model name; overrides the config file
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write ~/.loopbot/config.toml interactively
    Onboard,
    /// Answer one message without memory
    Ask {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Multi-turn conversation with full history; type `exit` to quit
    Chat {
        /// Let the model use the arithmetic tools
        #[arg(long)]
        tools: bool,
    },
    /// Reason+act loop with the arithmetic tools, printing every message
    React {
        #[arg(short, long)]
        message: Option<String>,
        #[arg(long)]
        max_iterations: Option<usize>,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Prompts on `output` and reads one trimmed line; `None` at end of input.
fn read_line(input: &mut impl BufRead, output: &mut impl Write) -> Result<Option<String>> {
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn read_message(message: Option<String>) -> Result<Option<String>> {
    if message.is_some() {
        return Ok(message);
    }
    let line = read_line(&mut io::stdin().lock(), &mut io::stdout())?;
    Ok(line.filter(|line| !line.is_empty()))
}

fn load_config(provider: Option<String>, model: Option<String>) -> Result<config::Config> {
    let mut config = config::Config::load_or_default()?;
    if provider.is_some() {
        config.provider = provider;
    }
    if model.is_some() {
        config.model = model;
    }
    Ok(config)
}

fn build_agent(
    config: &config::Config,
    registry: ToolRegistry,
    prompt: Option<&str>,
) -> Result<AgentLoop> {
    let provider = providers::create_provider(config)?;
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        tools = registry.len(),
        "agent ready"
    );

    let mut context_builder = ContextBuilder::new();
    if let Some(prompt) = config.system_prompt.as_deref().or(prompt) {
        context_builder = context_builder.with_system_prompt(prompt);
    }

    Ok(AgentLoop::new(Arc::new(provider), context_builder, Arc::new(registry))
        .with_max_iterations(config.max_iterations))
}

fn arithmetic_registry() -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_all(tools::arithmetic_tools())?;
    Ok(registry)
}

async fn ask(config: &config::Config, message: Option<String>) -> Result<()> {
    let agent = build_agent(config, ToolRegistry::new(), None)?;

    let Some(message) = read_message(message)? else {
        return Ok(());
    };

    let reply = agent.process(&message).await?;
    render::write_reply(&mut io::stdout(), &reply)?;
    Ok(())
}

async fn chat(config: &config::Config, with_tools: bool) -> Result<()> {
    let registry = if with_tools {
        arithmetic_registry()?
    } else {
        ToolRegistry::new()
    };
    let agent = build_agent(config, registry, None)?;
    let mut conversation = Conversation::new();

    let turns = chat_loop(&agent, &mut conversation, io::stdin().lock(), io::stdout()).await?;
    tracing::debug!(turns, messages = conversation.len(), "chat ended");
    Ok(())
}

/// Runs one turn per input line until `exit` or end of input. Blank lines are
/// skipped. A failed turn is reported and the loop carries on. Returns the
/// number of turns attempted.
async fn chat_loop(
    agent: &AgentLoop,
    conversation: &mut Conversation,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<usize> {
    let mut turns = 0;

    while let Some(line) = read_line(&mut input, &mut output)? {
        if line == EXIT_COMMAND {
            break;
        }
        if line.is_empty() {
            continue;
        }

        turns += 1;
        match agent.respond(conversation, &line).await {
            Ok(reply) => render::write_reply(&mut output, &reply)?,
            Err(e) => eprintln!("❌ Error: {}", e),
        }
    }

    Ok(turns)
}

async fn react(
    config: &config::Config,
    message: Option<String>,
    max_iterations: Option<usize>,
) -> Result<()> {
    let mut agent = build_agent(
        config,
        arithmetic_registry()?,
        Some(agent::DEFAULT_REACT_PROMPT),
    )?;
    if let Some(max) = max_iterations {
        agent = agent.with_max_iterations(max);
    }

    let Some(message) = read_message(message)? else {
        return Ok(());
    };

    let mut conversation = Conversation::new();
    conversation.append(ChatMessage::user(message));
    render::print_message(conversation.last()?);

    agent
        .run_with(&mut conversation, render::print_message)
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat { tools: false }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
            onboard::print_saved(&config::get_config_path());
            Ok(())
        }
        Commands::Ask { message } => {
            let config = load_config(cli.provider, cli.model)?;
            ask(&config, message).await
        }
        Commands::Chat { tools } => {
            let config = load_config(cli.provider, cli.model)?;
            chat(&config, tools).await
        }
        Commands::React {
            message,
            max_iterations,
        } => {
            let config = load_config(cli.provider, cli.model)?;
            react(&config, message, max_iterations).await
        }
    }
}
