use clap::Parser;

use crate::config::ClientConfig;

#[derive(Parser)]
#[command(name = "debate-client")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat against a turn-based AI debate backend")]
pub struct Args {
    /// Discussion topic for a new session
    #[arg(required_unless_present = "resume")]
    pub topic: Option<String>,

    /// Agent persona to debate with (critic, advocate, why, socratic)
    #[arg(long)]
    pub agent: Option<String>,

    /// Attach to an existing session instead of creating one
    #[arg(long, value_name = "SESSION_ID")]
    pub resume: Option<String>,

    /// Base URL of the session API (overrides DEBATE_API_BASE)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Delay between rendered tokens, in milliseconds (0 = instant)
    #[arg(long, default_value = "30")]
    pub pace_ms: u64,
}

/// Display name and badge for an agent tag. Unknown tags fall back to the
/// generic assistant.
pub fn agent_display(agent: Option<&str>) -> (&'static str, &'static str) {
    match agent {
        Some("critic") => ("Critic", "🧐"),
        Some("advocate") => ("Advocate", "🤝"),
        Some("why") => ("Why", "❓"),
        Some("socratic") => ("Socratic", "🤔"),
        _ => ("Assistant", "🤖"),
    }
}

/// Build the client config from the CLI override, the environment, or the
/// local default, in that order.
pub fn resolve_config(args: &Args) -> ClientConfig {
    match &args.base_url {
        Some(url) => ClientConfig::new(url.clone()),
        None => ClientConfig::from_env(),
    }
}
