use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;
use colored::*;
use futures_util::FutureExt;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use debate_client::api::{Role, SessionApi, SessionId};
use debate_client::cli::{agent_display, resolve_config, Args};
use debate_client::{AgentMode, Conversation};

fn print_header(topic: Option<&str>, agent: Option<&str>, session: &SessionId, base_url: &str) {
    let (name, badge) = agent_display(agent);
    println!("{}", "DEBATE CLIENT".bright_cyan().bold());
    if let Some(topic) = topic {
        println!("{}: {}", "Topic".bright_yellow(), topic.bright_white());
    }
    println!("{}: {} {}", "Agent".bright_yellow(), badge, name);
    println!("{}: {}", "Session".bright_yellow(), session);
    println!("{}: {}", "Backend".bright_yellow(), base_url);
    println!("{}", "=".repeat(50).bright_blue());
    println!("{}", "Type your argument. /quit to leave.".bright_black());
    println!();
}

fn print_finished(role: Role, content: &str, agent: Option<&str>) {
    match role {
        Role::User => println!("{} {}", "you ❯".bright_green().bold(), content),
        Role::Assistant => {
            let (name, badge) = agent_display(agent);
            println!(
                "{} {} {}",
                badge,
                format!("{name} ❯").bright_cyan().bold(),
                content
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args);
    let base_url = config.base_url.clone();
    let api = SessionApi::new(config);

    let mut conversation = match &args.resume {
        Some(id) => {
            let mode = AgentMode::from_agent_type(args.agent.as_deref());
            Conversation::attach(api, SessionId::new(id.clone()), mode).await
        }
        None => {
            let topic = args.topic.as_deref().unwrap_or_default();
            Conversation::open(api, topic, args.agent.as_deref())
                .await
                .map_err(|e| format!("could not create a session: {e}"))?
        }
    };
    conversation.pace = Duration::from_millis(args.pace_ms);

    let (tx, rx) = mpsc::unbounded_channel();
    conversation.token_tx = Some(tx);
    let mut tokens = UnboundedReceiverStream::new(rx);

    print_header(
        args.topic.as_deref(),
        args.agent.as_deref(),
        conversation.session(),
        &base_url,
    );

    // Replay whatever the log already holds: greeting or loaded history.
    for msg in conversation.store().messages() {
        print_finished(msg.role, &msg.content, args.agent.as_deref());
    }
    println!();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you ❯".bright_green().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }

        let (name, badge) = agent_display(args.agent.as_deref());
        print!("{} {} ", badge, format!("{name} ❯").bright_cyan().bold());
        io::stdout().flush()?;

        // Render tokens live while the turn runs, then drain the stragglers
        // that were still queued when it completed.
        {
            let turn = conversation.send_turn(input);
            tokio::pin!(turn);
            let mut finished = false;
            while !finished {
                tokio::select! {
                    _ = &mut turn => finished = true,
                    Some(ev) = tokens.next() => {
                        print!("{}", ev.text);
                        io::stdout().flush()?;
                    }
                }
            }
        }
        while let Some(Some(ev)) = tokens.next().now_or_never() {
            print!("{}", ev.text);
        }
        io::stdout().flush()?;
        println!("\n");
    }

    println!("{}", "The session lives on the server; resume it any time with --resume.".bright_black());
    Ok(())
}
