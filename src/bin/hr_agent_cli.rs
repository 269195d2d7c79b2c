//! HR Agent Command Line Interface
//!
//! Interactive REPL over the agent. The conversation state returned by each
//! answer is carried into the next line, so slot-filling dialogues work the
//! same way they do over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Interactive session (in-memory store unless DATABASE_URL is set)
//! hr_agent_cli
//!
//! # One-shot query, JSON envelope on stdout
//! hr_agent_cli --query "listar regiones" --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use hr_agent::{store, AgentConfig, HrAgent};
use hr_types::{ConversationState, ResponseEnvelope, ResponseType};

#[derive(Parser)]
#[command(name = "hr_agent_cli")]
#[command(version)]
#[command(about = "Ask the HR agent questions in Spanish")]
struct Cli {
    /// Run a single query and exit
    #[arg(long, short)]
    query: Option<String>,

    /// Print the raw response envelope as JSON
    #[arg(long)]
    json: bool,

    /// Alternative vocabulary file (overrides HR_AGENT_LEXICON)
    #[arg(long, env = "HR_AGENT_LEXICON")]
    lexicon: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AgentConfig::from_env().context("invalid configuration")?;
    if cli.lexicon.is_some() {
        config.lexicon_path = cli.lexicon;
    }
    let lexicon = config.load_lexicon().context("failed to load vocabulary")?;
    let store = store::connect(&config, &lexicon)
        .await
        .context("failed to open record store")?;
    let agent = HrAgent::new(lexicon, store).with_result_limit(config.result_limit);

    if let Some(query) = cli.query {
        let envelope = agent.process(&query, ConversationState::default()).await;
        print_envelope(&envelope, cli.json)?;
        return Ok(());
    }

    repl(&agent, cli.json).await
}

async fn repl(agent: &HrAgent, json: bool) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut state = ConversationState::default();

    println!("{}", "HR agent - escribe una consulta (Ctrl+D para salir)".bold());

    loop {
        let prompt = if state.is_active() { "...> " } else { "hr> " };
        match editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() && !state.is_active() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(line) {
                    tracing::debug!(error = %e, "history entry not recorded");
                }

                let envelope = agent.process(line, std::mem::take(&mut state)).await;
                print_envelope(&envelope, json)?;
                state = envelope.conversation_state;
            }
            Err(ReadlineError::Interrupted) => {
                if state.is_active() {
                    println!("{}", "Diálogo cancelado".yellow());
                    state = ConversationState::default();
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn print_envelope(envelope: &ResponseEnvelope, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(envelope)?);
        return Ok(());
    }

    let text = envelope.agent_text.replace("**", "");
    match envelope.response_type {
        ResponseType::Error => println!("{} {}", "ERROR:".red().bold(), text.red()),
        ResponseType::DialogNeeded => println!("{} {}", "?".yellow().bold(), text),
        ResponseType::Status => println!("{} {}", "-".cyan().bold(), text),
        ResponseType::QueryResult | ResponseType::QuerySuccess => {
            println!("{} {}", "OK".green().bold(), text)
        }
    }

    if let Some(sql) = &envelope.sql_statement {
        println!("  {}", sql.dimmed());
    }

    for row in envelope.data.iter().flatten() {
        let cells: Vec<String> = row
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{}={}", key.bold(), s),
                other => format!("{}={}", key.bold(), other),
            })
            .collect();
        println!("  {}", cells.join("  "));
    }

    Ok(())
}
