//! # trigger-cli
//!
//! `lore` binary: loads a world book or role-memory file, runs one message through the
//! engine and prints what would be injected. Config comes from `TRIGGER_*` env vars,
//! with per-run overrides from the command line.

pub mod cli;

pub use cli::{Cli, Commands, TurnArgs};

use anyhow::{Context, Result};
use tracing::info;
use trigger::{
    ConversationContext, EntryPayload, HistoryMessage, InjectionResult, MatchStrategy,
    TriggerConfig, TriggerEngine,
};
use trigger_loader::{
    load_from_repository, EntryRepository, RoleMemoryFileRepository, ToTriggerEntry,
    WorldBookFileRepository,
};

/// Runs the parsed command, writing to stdout.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inject { world_book, turn } => {
            let out = inject(&WorldBookFileRepository::new(world_book), &turn).await?;
            println!("{}", out);
        }
        Commands::Recall { memories, turn } => {
            let out = inject(&RoleMemoryFileRepository::new(memories), &turn).await?;
            println!("{}", out);
        }
        Commands::List { world_book } => {
            let mut engine = TriggerEngine::new(TriggerConfig::from_env()?);
            load_from_repository(&mut engine, &WorldBookFileRepository::new(world_book)).await?;
            println!("{:<8} {:<9} {:<8} {}", "id", "priority", "constant", "keys");
            println!("{}", "-".repeat(60));
            for e in engine.entries() {
                println!(
                    "{:<8} {:<9} {:<8} {}",
                    e.id,
                    e.priority,
                    e.is_constant,
                    e.primary_keys.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Builds the config from env plus `turn` overrides.
pub fn build_config(turn: &TurnArgs) -> Result<TriggerConfig> {
    let mut config = TriggerConfig::from_env().context("Load TRIGGER_* config from env")?;
    if let Some(strategy) = &turn.strategy {
        config.matching.match_strategy = strategy
            .parse::<MatchStrategy>()
            .map_err(|e| anyhow::anyhow!("--strategy {}: {}", strategy, e))?;
    }
    if turn.debug {
        config.matching.debug_mode = true;
    }
    if turn.template.is_some() {
        config.injection.template = turn.template.clone();
    }
    Ok(config)
}

/// Builds the conversation context of one turn. History alternates user / assistant,
/// ending with the message before the current one.
pub fn build_context(turn: &TurnArgs) -> ConversationContext {
    let n = turn.history.len();
    let history = turn
        .history
        .iter()
        .enumerate()
        .map(|(i, content)| {
            if (n - i) % 2 == 1 {
                HistoryMessage::assistant(content.clone())
            } else {
                HistoryMessage::user(content.clone())
            }
        })
        .collect();
    let mut ctx = ConversationContext::new(turn.message.clone())
        .with_history(history)
        .with_keywords(turn.keywords.iter().cloned());
    if let Some(topic) = &turn.topic {
        ctx = ctx.with_topic(topic.clone());
    }
    ctx
}

/// Loads `repo` into a fresh engine, processes the turn and formats the result.
pub async fn inject<Repo>(repo: &Repo, turn: &TurnArgs) -> Result<String>
where
    Repo: EntryRepository,
    Repo::Record: ToTriggerEntry,
{
    let mut engine = TriggerEngine::new(build_config(turn)?);
    let loaded = load_from_repository(&mut engine, repo).await?;
    info!(loaded = loaded.loaded, disabled = loaded.disabled, "entries ready");
    let result = engine.process_message(&build_context(turn)).await;
    format_result(&result)
}

/// Formats a result for the terminal.
pub fn format_result<P: EntryPayload>(result: &InjectionResult<P>) -> Result<String> {
    let mut out = String::new();
    if !result.rendered.is_empty() {
        out.push_str(&result.rendered);
    } else {
        if !result.constant_content.is_empty() {
            out.push_str("# Constant\n\n");
            out.push_str(&result.constant_content);
            out.push_str("\n\n");
        }
        if !result.triggered_content.is_empty() {
            out.push_str("# Triggered\n\n");
            out.push_str(&result.triggered_content);
            out.push_str("\n\n");
        }
        if out.is_empty() {
            out.push_str("(nothing injected)\n\n");
        }
        out.push_str(&format!(
            "injected: {}, skipped: {}, took: {:?}",
            result.injected_count, result.skipped_count, result.duration
        ));
    }
    if let Some(debug) = &result.debug_info {
        out.push_str("\n\n");
        out.push_str(&serde_json::to_string_pretty(debug)?);
    }
    Ok(out)
}
