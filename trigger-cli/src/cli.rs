//! CLI parser.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lore")]
#[command(about = "Knowledge-entry trigger CLI: inject, recall, list", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Also append logs to this file.
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one message against a world-book JSON file and print the injection.
    Inject {
        #[arg(short, long)]
        world_book: PathBuf,
        #[command(flatten)]
        turn: TurnArgs,
    },
    /// Run one message against a role-memory JSON file and print the injection.
    Recall {
        #[arg(short, long)]
        memories: PathBuf,
        #[command(flatten)]
        turn: TurnArgs,
    },
    /// List the entries of a world-book JSON file in load order.
    List {
        #[arg(short, long)]
        world_book: PathBuf,
    },
}

/// One conversation turn plus per-run overrides of the env config.
#[derive(Args, Debug, Clone)]
pub struct TurnArgs {
    /// Current message.
    #[arg(short = 'M', long)]
    pub message: String,
    /// Earlier messages, oldest first.
    #[arg(long = "history")]
    pub history: Vec<String>,
    /// Context keywords (tag conditions).
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,
    #[arg(long)]
    pub topic: Option<String>,
    /// Overrides TRIGGER_MATCH_STRATEGY.
    #[arg(short, long)]
    pub strategy: Option<String>,
    /// Print debug info as JSON.
    #[arg(long)]
    pub debug: bool,
    /// Wrap the output in a template using {{content}}, {{constantContent}}, {{triggeredContent}}.
    #[arg(long)]
    pub template: Option<String>,
}
