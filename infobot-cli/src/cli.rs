//! CLI parser.

use clap::{Args, Parser, Subcommand, ValueEnum};
use infobot_core::Category;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "infobot")]
#[command(about = "Personal information assistant: chat, extract and categorize information", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat; creates a conversation when none is given. Ctrl-C cancels the pending reply.
    Chat {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long)]
        conversation: Option<String>,
    },
    /// Send one message and print both turns.
    Send {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long)]
        conversation: String,
        message: String,
    },
    /// Extract and store information items from text or a file (png, jpg, jpeg, gif, txt).
    Upload {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long)]
        conversation: Option<String>,
        #[command(flatten)]
        input: UploadInput,
    },
    /// List stored information items, newest first.
    Items {
        #[arg(short, long)]
        user: i64,
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Show one stored information item.
    Item {
        #[arg(short, long)]
        user: i64,
        item_id: String,
    },
    /// Show one conversation and the items extracted from it, oldest first.
    Conversation {
        #[arg(short, long)]
        user: i64,
        conversation_id: String,
    },
    /// List conversations, most recently active first.
    Conversations {
        #[arg(short, long)]
        user: i64,
        #[arg(long, value_enum)]
        range: Option<TimeRange>,
    },
    /// Create an empty conversation and print its id.
    NewConversation {
        #[arg(short, long)]
        user: i64,
    },
}

impl Commands {
    /// Whether the command calls the model (and so needs an API key).
    pub fn needs_model(&self) -> bool {
        matches!(
            self,
            Commands::Chat { .. } | Commands::Send { .. } | Commands::Upload { .. }
        )
    }
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct UploadInput {
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    #[value(name = "7days")]
    SevenDays,
    #[value(name = "30days")]
    ThirtyDays,
}

impl TimeRange {
    pub fn days(self) -> i64 {
        match self {
            TimeRange::SevenDays => 7,
            TimeRange::ThirtyDays => 30,
        }
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse::<Category>().map_err(|e| e.to_string())
}
