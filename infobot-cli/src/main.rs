//! infobot CLI: chat, one-shot send, upload, show and list items and conversations. Config from env.
//!
//! Only chat, send and upload build the LLM client; the rest work without an API key.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use conversation::{CycleError, CycleOutcome};
use infobot_cli::{open_store, App, AppConfig, Cli, Commands, UploadInput};
use infobot_core::{
    init_tracing, ContentSource, StoredInformationItem, Turn, DEFAULT_CONVERSATION_TITLE,
};
use llm_client::LlmConfig;
use std::io::Write;
use storage::ConversationStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(config.log_file.as_deref())?;

    if !cli.command.needs_model() {
        let store = open_store(&config).await?;
        return run_store_command(store.as_ref(), cli.command).await;
    }

    let llm_config = LlmConfig::from_env()?;
    let app = App::build(&config, &llm_config).await?;

    match cli.command {
        Commands::Chat { user, conversation } => handle_chat(&app, user, conversation).await,
        Commands::Send {
            user,
            conversation,
            message,
        } => {
            let outcome = app
                .orchestrator
                .handle_message(user, &conversation, &message, &CancellationToken::new())
                .await?;
            print_outcome(&outcome);
            Ok(())
        }
        Commands::Upload {
            user,
            conversation,
            input,
        } => handle_upload(&app, user, conversation.as_deref(), input).await,
        other => run_store_command(app.store.as_ref(), other).await,
    }
}

/// Commands that only read or write the store.
async fn run_store_command(store: &dyn ConversationStore, command: Commands) -> Result<()> {
    match command {
        Commands::Items { user, category } => {
            let items = store.list_information_items(user, category).await?;
            if items.is_empty() {
                println!("No information items.");
            }
            for stored in &items {
                print_item_line(stored);
            }
            Ok(())
        }
        Commands::Item { user, item_id } => {
            let stored = store
                .get_information_item(user, &item_id)
                .await?
                .with_context(|| format!("Information item not found: {}", item_id))?;
            println!("id:       {}", stored.id);
            println!("title:    {}", stored.item.title);
            println!("category: {}", stored.item.category.as_str());
            println!("type:     {}", stored.item.content_type);
            println!("created:  {}", stored.created_at.format("%Y-%m-%d %H:%M:%S"));
            if let Some(conversation_id) = &stored.conversation_id {
                println!("conversation: {}", conversation_id);
            }
            println!("\n{}", stored.item.description);
            println!("\nsource:\n{}", stored.item.source_content);
            Ok(())
        }
        Commands::Conversation {
            user,
            conversation_id,
        } => {
            let conversation = store
                .get_conversation(&conversation_id)
                .await?
                .filter(|c| c.user_id == user)
                .with_context(|| format!("Conversation not found: {}", conversation_id))?;
            println!("{}  {}", conversation.id, conversation.title);
            println!(
                "created {}  updated {}",
                conversation.created_at.format("%Y-%m-%d %H:%M"),
                conversation.updated_at.format("%Y-%m-%d %H:%M")
            );
            let items = store.list_conversation_items(&conversation.id).await?;
            if items.is_empty() {
                println!("No information items.");
            }
            for stored in &items {
                print_item_line(stored);
            }
            Ok(())
        }
        Commands::Conversations { user, range } => {
            let since = range.map(|r| Utc::now() - Duration::days(r.days()));
            let conversations = store.list_conversations(user, since).await?;
            if conversations.is_empty() {
                println!("No conversations.");
            }
            for c in &conversations {
                println!(
                    "{}  {}  {}",
                    c.id,
                    c.updated_at.format("%Y-%m-%d %H:%M"),
                    c.title
                );
            }
            Ok(())
        }
        Commands::NewConversation { user } => {
            let conversation = store
                .create_conversation(user, DEFAULT_CONVERSATION_TITLE)
                .await?;
            println!("{}", conversation.id);
            Ok(())
        }
        Commands::Chat { .. } | Commands::Send { .. } | Commands::Upload { .. } => {
            anyhow::bail!("This command needs the LLM client")
        }
    }
}

fn print_item_line(stored: &StoredInformationItem) {
    println!(
        "[{}] {:<10} {}  {}\n    {}",
        stored.created_at.format("%Y-%m-%d %H:%M"),
        stored.item.category.as_str(),
        stored.item.title,
        stored.id,
        stored.item.description.replace('\n', " ")
    );
}

fn print_turn(turn: &Turn) {
    println!(
        "[{}] {}: {}",
        turn.created_at.format("%H:%M:%S"),
        turn.role,
        turn.content
    );
}

fn print_outcome(outcome: &CycleOutcome) {
    print_turn(&outcome.user_turn);
    print_turn(&outcome.assistant_turn);
}

async fn handle_upload(
    app: &App,
    user: i64,
    conversation: Option<&str>,
    input: UploadInput,
) -> Result<()> {
    let stored = match (input.text, input.file) {
        (Some(text), _) => {
            app.uploads
                .process(user, conversation, ContentSource::Text(text))
                .await?
        }
        (None, Some(path)) => app.uploads.process_file(user, conversation, &path).await?,
        (None, None) => anyhow::bail!("Either --text or --file is required"),
    };
    println!("Saved {} item(s):", stored.len());
    for s in &stored {
        println!("  {:<10} {}  ({})", s.item.category.as_str(), s.item.title, s.id);
    }
    Ok(())
}

/// 交互式对话：每行一条消息，Ctrl-C 取消当前回复，空行或 EOF 退出。
async fn handle_chat(app: &App, user: i64, conversation: Option<String>) -> Result<()> {
    let conversation_id = match conversation {
        Some(id) => id,
        None => {
            let created = app
                .store
                .create_conversation(user, DEFAULT_CONVERSATION_TITLE)
                .await?;
            println!("Conversation: {}", created.id);
            created.id
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("Flush stdout")?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }

        let cancel = CancellationToken::new();
        let cycle = app
            .orchestrator
            .handle_message(user, &conversation_id, &line, &cancel);
        tokio::pin!(cycle);

        let result = tokio::select! {
            result = &mut cycle => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                cycle.await
            }
        };

        match result {
            Ok(outcome) => println!("{}", outcome.assistant_turn.content),
            Err(CycleError::Cancelled) => println!("(cancelled)"),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
