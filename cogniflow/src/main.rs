//! cogniflow - browser tab productivity tracker
//!
//! Command-line access to the tracker state: focus mode, goal, categories,
//! rules, the review queue, workspaces and score history. `replay` feeds a
//! recorded browser event log through the engine.

mod output;
mod replay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cogniflow_core::{
    Category, ClassifierAdapter, Clock, Command, CommandResponse, Config, Engine, HttpClassifier,
    InMemoryDirectory, KeyValueStore, SqliteStore, SystemClock,
};

#[derive(Parser)]
#[command(name = "cogniflow")]
#[command(about = "Tab categorization, focus scoring and workspaces")]
#[command(version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show focus mode, goal and tracking summary
    Status,
    /// Focus mode
    Focus {
        #[command(subcommand)]
        action: FocusAction,
    },
    /// Session goal
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },
    /// Base and custom categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// URL categorization rules
    Rules {
        #[command(subcommand)]
        action: RuleAction,
    },
    /// Low-confidence classifications awaiting confirmation
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Named groups of URLs
    Workspaces {
        #[command(subcommand)]
        action: WorkspaceAction,
    },
    /// Past session scores
    History {
        /// Show only the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Feed a recorded event log (JSON lines) through the engine and score it
    Replay {
        /// Event log, one `{"at": ..., "event": {...}}` or `{"command": {...}}` per line
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum FocusAction {
    Toggle,
}

#[derive(Subcommand)]
enum GoalAction {
    /// Set the goal; an empty string clears it
    Set { goal: String },
}

#[derive(Subcommand)]
enum CategoryAction {
    List,
    Add { name: String },
}

#[derive(Subcommand)]
enum RuleAction {
    List,
    /// Add or update a rule
    Add { pattern: String, category: String },
}

#[derive(Subcommand)]
enum ReviewAction {
    List,
    /// Confirm a category; also creates a rule for the URL's domain
    Resolve { url: String, category: String },
}

#[derive(Subcommand)]
enum WorkspaceAction {
    List,
    Create { name: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        cogniflow_core::logging::init(&config.logging).context("failed to initialize logging")?;

    if let Commands::Replay { file } = &cli.command {
        return replay::run(config, file, cli.json).await;
    }

    // Open database
    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let store = SqliteStore::open(&db_path).context("failed to open database")?;

    let engine = build_engine(
        Arc::new(store),
        Arc::new(InMemoryDirectory::new()),
        Arc::new(SystemClock),
        config,
    )?;
    run_command(&engine, cli.command, cli.json).await
}

/// Wire an engine to the configured classifier backend.
pub(crate) fn build_engine(
    store: Arc<dyn KeyValueStore>,
    directory: Arc<InMemoryDirectory>,
    clock: Arc<dyn Clock>,
    config: Config,
) -> Result<Engine> {
    let classifier = match HttpClassifier::from_config(&config.classifier)
        .context("failed to create classifier client")?
    {
        Some(http) => ClassifierAdapter::new(Arc::new(http), config.classifier.clone()),
        None => ClassifierAdapter::unavailable(config.classifier.clone()),
    };

    Engine::new(store, directory, classifier, clock, config)
        .context("failed to initialize state")
}

async fn run_command(engine: &Engine, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Status => output::status(engine, json),
        Commands::Focus {
            action: FocusAction::Toggle,
        } => respond(engine, Command::ToggleFocusMode, json).await,
        Commands::Goal {
            action: GoalAction::Set { goal },
        } => respond(engine, Command::SetGoal { goal }, json).await,
        Commands::Categories { action } => match action {
            CategoryAction::List => output::categories(&engine.list_categories()?, json),
            CategoryAction::Add { name } => {
                respond(engine, Command::AddCustomCategory { name }, json).await
            }
        },
        Commands::Rules { action } => match action {
            RuleAction::List => output::rules(&engine.list_rules()?, json),
            RuleAction::Add { pattern, category } => {
                let category = Category::parse(&category);
                respond(engine, Command::AddRule { pattern, category }, json).await
            }
        },
        Commands::Review { action } => match action {
            ReviewAction::List => output::review_queue(&engine.list_review_queue()?, json),
            ReviewAction::Resolve { url, category } => {
                let category = Category::parse(&category);
                respond(engine, Command::ResolveReview { url, category }, json).await
            }
        },
        Commands::Workspaces { action } => match action {
            WorkspaceAction::List => output::workspaces(&engine.list_workspaces()?, json),
            WorkspaceAction::Create { name } => {
                respond(engine, Command::CreateWorkspace { name }, json).await
            }
            WorkspaceAction::Rename { id, name } => {
                let command = Command::RenameWorkspace {
                    workspace_id: id,
                    new_name: name,
                };
                respond(engine, command, json).await
            }
            WorkspaceAction::Delete { id } => {
                respond(engine, Command::DeleteWorkspace { workspace_id: id }, json).await
            }
        },
        Commands::History { limit } => {
            let history = engine.score_history()?;
            let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
            output::history(&history[skip..], json)
        }
        Commands::Replay { file } => anyhow::bail!("replay of {} needs its own engine", file.display()),
    }
}

/// Execute a command and print its response; a failed command is an error exit.
async fn respond(engine: &Engine, command: Command, json: bool) -> Result<()> {
    let response: CommandResponse = engine.execute(command).await;
    output::response(&response, json)?;
    if !response.success {
        anyhow::bail!("{}", response.message);
    }
    Ok(())
}
