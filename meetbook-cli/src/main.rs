mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::Context;

const DEFAULT_LOG_FILTER: &str = "meetbook=info,meetbook_core=info";

#[derive(Parser)]
#[command(name = "meetbook")]
#[command(about = "Browse, edit and sync meetings from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and draft store paths
    Config {
        /// Persist a new API base URL to the config file
        #[arg(long)]
        set_api_url: Option<String>,
    },
    /// Month (or week) calendar view
    Calendar {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Show the week containing this date instead (YYYY-MM-DD)
        #[arg(short, long, conflicts_with = "month")]
        week: Option<String>,
    },
    /// List meetings by page or by month
    List {
        /// Page number (1-based)
        #[arg(short, long, conflicts_with = "month")]
        page: Option<u32>,

        /// Month to list (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Only meetings whose title contains this text
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Show one meeting
    Show { id: String },
    /// Create a meeting
    New {
        title: Option<String>,

        /// Start (e.g. "2024-03-01T09:00"), defaults to now
        #[arg(short, long)]
        start: Option<String>,

        /// End, defaults to one hour after the start
        #[arg(short, long)]
        end: Option<String>,

        #[arg(long)]
        all_day: bool,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Edit a meeting and save it
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(long)]
        all_day: Option<bool>,

        #[arg(short, long)]
        location: Option<String>,

        /// Replace the notes
        #[arg(short, long)]
        notes: Option<String>,

        /// Add a link (repeatable)
        #[arg(long = "link")]
        links: Vec<String>,
    },
    /// Discard local edits and reload a meeting from the server
    Sync { id: String },
    /// Delete a meeting
    Delete {
        id: String,

        /// Only delete if the server is still at this version
        #[arg(long)]
        if_match: Option<i64>,
    },
    /// Read or write a meeting's board
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },
    /// List board templates, or show one
    Templates { id: Option<String> },
}

#[derive(Subcommand)]
enum BoardAction {
    /// Print the board snapshot as JSON
    Get { id: String },
    /// Store a board snapshot read from a JSON file ("-" for stdin)
    Put { id: String, file: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Config { set_api_url } = cli.command {
        return commands::config::run(set_api_url);
    }

    let ctx = Context::load()?;

    let result = match cli.command {
        Commands::Config { .. } => Ok(()),
        Commands::Calendar { month, week } => {
            commands::calendar::run(&ctx, month.as_deref(), week.as_deref()).await
        }
        Commands::List { page, month, query } => {
            commands::list::run(&ctx, page, month.as_deref(), query.as_deref()).await
        }
        Commands::Show { id } => commands::show::run(&ctx, &id).await,
        Commands::New {
            title,
            start,
            end,
            all_day,
            location,
            notes,
        } => {
            let args = commands::new::NewArgs {
                title,
                start,
                end,
                all_day,
                location,
                notes,
            };
            commands::new::run(&ctx, args).await
        }
        Commands::Edit {
            id,
            title,
            start,
            end,
            all_day,
            location,
            notes,
            links,
        } => {
            let changes = commands::edit::Changes {
                title,
                start,
                end,
                all_day,
                location,
                notes,
                links,
            };
            commands::edit::run(&ctx, &id, changes).await
        }
        Commands::Sync { id } => commands::sync::run(&ctx, &id).await,
        Commands::Delete { id, if_match } => commands::delete::run(&ctx, &id, if_match).await,
        Commands::Board { action } => match action {
            BoardAction::Get { id } => commands::board::get(&ctx, &id).await,
            BoardAction::Put { id, file } => commands::board::put(&ctx, &id, &file).await,
        },
        Commands::Templates { id } => commands::templates::run(&ctx, id.as_deref()).await,
    };

    ctx.close()?;
    result
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
