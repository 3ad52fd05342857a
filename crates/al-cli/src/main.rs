use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use al_cli::commands::{self, auth, chat, dashboard, focus, plans, review};
use al_cli::{ChatAction, Cli, Commands, Config, PlansAction};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    // Everything runs on one thread: the focus loop relies on events being
    // handled strictly one after another.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let mut stdout = io::stdout();

    match cli.command {
        Some(Commands::Register(args)) => {
            auth::validate(&args)?;
            let mut store = commands::open_store(&config)?;
            let client = commands::anonymous_client(&config)?;
            auth::register(&mut stdout, &client, &mut store, &args).await?;
        }
        Some(Commands::Login(args)) => {
            auth::validate(&args)?;
            let mut store = commands::open_store(&config)?;
            let client = commands::anonymous_client(&config)?;
            auth::login(&mut stdout, &client, &mut store, &args).await?;
        }
        Some(Commands::Logout) => {
            let mut store = commands::open_store(&config)?;
            auth::logout(&mut stdout, &mut store)?;
        }
        Some(Commands::Whoami) => {
            let store = commands::open_store(&config)?;
            auth::whoami(&mut stdout, &store)?;
        }
        Some(Commands::Dashboard) => {
            let store = commands::open_store(&config)?;
            let (client, credential) = commands::authenticated_client(&config, &store)?;
            dashboard::run(&mut stdout, &client, &credential).await?;
        }
        Some(Commands::Plans(action)) => {
            let store = commands::open_store(&config)?;
            let (client, credential) = commands::authenticated_client(&config, &store)?;
            match action {
                PlansAction::List => plans::list(&mut stdout, &client, &credential).await?,
                PlansAction::Add { text } => plans::add(&mut stdout, &client, &text).await?,
                PlansAction::Done { id } => plans::done(&mut stdout, &client, id).await?,
            }
        }
        Some(Commands::Focus { minutes }) => {
            // Reject a bad configured default before touching the backend.
            let planned = focus::planned_minutes(&config, minutes)?;
            let store = commands::open_store(&config)?;
            let (client, credential) = commands::authenticated_client(&config, &store)?;
            drop(store);
            focus::run(&config, client, &credential, Some(planned)).await?;
        }
        Some(Commands::Chat(action)) => {
            let store = commands::open_store(&config)?;
            let (client, credential) = commands::authenticated_client(&config, &store)?;
            match action {
                ChatAction::Send { message } => chat::send(&mut stdout, &client, &message).await?,
                ChatAction::History { limit } => {
                    let limit = limit.unwrap_or(config.history_limit);
                    chat::history(&mut stdout, &client, &credential, limit).await?;
                }
            }
        }
        Some(Commands::Review) => {
            let store = commands::open_store(&config)?;
            let (client, _credential) = commands::authenticated_client(&config, &store)?;
            review::run(&mut stdout, &client).await?;
        }
        Some(Commands::AnalyzeExit { reason }) => {
            let store = commands::open_store(&config)?;
            let (client, _credential) = commands::authenticated_client(&config, &store)?;
            review::analyze_exit(&mut stdout, &client, &reason).await?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
