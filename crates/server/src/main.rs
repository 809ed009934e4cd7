use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use fairfight_server::{build_app, AppConfig, ServeArgs, StoreArgs, StoreConfig};

#[derive(Parser)]
#[command(name = "fairfight")]
#[command(about = "Two-party conflict arbitration with an AI judge", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the FairFight web flow over HTTP
    Serve(ServeArgs),

    /// Print recently delivered verdicts as JSON
    Recent(RecentArgs),
}

#[derive(Args)]
struct RecentArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Maximum number of verdicts to print
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // stdout carries the JSON
    if matches!(cli.command, Commands::Recent(_)) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Serve(args) => serve(args).await?,
        Commands::Recent(args) => print_recent(args).await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = AppConfig::from_env(&args)?;
    let app = build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    log::info!(
        "Serving FairFight on http://{} (links: {})",
        config.bind,
        config.flow.base_url
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn print_recent(args: RecentArgs) -> Result<()> {
    let store = StoreConfig::from_env(&args.store)?.open().await?;
    let records = store
        .recent_verdicts(args.limit)
        .await
        .context("Failed to read verdicts")?;
    let out = if args.pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    println!("{out}");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutting down");
}
