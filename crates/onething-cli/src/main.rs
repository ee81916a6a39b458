use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "onething", version, about = "One task, one focus, one room")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's condition check
    Condition {
        #[command(subcommand)]
        action: commands::condition::ConditionAction,
    },
    /// Task catalog and the current recommendation
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Focus timer
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
    },
    /// Coin balance and history
    Coins {
        #[command(subcommand)]
        action: commands::coins::CoinsAction,
    },
    /// Daily streak
    Streak,
    /// Badges earned and still locked
    Achievements {
        /// Only show unlocked badges
        #[arg(long)]
        unlocked: bool,
    },
    /// Room layout
    Room {
        #[command(subcommand)]
        action: commands::room::RoomAction,
    },
    /// Item shop
    Shop {
        #[command(subcommand)]
        action: commands::shop::ShopAction,
    },
    /// Daily reminder
    Notify {
        #[command(subcommand)]
        action: commands::notify::NotifyAction,
    },
    /// Friends and the remote profile
    Social {
        #[command(subcommand)]
        action: commands::social::SocialAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("ONETHING_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Condition { action } => commands::condition::run(action).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Focus { action } => commands::focus::run(action).await,
        Commands::Coins { action } => commands::coins::run(action).await,
        Commands::Streak => commands::streak::run().await,
        Commands::Achievements { unlocked } => commands::achievements::run(unlocked).await,
        Commands::Room { action } => commands::room::run(action).await,
        Commands::Shop { action } => commands::shop::run(action).await,
        Commands::Notify { action } => commands::notify::run(action).await,
        Commands::Social { action } => commands::social::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
