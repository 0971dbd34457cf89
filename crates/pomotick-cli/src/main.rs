use clap::{Parser, Subcommand};
use pomotick_core::logging::{self, LogGuard, LogOptions};
use pomotick_core::storage::{data_dir, Config};

mod commands;

#[derive(Parser)]
#[command(name = "pomotick", version, about = "Pomodoro timer with a task log")]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive timer session in the foreground
    Run(commands::run::RunArgs),
    /// Inspect or change the saved timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Current task and task history
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    let guard = init_logging(cli.debug, &config);
    if let Err(e) = &loaded {
        tracing::warn!("Using default configuration: {e}");
    }

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args, config).await,
        Commands::Timer { action } => commands::timer::run(action, &config).await,
        Commands::Task { action } => commands::task::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        tracing::debug!("Command failed: {e}");
        drop(guard);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool, config: &Config) -> LogGuard {
    let log_dir = if config.logging.to_file {
        data_dir().ok().map(|dir| dir.join("logs"))
    } else {
        None
    };
    logging::init(&LogOptions {
        debug,
        level: config.logging.level.clone(),
        log_dir,
    })
}
