use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "wellness-cli", version, about = "Student wellness tracker CLI")]
struct Cli {
    /// Identity token (raw or "Bearer <token>")
    #[arg(long, global = true, env = "WELLNESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identity tokens and profiles
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Habit logging and streaks
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Groups and leaderboards
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let token = cli.token.as_deref();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action, token),
        Commands::Habit { action } => commands::habit::run(action, token),
        Commands::Group { action } => commands::group::run(action, token),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "wellness-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
