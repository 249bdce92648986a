//! CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use avatar_cli::handlers::run::RunArgs;
use avatar_cli::{Cli, CliError, Commands, handlers};

/// Logs go to stderr so they do not interleave with console replies.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let default = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = cli.player_config();
    match cli.command.unwrap_or(Commands::Run {
        play: Vec::new(),
        all: false,
        headless: false,
    }) {
        Commands::Run {
            play,
            all,
            headless,
        } => {
            handlers::run::execute(
                config,
                RunArgs {
                    play,
                    all,
                    headless,
                },
            )
            .await?;
        }
        Commands::Devices { json } => handlers::devices::execute(json)?,
        Commands::Sweep { days } => {
            handlers::sweep::execute(&config, days)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
