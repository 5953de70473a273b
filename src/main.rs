use clap::Parser;
use tasks::cli::commands::Cli;
use tasks::cli::handlers;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    let config = match handlers::load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = handlers::dispatch(cli, &config) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
