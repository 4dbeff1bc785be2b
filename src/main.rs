use clap::Parser;
use jss_pull::{cli, sync};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(default_filter: &str) {
    // RUST_LOG takes precedence over our verbosity flag.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();
    init_logging(args.default_log_filter());

    match sync::run(&args.settings()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
