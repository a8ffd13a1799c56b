use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use goalcore::cli::output;
use goalcore::cli::{execute_command, Cli, CliResult};
use goalcore::config::Settings;
use goalcore::exitcode;
use goalcore::infrastructure::di::ServiceContainer;
use goalcore::infrastructure::InfraError;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(()) => exitcode::OK,
        Err(e) => {
            output::error(&e);
            e.exit_code()
        }
    };
    process::exit(code);
}

fn run(cli: &Cli) -> CliResult<()> {
    let local_dir: PathBuf = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?,
    };
    let mut settings = Settings::load(Some(local_dir.as_path()))?;
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
        settings.validate()?;
    }
    tracing::debug!(base_url = %settings.base_url, "settings loaded");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| InfraError::io("start async runtime", e))?;

    runtime.block_on(async {
        let container = ServiceContainer::new(settings)?;
        execute_command(cli, &container).await
    })
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -v -v -v");
            LevelFilter::TRACE
        }
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
