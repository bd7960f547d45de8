use std::path::PathBuf;

use clap::Parser;
use common::plot::generate_report;
use eyre::Result;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Render the throughput and time taken chart for one benchmark results CSV
#[derive(Parser)]
struct Cli {
    /// Benchmark results CSV
    input: PathBuf,
    /// Chart file to write; defaults to the input path with a png extension
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(short, long)]
    log: Vec<String>,
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();

    let mut env_filter = EnvFilter::new(format!("kv_report={log_level},common={log_level}"));
    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .init();

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("png"));
    info!("rendering {} to {}", args.input.display(), output.display());

    if let Err(err) = generate_report(&args.input, &output) {
        error!("{err:#?}");
        return Err(err.into());
    }
    println!("Chart written to {}", output.display());

    Ok(())
}
