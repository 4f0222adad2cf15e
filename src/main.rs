use clap::Parser;
use csv_tail::config::{Command, Config};
use csv_tail::{watch_append, watch_latest};
use std::path::Path;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_tracing(&config);

    let options = config.watch_options();
    let handle = match &config.command {
        Command::Append { file, .. } => {
            info!(file = %file.display(), "watching appended rows");
            watch_append(file, print_row, options)
        }
        Command::Latest { dir, prefix } => {
            info!(dir = %dir.display(), prefix = %prefix, "watching newest file");
            watch_latest(dir, prefix, print_row, options)
        }
    };

    let shutdown = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    if let Err(e) = handle.join().await {
        error!("watcher failed: {e}");
        std::process::exit(1);
    }
}

fn print_row(path: &Path, fields: &[String]) {
    let mut line = format!("[{}] ", path.display());
    for (i, field) in fields.iter().enumerate() {
        line.push_str(&format!("col{i}={field}|"));
    }
    println!("{line}");
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    // Rows go to stdout, logs to stderr.
    let builder = fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    match config.log_format.as_str() {
        "json" => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
