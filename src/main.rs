// src/main.rs
use std::path::PathBuf;

use clap::Parser;
use cinder::{config, logging, server, store::Store};

/// In-memory key-value server speaking a RESP subset.
#[derive(Parser, Debug)]
#[command(name = "cinder-server", version)]
struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// JSON config file, created with defaults when missing
    #[arg(short, long, default_value = "cinder.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(&cli.config)?;
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if let Some(bind) = cli.bind {
        cfg.bind = bind;
    }

    logging::init(&cfg.log_level);

    // listens on 127.0.0.1:6380 unless configured otherwise
    server::start(cfg, Store::new()).await
}
