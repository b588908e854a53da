use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use solaudit_core::config::Config;

mod args;
mod commands;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = args::Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(backend) = args.backend {
        let backend = backend.into();
        if config.backend() != backend {
            // A key configured for another backend is useless here.
            config.ai.api_key = None;
        }
        config.ai.backend = Some(backend);
    }
    if let Some(model) = args.model {
        config.ai.model = Some(model);
    }

    commands::run(args.command, &config)
}
