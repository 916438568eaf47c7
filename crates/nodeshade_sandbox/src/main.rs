// SPDX-License-Identifier: MIT OR Apache-2.0
//! nodeshade sandbox - headless host for the demo material
//!
//! Builds the animation and color stacks, compiles them into GLSL,
//! simulates a few frames of the update function and prints the result.

mod cli;
mod config;
mod demo;
mod filters;
mod report;

use cli::{Args, USAGE};
use config::SandboxConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("nodeshade_sandbox=debug".parse().unwrap())
        .add_directive("nodeshade_graph=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting nodeshade sandbox v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Sandbox failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    if args.list_nodes {
        let registry = nodeshade_graph::nodes::builtin_registry();
        let filter_types = filters::filter_types();
        for node_type in registry.types().chain(&filter_types) {
            println!("{}", node_type.id());
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading settings from {}", path.display());
            SandboxConfig::load(path)?
        }
        None => SandboxConfig::default(),
    };
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(frames) = args.frames {
        config.frames = frames;
    }

    if let Some(path) = &args.write_config {
        config.save(path)?;
        tracing::info!("Wrote settings to {}", path.display());
        return Ok(());
    }

    let report = report::run(&config)?;
    println!("{}", report.render(config.format)?);
    Ok(())
}
