use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use dpsync::cli::{format_check, format_contexts, Args, Command};
use dpsync::client::{ConfigurationClient, DataplaneClient};
use dpsync::context;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // Load .env file if specified
    if let Some(ref env_file) = args.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
    }

    let config = match context::load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load context config: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(args, config).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(args: Args, config: context::Config) -> anyhow::Result<()> {
    if let Command::Contexts = args.command {
        print!("{}", format_contexts(&config));
        return Ok(());
    }

    let mut ctx = config.resolve(args.context.as_deref())?;
    if let Some(url) = args.url {
        ctx.url = url;
    }
    if let Some(user) = args.user {
        ctx.username = user;
    }
    let password = std::env::var("DPSYNC_PASSWORD").ok().or(ctx.password);

    let client = DataplaneClient::with_timeout(
        &ctx.url,
        &ctx.username,
        password,
        Duration::from_secs(ctx.timeout_secs),
    );

    match args.command {
        Command::Version => {
            let version = client.configuration_version().await?;
            println!("{}", version);
        }
        Command::Check => {
            let info = client.info().await?;
            println!("{}", format_check(&ctx.url, &info));
        }
        Command::Contexts => unreachable!("handled before a client is built"),
    }

    Ok(())
}
