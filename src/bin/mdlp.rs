use anyhow::Result;
use clap::Parser;
use md_live_preview::config::{Args, Config};
use md_live_preview::host;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.clone();
    let config = Config::from_args(args)?;

    // Logs go to stderr; stdout carries documents and host messages
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Some(path) = &config.config_path {
        log::debug!("Using configuration from {}", path.display());
    }

    host::run(&config, command).await
}
