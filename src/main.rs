use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::{error, info};

use blueprint_cli::api::is_unauthorized;
use blueprint_cli::cli::{self, AppContext, Cli};
use blueprint_cli::notify::is_reported;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Log to a file, truncated on each run
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("blueprint-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting blueprint-cli v{}", env!("CARGO_PKG_VERSION"));

    let mut ctx = AppContext::load()?;
    if let Err(e) = cli::run(cli, &mut ctx).await {
        error!("Command failed: {:#}", e);

        if is_unauthorized(&e) {
            if let Err(clear_err) = ctx.session.handle_unauthorized() {
                error!("Failed to clear session: {:#}", clear_err);
            }
            eprintln!(
                "{} {}",
                "✗".bright_red().bold(),
                "Sessão expirada. Faça login novamente com `blueprint auth login`.".bright_red()
            );
        } else if !is_reported(&e) {
            eprintln!("{} {:#}", "✗".bright_red().bold(), e);
        }
        std::process::exit(1);
    }

    Ok(())
}
