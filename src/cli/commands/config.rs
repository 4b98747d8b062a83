use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::auth::SessionStore;
use crate::cli::context::AppContext;
use crate::config::{API_URL_ENV, Config};

#[derive(Args)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Print the effective configuration
    Show,
    /// Set the API base URL, e.g. https://api.example.com/api
    SetUrl {
        url: String,
    },
}

pub fn config_command(args: ConfigCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        ConfigSubcommands::Show => {
            let config = &ctx.config;
            println!("{}", "BluePrint CLI".bright_blue().bold());
            println!("  Arquivo:    {}", Config::get_config_path()?.display());
            println!("  Sessão:     {}", SessionStore::default_location()?.path().display());
            if config.is_api_url_overridden() {
                println!("  API URL:    {} {}", config.api_url(), format!("(via {})", API_URL_ENV).dimmed());
            } else {
                println!("  API URL:    {}", config.api_url());
            }
            println!("  Timeout:    {}s", config.settings.request_timeout_secs);
            println!("  Tentativas: {}", config.settings.retry_attempts);
            println!(
                "  Log de requisições: {}",
                if config.settings.request_logging { "ativado" } else { "desativado" }
            );
            Ok(())
        }
        ConfigSubcommands::SetUrl { url } => {
            ctx.config.set_api_url(&url)?;
            ctx.config.save()?;
            println!("{} API URL definida: {}", "✓".bright_green().bold(), ctx.config.api_url);
            if ctx.config.is_api_url_overridden() {
                println!(
                    "{} {} está definida e continua tendo prioridade",
                    "⚠️".bright_yellow().bold(),
                    API_URL_ENV
                );
            }
            Ok(())
        }
    }
}
