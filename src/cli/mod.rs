pub mod app;
pub mod commands;
pub mod context;
pub mod ui;

pub use app::{Cli, Commands};
pub use context::AppContext;

use anyhow::Result;

/// Dispatches a parsed command line
pub async fn run(cli: Cli, ctx: &mut AppContext) -> Result<()> {
    match cli.command {
        Commands::Auth(args) => commands::auth::auth_command(args, ctx).await,
        Commands::Config(args) => commands::config::config_command(args, ctx),
        Commands::Home => commands::home::home_command(ctx).await,
        Commands::Templates(args) => commands::templates::templates_command(args, ctx).await,
        Commands::Projects(args) => commands::projects::projects_command(args, ctx).await,
        Commands::Users(args) => commands::users::users_command(args, ctx).await,
        Commands::Settings(args) => commands::settings::settings_command(args, ctx).await,
    }
}
