use super::commands::auth::AuthCommands;
use super::commands::config::ConfigCommands;
use super::commands::projects::ProjectsCommands;
use super::commands::settings::SettingsCommands;
use super::commands::templates::TemplatesCommands;
use super::commands::users::UsersCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blueprint")]
#[command(about = "Terminal client for BluePrint template-driven projects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Login, logout and session status
    Auth(AuthCommands),
    /// Local configuration (API URL)
    Config(ConfigCommands),
    /// Dashboard: your projects, tasks and available templates
    Home,
    /// Browse templates, and manage them as an administrator
    Templates(TemplatesCommands),
    /// Work on your projects
    Projects(ProjectsCommands),
    /// User management (administrators)
    Users(UsersCommands),
    /// System settings (administrators)
    Settings(SettingsCommands),
}
