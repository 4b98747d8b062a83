use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use log::info;

use crate::cli::context::AppContext;
use crate::cli::ui::{password_or_prompt, text_or_prompt, with_spinner};

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted in a terminal
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Status {
        /// Re-fetch the user from the server
        #[arg(long)]
        refresh: bool,
    },
    /// Create a new account
    Register {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

pub async fn auth_command(args: AuthCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        AuthSubcommands::Login { email, password } => login(ctx, email, password).await,
        AuthSubcommands::Logout => {
            ctx.session.logout()?;
            println!("{} Sessão encerrada", "✓".bright_green().bold());
            Ok(())
        }
        AuthSubcommands::Status { refresh } => status(ctx, refresh).await,
        AuthSubcommands::Register {
            name,
            email,
            password,
        } => register(ctx, name, email, password).await,
    }
}

async fn login(ctx: &mut AppContext, email: Option<String>, password: Option<String>) -> Result<()> {
    let email = text_or_prompt(email, "Email", "--email")?;
    let password = password_or_prompt(password, false)?;

    let mut client = ctx.client()?;
    let user = with_spinner("Entrando...", ctx.session.login(&mut client, &email, &password)).await?;
    info!("User {} logged in", user.id);

    println!(
        "{} Bem-vindo(a), {}! ({})",
        "✓".bright_green().bold(),
        user.name.bold(),
        user.role
    );
    Ok(())
}

async fn status(ctx: &mut AppContext, refresh: bool) -> Result<()> {
    println!("API: {}", ctx.config.api_url());

    if refresh && ctx.session.is_authenticated() {
        let client = ctx.client()?;
        with_spinner("Atualizando...", ctx.session.refresh_me(&client)).await?;
    }

    match ctx.session.current_user() {
        Some(user) => {
            println!("{} Autenticado como {} <{}>", "●".bright_green(), user.name.bold(), user.email);
            println!("  Perfil: {}", user.role);
            if let Some(expires) = user.license_expires_at {
                println!("  Licença até: {}", crate::admin::format_date(Some(expires)));
            }
        }
        None => {
            println!("{} Não autenticado", "○".dimmed());
            println!("Execute `blueprint auth login` para entrar.");
        }
    }
    Ok(())
}

async fn register(
    ctx: &mut AppContext,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let name = text_or_prompt(name, "Nome", "--name")?;
    let email = text_or_prompt(email, "Email", "--email")?;
    let password = password_or_prompt(password, true)?;

    let client = ctx.client()?;
    let user = with_spinner("Criando conta...", client.register(&name, &email, &password)).await?;

    ctx.notifier.success("Conta criada com sucesso!");
    println!("Faça login com `blueprint auth login --email {}`.", user.email);
    Ok(())
}
