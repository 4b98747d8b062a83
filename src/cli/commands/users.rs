use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use log::info;

use crate::admin::{UserForm, UserStats, filter_users};
use crate::api::client::BlueprintClient;
use crate::api::models::{Role, User};
use crate::breadcrumb::DynamicLabels;
use crate::cli::context::AppContext;
use crate::cli::ui::{confirm, password_or_prompt, text_or_prompt, with_spinner};
use crate::notify::Reported;
use crate::routes::Route;
use crate::views::admin::{render_audit_log, render_users};
use crate::views::widgets::breadcrumb_line;

#[derive(Args)]
pub struct UsersCommands {
    #[command(subcommand)]
    pub command: UsersSubcommands,
}

#[derive(Subcommand)]
pub enum UsersSubcommands {
    /// List users with their license and project counts
    List {
        /// Filter by name or email
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a user's audit history
    Audit { id: String },
    /// Create a user
    Create {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        /// ADMIN or CLIENT
        #[arg(long, default_value = "CLIENT")]
        role: Role,
        /// YYYY-MM-DD
        #[arg(long)]
        license_expires: Option<String>,
        #[arg(long)]
        inactive: bool,
    },
    /// Update a user; omitted fields keep their value
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Empty keeps the current password
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        /// YYYY-MM-DD, empty removes the expiry
        #[arg(long)]
        license_expires: Option<String>,
    },
    /// Enable or disable a user's access
    ToggleAccess {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a user
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn users_command(args: UsersCommands, ctx: &mut AppContext) -> Result<()> {
    let route = Route::AdminUsers;
    let client = ctx.enter(&route)?;

    match args.command {
        UsersSubcommands::List { search } => {
            let users = load_users(ctx, &client).await?;
            let now = Utc::now();
            let stats = UserStats::from_users(&users, now);
            let shown = filter_users(&users, search.as_deref().unwrap_or_default());
            println!("{}", breadcrumb_line(&route, &DynamicLabels::default()));
            println!("{}", render_users(&shown, &stats, now));
            Ok(())
        }
        UsersSubcommands::Audit { id } => {
            let users = load_users(ctx, &client).await?;
            let user = find_user(&users, &id)?;
            match with_spinner("Carregando histórico...", client.user_audit_log(&user.id)).await {
                Ok(entries) => {
                    println!("{}", render_audit_log(user, &entries));
                    Ok(())
                }
                Err(e) => {
                    ctx.notifier.error("Erro ao carregar histórico");
                    Err(e.context(Reported("Erro ao carregar histórico".into())))
                }
            }
        }
        UsersSubcommands::Create {
            name,
            email,
            password,
            role,
            license_expires,
            inactive,
        } => {
            let form = UserForm {
                name: text_or_prompt(name, "Nome", "--name")?,
                email: text_or_prompt(email, "Email", "--email")?,
                password: password_or_prompt(password, true)?,
                role,
                license_expires_at: license_expires.unwrap_or_default(),
                is_active: !inactive,
            };
            save_user(ctx, &client, None, &form).await
        }
        UsersSubcommands::Update {
            id,
            name,
            email,
            password,
            role,
            license_expires,
        } => {
            let users = load_users(ctx, &client).await?;
            let user = find_user(&users, &id)?;
            let mut form = UserForm::from_user(user);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(email) = email {
                form.email = email;
            }
            if let Some(password) = password {
                form.password = password;
            }
            if let Some(role) = role {
                form.role = role;
            }
            if let Some(date) = license_expires {
                form.license_expires_at = date;
            }
            save_user(ctx, &client, Some(&user.id), &form).await
        }
        UsersSubcommands::ToggleAccess { id, yes } => {
            let users = load_users(ctx, &client).await?;
            let user = find_user(&users, &id)?;
            toggle_access(ctx, &client, user, yes).await
        }
        UsersSubcommands::Delete { id, yes } => {
            let prompt = "Tem certeza que deseja excluir este usuário? Esta ação não pode ser desfeita.";
            if !confirm(prompt, yes)? {
                ctx.notifier.info("Operação cancelada");
                return Ok(());
            }
            match with_spinner("Excluindo...", client.delete_user(&id)).await {
                Ok(()) => {
                    info!("Deleted user {}", id);
                    ctx.notifier.success("Usuário excluído com sucesso");
                    Ok(())
                }
                Err(e) => {
                    ctx.notifier.error("Erro ao excluir usuário");
                    Err(e.context(Reported("Erro ao excluir usuário".into())))
                }
            }
        }
    }
}

async fn load_users(ctx: &AppContext, client: &BlueprintClient) -> Result<Vec<User>> {
    match with_spinner("Carregando usuários...", client.list_users_with_stats()).await {
        Ok(users) => Ok(users),
        Err(e) => {
            ctx.notifier.error("Erro ao carregar usuários");
            Err(e.context(Reported("Erro ao carregar usuários".into())))
        }
    }
}

/// Matches a user by id or email
fn find_user<'a>(users: &'a [User], key: &str) -> Result<&'a User> {
    users
        .iter()
        .find(|u| u.id == key || u.email.eq_ignore_ascii_case(key))
        .ok_or_else(|| anyhow::anyhow!("Usuário não encontrado: {}", key))
}

async fn save_user(ctx: &AppContext, client: &BlueprintClient, id: Option<&str>, form: &UserForm) -> Result<()> {
    let payload = match form.to_payload(id.is_none()) {
        Ok(payload) => payload,
        Err(e) => {
            ctx.notifier.error(&e.to_string());
            return Err(e.context(Reported("Formulário inválido".into())));
        }
    };

    let result = match id {
        None => with_spinner("Salvando...", client.create_user(&payload)).await,
        Some(id) => with_spinner("Salvando...", client.update_user(id, &payload)).await,
    };
    match result {
        Ok(user) => {
            info!("Saved user {}", user.id);
            ctx.notifier.success(if id.is_none() {
                "Usuário criado com sucesso"
            } else {
                "Usuário atualizado com sucesso"
            });
            Ok(())
        }
        Err(e) => {
            ctx.notifier.error("Erro ao salvar usuário");
            Err(e.context(Reported("Erro ao salvar usuário".into())))
        }
    }
}

async fn toggle_access(ctx: &AppContext, client: &BlueprintClient, user: &User, yes: bool) -> Result<()> {
    let enable = !user.is_active;
    let prompt = if enable {
        format!("Ativar o acesso de {}?", user.name)
    } else {
        format!("Desativar o acesso de {}?", user.name)
    };
    if !confirm(&prompt, yes)? {
        ctx.notifier.info("Operação cancelada");
        return Ok(());
    }

    match with_spinner("Salvando...", client.set_user_access(&user.id, enable)).await {
        Ok(()) => {
            ctx.notifier
                .success(if enable { "Acesso ativado" } else { "Acesso desativado" });
            Ok(())
        }
        Err(e) => {
            ctx.notifier.error("Erro ao alterar status");
            Err(e.context(Reported("Erro ao alterar status".into())))
        }
    }
}
