use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use log::{debug, info};

use crate::admin::{
    SystemSettings, default_template_update, generate_webhook_token, license_duration_update,
    webhook_token_update,
};
use crate::api::client::BlueprintClient;
use crate::api::constants::settings as keys;
use crate::api::models::SettingUpdate;
use crate::breadcrumb::DynamicLabels;
use crate::cli::context::AppContext;
use crate::cli::ui::{text_or_prompt, with_spinner};
use crate::notify::Reported;
use crate::routes::Route;
use crate::views::admin::render_settings;
use crate::views::widgets::breadcrumb_line;

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show the system settings
    Show,
    /// Default license duration in days for users created by the webhook
    LicenseDuration { days: i64 },
    /// Template cloned for users created by the webhook
    DefaultTemplate {
        #[arg(conflicts_with = "clear", required_unless_present = "clear")]
        id: Option<String>,
        #[arg(long)]
        clear: bool,
    },
    /// Set the webhook secret token
    WebhookToken {
        /// Generate a random token
        #[arg(long, conflicts_with = "value")]
        generate: bool,
        /// At least 16 characters; prompted for when omitted
        #[arg(long)]
        value: Option<String>,
    },
    /// Print the URL the payment webhook must call
    WebhookUrl,
    /// Print the CLI and server versions
    Version,
}

pub fn webhook_url(api_url: &str) -> String {
    format!("{}/projects/webhook/create-client", api_url.trim_end_matches('/'))
}

pub async fn settings_command(args: SettingsCommands, ctx: &mut AppContext) -> Result<()> {
    let route = Route::AdminSettings;
    let client = ctx.enter(&route)?;

    match args.command {
        SettingsSubcommands::Show => {
            let (settings, templates, version) = tokio::join!(
                client.list_settings(),
                client.list_public_templates(),
                backend_version(&client)
            );
            let settings = match settings {
                Ok(settings) => SystemSettings::from_settings(&settings),
                Err(e) => {
                    ctx.notifier.error("Erro ao carregar configurações");
                    return Err(e.context(Reported("Erro ao carregar configurações".into())));
                }
            };
            let templates = templates.unwrap_or_else(|e| {
                debug!("Could not load templates for settings: {:#}", e);
                Vec::new()
            });

            println!("{}", breadcrumb_line(&route, &DynamicLabels::default()));
            println!(
                "{}",
                render_settings(&settings, &templates, &webhook_url(ctx.config.api_url()), &version)
            );
            Ok(())
        }
        SettingsSubcommands::LicenseDuration { days } => {
            let update = reject_invalid(ctx, license_duration_update(days))?;
            save(ctx, &client, keys::LICENSE_DURATION_DAYS, &update, "Configuração salva com sucesso").await
        }
        SettingsSubcommands::DefaultTemplate { id, clear: _ } => {
            let update = default_template_update(id.as_deref());
            let message = if update.value.is_empty() {
                "Template padrão removido com sucesso"
            } else {
                "Template padrão configurado com sucesso"
            };
            save(ctx, &client, keys::DEFAULT_TEMPLATE_ID, &update, message).await
        }
        SettingsSubcommands::WebhookToken { generate, value } => {
            let token = if generate {
                let token = generate_webhook_token();
                println!("Novo token: {}", token.bold());
                token
            } else {
                text_or_prompt(value, "Token do webhook", "--value")?
            };
            let update = reject_invalid(ctx, webhook_token_update(&token))?;
            save(
                ctx,
                &client,
                keys::WEBHOOK_SECRET_TOKEN,
                &update,
                "Token do webhook salvo com sucesso! Configure-o também na Hotmart.",
            )
            .await
        }
        SettingsSubcommands::WebhookUrl => {
            println!("{}", webhook_url(ctx.config.api_url()));
            Ok(())
        }
        SettingsSubcommands::Version => {
            let version = backend_version(&client).await;
            println!("cli v{}", env!("CARGO_PKG_VERSION"));
            println!("api {}", version);
            Ok(())
        }
    }
}

/// Server version, or `N/A` when it cannot be read
async fn backend_version(client: &BlueprintClient) -> String {
    match client.version().await {
        Ok(info) => info.version.unwrap_or_else(|| "N/A".to_string()),
        Err(e) => {
            debug!("Could not read server version: {:#}", e);
            "N/A".to_string()
        }
    }
}

fn reject_invalid(ctx: &AppContext, update: Result<SettingUpdate>) -> Result<SettingUpdate> {
    update.map_err(|e| {
        ctx.notifier.error(&e.to_string());
        e.context(Reported("Valor inválido".into()))
    })
}

async fn save(
    ctx: &AppContext,
    client: &BlueprintClient,
    key: &str,
    update: &SettingUpdate,
    success: &str,
) -> Result<()> {
    match with_spinner("Salvando...", client.update_setting(key, update)).await {
        Ok(()) => {
            info!("Updated setting {}", key);
            ctx.notifier.success(success);
            Ok(())
        }
        Err(e) => {
            ctx.notifier.error("Erro ao salvar configuração");
            Err(e.context(Reported("Erro ao salvar configuração".into())))
        }
    }
}
