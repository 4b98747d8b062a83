use chrono::{DateTime, Utc};
use colored::Colorize;

use super::widgets::heading;
use crate::admin::{
    AuditTone, SystemSettings, UserStats, audit_tone, describe_audit_entry, format_date,
    format_date_time, initials, license_expired, license_expiring_soon, mask_token, status_label,
};
use crate::api::models::{AuditLogEntry, Template, User};

pub fn render_user_stats(stats: &UserStats) -> String {
    format!(
        "Total: {}   Ativos: {}   Admins: {}   Licenças expiradas: {}",
        stats.total.to_string().bold(),
        stats.active.to_string().bright_green().bold(),
        stats.admins.to_string().bright_blue().bold(),
        stats.expired.to_string().bright_red().bold()
    )
}

pub fn render_user_row(user: &User, now: DateTime<Utc>) -> String {
    let license = format_date(user.license_expires_at);
    let license = if license_expired(user, now) {
        license.bright_red().to_string()
    } else if license_expiring_soon(user, now) {
        license.bright_yellow().to_string()
    } else {
        license
    };
    let role = if user.is_admin() {
        "👑 Admin".bright_blue().to_string()
    } else {
        "Cliente".to_string()
    };

    format!(
        "[{}] {} <{}>  {}  {}  licença: {}  projetos: {}  último acesso: {}  {}",
        initials(&user.name).bold(),
        user.name,
        user.email,
        role,
        status_label(user, now),
        license,
        user.project_count.unwrap_or(0),
        format_date(user.last_login_at),
        user.id.dimmed()
    )
}

pub fn render_users(users: &[&User], stats: &UserStats, now: DateTime<Utc>) -> String {
    let mut out = vec![heading("Usuários"), render_user_stats(stats), String::new()];
    if users.is_empty() {
        out.push("Nenhum usuário encontrado".dimmed().to_string());
    }
    out.extend(users.iter().map(|u| render_user_row(u, now)));
    out.join("\n")
}

pub fn render_audit_log(user: &User, entries: &[AuditLogEntry]) -> String {
    let mut out = vec![heading(&format!("Histórico de {}", user.name))];
    if entries.is_empty() {
        out.push("Nenhum registro encontrado".dimmed().to_string());
    }
    for entry in entries {
        let line = describe_audit_entry(entry);
        let line = match audit_tone(&entry.action) {
            AuditTone::Success => line.bright_green().to_string(),
            AuditTone::Danger => line.bright_red().to_string(),
            AuditTone::Warning => line.bright_yellow().to_string(),
            AuditTone::Info => line,
        };
        let when = entry
            .created_at
            .map(format_date_time)
            .unwrap_or_else(|| "-".to_string());
        out.push(format!("{}  {}", when.dimmed(), line));
    }
    out.join("\n")
}

pub fn render_settings(
    settings: &SystemSettings,
    templates: &[Template],
    webhook_url: &str,
    backend_version: &str,
) -> String {
    let default_template = match settings.default_template_id.as_deref() {
        None => "nenhum".dimmed().to_string(),
        Some(id) => templates
            .iter()
            .find(|t| t.id == id)
            .map(|t| format!("{} ({})", t.name, id))
            .unwrap_or_else(|| id.to_string()),
    };
    let token = match settings.webhook_token.as_deref() {
        Some(token) => format!("{} {}", "configurado".bright_green(), mask_token(token).dimmed()),
        None => "não configurado".bright_yellow().to_string(),
    };

    [
        heading("Configurações"),
        format!("Duração padrão da licença: {} dias", settings.license_duration_days),
        format!("Template padrão:           {}", default_template),
        format!("Token do webhook:          {}", token),
        format!("URL do webhook:            {}", webhook_url.underline()),
        format!(
            "Versão:                    cli v{}  api {}",
            env!("CARGO_PKG_VERSION"),
            backend_version
        ),
    ]
    .join("\n")
}
