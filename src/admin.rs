//! User management and system settings helpers for administrators

use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::Rng;
use serde_json::Value;

use crate::api::constants::settings as keys;
use crate::api::models::{AuditLogEntry, Role, Setting, SettingUpdate, User, UserPayload};

/// Licenses expiring within this many days are flagged
pub const EXPIRY_WARNING_DAYS: i64 = 7;

pub const MIN_WEBHOOK_TOKEN_LEN: usize = 16;

/// Users whose name or email contains `term`, ignoring case; all users for a blank term
pub fn filter_users<'a>(users: &'a [User], term: &str) -> Vec<&'a User> {
    let term = term.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            term.is_empty()
                || u.name.to_lowercase().contains(&term)
                || u.email.to_lowercase().contains(&term)
        })
        .collect()
}

pub fn license_expired(user: &User, now: DateTime<Utc>) -> bool {
    user.license_expires_at.is_some_and(|at| at < now)
}

pub fn license_expiring_soon(user: &User, now: DateTime<Utc>) -> bool {
    user.license_expires_at.is_some_and(|at| {
        let days = (at - now).num_days();
        days > 0 && days <= EXPIRY_WARNING_DAYS
    })
}

pub fn status_label(user: &User, now: DateTime<Utc>) -> &'static str {
    if !user.is_active {
        "🔒 Inativo"
    } else if license_expired(user, now) {
        "⏰ Expirado"
    } else {
        "✅ Ativo"
    }
}

/// Up to two uppercase initials
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserStats {
    pub total: usize,
    /// Active and with an unexpired license
    pub active: usize,
    pub admins: usize,
    pub expired: usize,
}

impl UserStats {
    pub fn from_users(users: &[User], now: DateTime<Utc>) -> Self {
        Self {
            total: users.len(),
            active: users
                .iter()
                .filter(|u| u.is_active && !license_expired(u, now))
                .count(),
            admins: users.iter().filter(|u| u.is_admin()).count(),
            expired: users.iter().filter(|u| license_expired(u, now)).count(),
        }
    }
}

/// Create/edit user form
#[derive(Debug, Clone, PartialEq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// `YYYY-MM-DD`, empty for no expiry
    pub license_expires_at: String,
    pub is_active: bool,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            role: Role::Client,
            license_expires_at: String::new(),
            is_active: true,
        }
    }
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            password: String::new(),
            role: user.role,
            license_expires_at: user
                .license_expires_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            is_active: user.is_active,
        }
    }

    /// Validates the form; `creating` makes the password mandatory
    pub fn to_payload(&self, creating: bool) -> Result<UserPayload> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() {
            bail!("Preencha todos os campos obrigatórios");
        }
        if creating && self.password.is_empty() {
            bail!("Senha é obrigatória para novo usuário");
        }

        let license_expires_at = match self.license_expires_at.trim() {
            "" => None,
            raw => {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| anyhow::anyhow!("Data inválida: {} (use AAAA-MM-DD)", raw))?;
                Some(raw.to_string())
            }
        };

        Ok(UserPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: Some(self.password.clone()).filter(|p| !p.trim().is_empty()),
            role: self.role,
            is_active: self.is_active,
            license_expires_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTone {
    Success,
    Danger,
    Warning,
    Info,
}

pub fn audit_icon(action: &str) -> &'static str {
    match action {
        "USER_CREATED" => "➕",
        "USER_UPDATED" => "✏️",
        "USER_ACTIVATED" => "✅",
        "USER_DEACTIVATED" => "🚫",
        "USER_DELETED" => "🗑️",
        "PASSWORD_CHANGED" => "🔑",
        "LICENSE_EXTENDED" => "⏰",
        "LICENSE_EXPIRED" => "⌛",
        "ROLE_CHANGED" => "👑",
        _ => "📝",
    }
}

pub fn audit_tone(action: &str) -> AuditTone {
    match action {
        "USER_CREATED" | "USER_ACTIVATED" | "LICENSE_EXTENDED" => AuditTone::Success,
        "USER_DEACTIVATED" | "USER_DELETED" | "LICENSE_EXPIRED" => AuditTone::Danger,
        "PASSWORD_CHANGED" | "ROLE_CHANGED" => AuditTone::Warning,
        _ => AuditTone::Info,
    }
}

pub fn audit_action_label(action: &str) -> &str {
    match action {
        "USER_CREATED" => "Usuário Criado",
        "USER_UPDATED" => "Usuário Atualizado",
        "USER_ACTIVATED" => "Usuário Ativado",
        "USER_DEACTIVATED" => "Usuário Desativado",
        "USER_DELETED" => "Usuário Excluído",
        "PASSWORD_CHANGED" => "Senha Alterada",
        "LICENSE_EXTENDED" => "Licença Estendida",
        "LICENSE_EXPIRED" => "Licença Expirada",
        "ROLE_CHANGED" => "Tipo de Usuário Alterado",
        other => other,
    }
}

pub fn audit_source_label(source: &str) -> &str {
    match source {
        "ADMIN_PANEL" => "Painel Admin",
        "WEBHOOK" => "Integração Hotmart",
        "SYSTEM" => "Sistema",
        "SELF" => "Próprio Usuário",
        other => other,
    }
}

fn detail<'a>(details: &'a Value, key: &str) -> Option<&'a str> {
    details.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn detail_date(details: &Value, key: &str) -> Option<String> {
    let raw = detail(details, key)?;
    Some(
        raw.parse::<DateTime<Utc>>()
            .map(|at| format_date(Some(at)))
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// One-line summary of an audit entry's details, parts joined by ` • `
pub fn format_audit_details(details: Option<&Value>) -> String {
    let Some(details) = details else {
        return String::new();
    };

    let mut parts = Vec::new();
    if let Some(email) = detail(details, "email") {
        parts.push(format!("Email: {}", email));
    }
    if let Some(role) = detail(details, "role") {
        parts.push(format!("Tipo: {}", role));
    }
    if let (Some(old), Some(new)) = (detail(details, "oldRole"), detail(details, "newRole")) {
        parts.push(format!("De {} para {}", old, new));
    }
    if let (Some(old), Some(new)) = (
        detail_date(details, "oldExpiration"),
        detail_date(details, "newExpiration"),
    ) {
        parts.push(format!("Expiração: {} → {}", old, new));
    }
    if let Some(date) = detail_date(details, "licenseExpiresAt") {
        parts.push(format!("Expira em: {}", date));
    }
    if let Some(event) = detail(details, "event") {
        parts.push(format!("Evento: {}", event));
    }
    if let (Some(name), Some(email)) = (detail(details, "name"), detail(details, "email")) {
        parts.push(format!("Nome: {}, Email: {}", name, email));
    }
    parts.join(" • ")
}

pub fn describe_audit_entry(entry: &AuditLogEntry) -> String {
    let mut line = format!(
        "{} {}",
        audit_icon(&entry.action),
        audit_action_label(&entry.action)
    );
    if let Some(source) = entry.source.as_deref() {
        line.push_str(&format!(" ({})", audit_source_label(source)));
    }
    let details = format_audit_details(entry.details.as_ref());
    if !details.is_empty() {
        line.push_str(" - ");
        line.push_str(&details);
    }
    line
}

/// `dd/mm/aaaa` in local time, `-` when absent
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.with_timezone(&Local).format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%d/%m/%Y às %H:%M")
        .to_string()
}

/// The three settings the admin screen edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemSettings {
    pub license_duration_days: u32,
    pub default_template_id: Option<String>,
    pub webhook_token: Option<String>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            license_duration_days: 365,
            default_template_id: None,
            webhook_token: None,
        }
    }
}

impl SystemSettings {
    pub fn from_settings(settings: &[Setting]) -> Self {
        let value = |key: &str| {
            settings
                .iter()
                .find(|s| s.key == key)
                .and_then(|s| s.value.clone())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        Self {
            license_duration_days: value(keys::LICENSE_DURATION_DAYS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.license_duration_days),
            default_template_id: value(keys::DEFAULT_TEMPLATE_ID),
            webhook_token: value(keys::WEBHOOK_SECRET_TOKEN),
        }
    }
}

pub fn license_duration_update(days: i64) -> Result<SettingUpdate> {
    if days < 1 {
        bail!("Duração deve ser maior que 0");
    }
    Ok(SettingUpdate {
        value: days.to_string(),
        description: "Duração padrão da licença em dias para novos usuários via Hotmart".to_string(),
    })
}

/// `None` clears the default template
pub fn default_template_update(template_id: Option<&str>) -> SettingUpdate {
    SettingUpdate {
        value: template_id.map(str::trim).unwrap_or_default().to_string(),
        description: "Template padrão para novos usuários via Hotmart".to_string(),
    }
}

pub fn webhook_token_update(token: &str) -> Result<SettingUpdate> {
    let token = token.trim();
    if token.chars().count() < MIN_WEBHOOK_TOKEN_LEN {
        bail!("Token deve ter pelo menos {} caracteres", MIN_WEBHOOK_TOKEN_LEN);
    }
    Ok(SettingUpdate {
        value: token.to_string(),
        description: "Token secreto para autenticação do webhook".to_string(),
    })
}

/// 32 random bytes as 64 lowercase hex characters
pub fn generate_webhook_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Shows only the ends of a secret
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "•".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn user(name: &str, email: &str) -> User {
        User {
            id: name.to_lowercase(),
            name: name.into(),
            email: email.into(),
            is_active: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_matches_name_or_email() {
        let users = vec![
            user("Maria Silva", "maria@exemplo.com"),
            user("João", "joao@empresa.com"),
        ];
        assert_eq!(filter_users(&users, "EMPRESA").len(), 1);
        assert_eq!(filter_users(&users, "silva")[0].name, "Maria Silva");
        assert_eq!(filter_users(&users, "  ").len(), 2);
    }

    #[test]
    fn test_license_states() {
        let mut u = user("Ana", "a@b.c");
        assert!(!license_expired(&u, now()));
        assert_eq!(status_label(&u, now()), "✅ Ativo");

        u.license_expires_at = Some(now() - Duration::days(1));
        assert!(license_expired(&u, now()));
        assert!(!license_expiring_soon(&u, now()));
        assert_eq!(status_label(&u, now()), "⏰ Expirado");

        u.license_expires_at = Some(now() + Duration::days(5));
        assert!(license_expiring_soon(&u, now()));

        u.license_expires_at = Some(now() + Duration::days(30));
        assert!(!license_expiring_soon(&u, now()));

        u.is_active = false;
        assert_eq!(status_label(&u, now()), "🔒 Inativo");
    }

    #[test]
    fn test_stats() {
        let mut admin = user("Admin", "admin@x.com");
        admin.role = Role::Admin;
        let mut expired = user("Old", "old@x.com");
        expired.license_expires_at = Some(now() - Duration::days(3));
        let mut blocked = user("Blocked", "b@x.com");
        blocked.is_active = false;

        let stats = UserStats::from_users(&[admin, expired, blocked], now());
        assert_eq!(
            stats,
            UserStats {
                total: 3,
                active: 1,
                admins: 1,
                expired: 1
            }
        );
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("maria da silva"), "MD");
        assert_eq!(initials("Ana"), "A");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_user_form_rules() {
        let mut form = UserForm {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            ..Default::default()
        };
        assert!(form.to_payload(true).is_err());

        let payload = form.to_payload(false).unwrap();
        assert_eq!(payload.password, None);
        assert_eq!(payload.license_expires_at, None);
        let body = serde_json::to_value(&payload).unwrap();
        assert!(body.get("password").is_none());
        assert_eq!(body["licenseExpiresAt"], Value::Null);

        form.password = "segredo123".into();
        form.license_expires_at = "2026-01-31".into();
        let payload = form.to_payload(true).unwrap();
        assert_eq!(payload.password.as_deref(), Some("segredo123"));
        assert_eq!(payload.license_expires_at.as_deref(), Some("2026-01-31"));

        form.license_expires_at = "31/01/2026".into();
        assert!(form.to_payload(true).is_err());

        form.name = " ".into();
        assert!(form.to_payload(false).is_err());
    }

    #[test]
    fn test_audit_labels() {
        assert_eq!(audit_action_label("ROLE_CHANGED"), "Tipo de Usuário Alterado");
        assert_eq!(audit_action_label("CUSTOM"), "CUSTOM");
        assert_eq!(audit_source_label("WEBHOOK"), "Integração Hotmart");
        assert_eq!(audit_icon("UNKNOWN"), "📝");
        assert_eq!(audit_tone("USER_DELETED"), AuditTone::Danger);
        assert_eq!(audit_tone("USER_UPDATED"), AuditTone::Info);
    }

    #[test]
    fn test_audit_details() {
        let details = json!({ "oldRole": "CLIENT", "newRole": "ADMIN", "event": "PURCHASE_APPROVED" });
        assert_eq!(
            format_audit_details(Some(&details)),
            "De CLIENT para ADMIN • Evento: PURCHASE_APPROVED"
        );
        assert_eq!(format_audit_details(None), "");
        assert_eq!(
            format_audit_details(Some(&json!({ "name": "Ana", "email": "a@b.c" }))),
            "Email: a@b.c • Nome: Ana, Email: a@b.c"
        );
    }

    #[test]
    fn test_settings_snapshot() {
        let settings = vec![
            Setting {
                key: keys::LICENSE_DURATION_DAYS.into(),
                value: Some("30".into()),
                description: None,
            },
            Setting {
                key: keys::DEFAULT_TEMPLATE_ID.into(),
                value: Some(String::new()),
                description: None,
            },
        ];
        let snapshot = SystemSettings::from_settings(&settings);
        assert_eq!(snapshot.license_duration_days, 30);
        assert_eq!(snapshot.default_template_id, None);
        assert_eq!(snapshot.webhook_token, None);
        assert_eq!(SystemSettings::from_settings(&[]).license_duration_days, 365);
    }

    #[test]
    fn test_setting_validation() {
        assert!(license_duration_update(0).is_err());
        assert_eq!(license_duration_update(90).unwrap().value, "90");
        assert!(webhook_token_update("short").is_err());
        assert_eq!(default_template_update(None).value, "");

        let token = generate_webhook_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_webhook_token());
        assert!(webhook_token_update(&token).is_ok());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdef0123456789"), "abcd…6789");
        assert_eq!(mask_token("abc"), "•••");
    }
}
