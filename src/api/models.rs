//! Wire types for the BluePrint REST API
//!
//! Field names follow the server's camelCase JSON. Templates and projects share
//! the same stage/task/subtask shape; items created locally and not yet saved
//! have no `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Achievement tier attached to every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GemType {
    #[default]
    Esmeralda,
    Rubi,
    Safira,
    Diamante,
}

impl GemType {
    pub const ALL: [GemType; 4] = [
        GemType::Esmeralda,
        GemType::Rubi,
        GemType::Safira,
        GemType::Diamante,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GemType::Esmeralda => "ESMERALDA",
            GemType::Rubi => "RUBI",
            GemType::Safira => "SAFIRA",
            GemType::Diamante => "DIAMANTE",
        }
    }
}

impl fmt::Display for GemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GemType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        GemType::ALL
            .into_iter()
            .find(|gem| gem.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown gem '{}', expected one of: esmeralda, rubi, safira, diamante",
                    s
                )
            })
    }
}

/// Kanban column of a task; absent on the wire means `Todo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("ADMIN"),
            Role::Client => f.write_str("CLIENT"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CLIENT" | "CLIENTE" => Ok(Role::Client),
            other => anyhow::bail!("Unknown role '{}', expected ADMIN or CLIENT", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    #[default]
    Ativo,
    Inativo,
}

impl ProjectStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Ativo => "Ativo",
            ProjectStatus::Inativo => "Inativo",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ATIVO" | "ACTIVE" => Ok(ProjectStatus::Ativo),
            "INATIVO" | "INACTIVE" => Ok(ProjectStatus::Inativo),
            other => anyhow::bail!("Unknown project status '{}', expected ATIVO or INATIVO", other),
        }
    }
}

/// Currencies accepted for a project's sale price
pub const CURRENCIES: [&str; 4] = ["BRL", "USD", "EUR", "GBP"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        self.status.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub gem_type: GemType,
    #[serde(default, deserialize_with = "null_default")]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub stages: Vec<Stage>,
    #[serde(default, deserialize_with = "null_default")]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The template summary embedded in a project
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub template_version: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub progress: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub project_stages: Vec<Stage>,
    #[serde(default, deserialize_with = "null_default")]
    pub project_tasks: Vec<Task>,
    #[serde(default)]
    pub current_gem: Option<GemType>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub sale_start_date: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub links: BTreeMap<String, String>,
    #[serde(default)]
    pub template: Option<TemplateRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_count: Option<u32>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// Gem transition reported by the server after a subtask toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemChange {
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub new_gem: Option<GemType>,
    #[serde(default)]
    pub previous_gem: Option<GemType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSubtaskResponse {
    /// Authoritative completion flag when the server echoes the subtask back
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub gem_change: Option<GemChange>,
    #[serde(default)]
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub template_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailsUpdate {
    pub name: String,
    pub status: ProjectStatus,
    pub price: Option<f64>,
    pub currency: String,
    pub sale_start_date: Option<String>,
    pub links: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub license_expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingUpdate {
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: Option<String>,
}

/// Subtask as sent when saving a structure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub order: u32,
    pub subtasks: Vec<SubtaskPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub order: u32,
    pub gem_type: GemType,
    pub tasks: Vec<TaskPayload>,
}

/// Body of `POST /templates` and `PUT /templates/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplatePayload {
    pub name: String,
    pub description: String,
    pub stages: Vec<StagePayload>,
    pub tasks: Vec<TaskPayload>,
}

/// Body of `PUT /projects/:id/structure`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructurePayload {
    pub stages: Vec<StagePayload>,
}

fn default_true() -> bool {
    true
}

/// Treats an explicit JSON `null` the same as a missing field
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Prices and versions arrive as either strings or numbers depending on the endpoint
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_decodes_with_nulls_and_numbers() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "name": "Meu Lançamento",
            "templateVersion": 3,
            "progress": null,
            "projectStages": [{
                "id": "s1",
                "name": "Fundação",
                "order": 0,
                "gemType": "RUBI",
                "tasks": [{
                    "id": "t1",
                    "title": "Definir público",
                    "order": 0,
                    "completed": false,
                    "subtasks": [{ "id": "st1", "description": "Pesquisa", "completed": true, "answer": null }]
                }]
            }],
            "projectTasks": null,
            "price": 1997.5,
            "links": null,
            "status": "ATIVO"
        }))
        .unwrap();

        assert_eq!(project.template_version.as_deref(), Some("3"));
        assert_eq!(project.progress, 0.0);
        assert_eq!(project.project_stages[0].gem_type, GemType::Rubi);
        assert!(project.project_stages[0].tasks[0].subtasks[0].completed);
        assert!(project.project_tasks.is_empty());
        assert_eq!(project.price.as_deref(), Some("1997.5"));
        assert!(project.links.is_empty());
        assert_eq!(project.status, Some(ProjectStatus::Ativo));
    }

    #[test]
    fn test_task_status_defaults_to_todo() {
        let task: Task = serde_json::from_value(json!({ "title": "x" })).unwrap();
        assert_eq!(task.status(), TaskStatus::Todo);

        let task: Task = serde_json::from_value(json!({ "title": "x", "status": "IN_PROGRESS" })).unwrap();
        assert_eq!(task.status(), TaskStatus::InProgress);
    }

    #[test]
    fn test_toggle_response_gem_change() {
        let response: ToggleSubtaskResponse = serde_json::from_value(json!({
            "id": "st1",
            "completed": true,
            "gemChange": { "changed": true, "newGem": "SAFIRA" }
        }))
        .unwrap();

        assert_eq!(response.completed, Some(true));
        let change = response.gem_change.unwrap();
        assert!(change.changed);
        assert_eq!(change.new_gem, Some(GemType::Safira));
    }

    #[test]
    fn test_gem_type_parsing() {
        assert_eq!("safira".parse::<GemType>().unwrap(), GemType::Safira);
        assert_eq!(" DIAMANTE ".parse::<GemType>().unwrap(), GemType::Diamante);
        assert!("opala".parse::<GemType>().is_err());
        assert_eq!("cliente".parse::<Role>().unwrap(), Role::Client);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn test_unsaved_items_serialize_without_id() {
        let stage = Stage {
            name: "Nova etapa".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&stage).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["gemType"], "ESMERALDA");
    }
}
