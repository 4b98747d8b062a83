//! API constants and endpoint builders for the BluePrint REST API

/// Query flag that makes the template listing include inactive templates
pub const INCLUDE_INACTIVE: (&str, &str) = ("includeInactive", "true");

/// Path of the webhook that creates client accounts from purchases
pub const WEBHOOK_CREATE_CLIENT_PATH: &str = "/projects/webhook/create-client";

/// Standard headers for BluePrint requests
pub mod headers {
    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// Correlation header echoed into the request log
    pub const CORRELATION_ID: &str = "X-Correlation-Id";
}

/// Well-known setting keys
pub mod settings {
    pub const LICENSE_DURATION_DAYS: &str = "default_license_duration_days";
    pub const DEFAULT_TEMPLATE_ID: &str = "default_template_id";
    pub const WEBHOOK_SECRET_TOKEN: &str = "webhook_secret_token";
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

pub fn login_endpoint(base_url: &str) -> String {
    join(base_url, "/auth/login")
}

pub fn me_endpoint(base_url: &str) -> String {
    join(base_url, "/auth/me")
}

pub fn register_endpoint(base_url: &str) -> String {
    join(base_url, "/auth/register")
}

pub fn templates_endpoint(base_url: &str) -> String {
    join(base_url, "/templates")
}

pub fn public_templates_endpoint(base_url: &str) -> String {
    join(base_url, "/templates/public/list")
}

pub fn template_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/templates/{}", id))
}

pub fn template_toggle_active_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/templates/{}/toggle-active", id))
}

pub fn projects_endpoint(base_url: &str) -> String {
    join(base_url, "/projects")
}

pub fn my_projects_endpoint(base_url: &str) -> String {
    join(base_url, "/projects/my")
}

pub fn project_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/projects/{}", id))
}

pub fn project_progress_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/projects/{}/progress", id))
}

pub fn project_details_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/projects/{}/details", id))
}

pub fn project_structure_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/projects/{}/structure", id))
}

/// `action` is one of `toggle`, `answer` or `link`
pub fn subtask_action_endpoint(base_url: &str, project_id: &str, subtask_id: &str, action: &str) -> String {
    join(
        base_url,
        &format!("/projects/{}/subtasks/{}/{}", project_id, subtask_id, action),
    )
}

/// `action` is one of `toggle` or `link`
pub fn task_action_endpoint(base_url: &str, project_id: &str, task_id: &str, action: &str) -> String {
    join(
        base_url,
        &format!("/projects/{}/tasks/{}/{}", project_id, task_id, action),
    )
}

pub fn users_with_stats_endpoint(base_url: &str) -> String {
    join(base_url, "/users/admin/all-with-stats")
}

pub fn user_create_endpoint(base_url: &str) -> String {
    join(base_url, "/users/admin/create")
}

pub fn user_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/users/admin/{}", id))
}

pub fn user_audit_log_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/users/admin/{}/audit-log", id))
}

pub fn user_toggle_access_endpoint(base_url: &str, id: &str) -> String {
    join(base_url, &format!("/users/admin/{}/toggle-access", id))
}

pub fn settings_endpoint(base_url: &str) -> String {
    join(base_url, "/users/admin/settings/all")
}

pub fn setting_endpoint(base_url: &str, key: &str) -> String {
    join(base_url, &format!("/users/admin/settings/{}", key))
}

pub fn version_endpoint(base_url: &str) -> String {
    join(base_url, "/version")
}

pub fn webhook_url(base_url: &str) -> String {
    join(base_url, WEBHOOK_CREATE_CLIENT_PATH)
}
