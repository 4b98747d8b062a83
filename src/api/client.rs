use super::constants::{self, headers};
use super::error::ApiError;
use super::models::*;
use super::resilience::{ApiLogger, RequestContext, ResilienceConfig, RetryPolicy};
use anyhow::Context;
use log::debug;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};

/// HTTP client for the BluePrint REST API with connection pooling
///
/// Attaches the bearer token to every request when a session is active.
/// Read-only requests are retried on transient failures; mutations are sent
/// once.
#[derive(Clone)]
pub struct BlueprintClient {
    base_url: String,
    http_client: reqwest::Client,
    token: Option<String>,
    retry_policy: RetryPolicy,
    api_logger: ApiLogger,
}

impl BlueprintClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        Self::with_config(base_url, token, ResilienceConfig::default())
    }

    pub fn with_config(
        base_url: impl Into<String>,
        token: Option<String>,
        config: ResilienceConfig,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("blueprint-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            token,
            retry_policy: RetryPolicy::new(config.retry),
            api_logger: ApiLogger::new(config.monitoring),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, url: &str, context: &RequestContext) -> RequestBuilder {
        let mut builder = self
            .http_client
            .request(method, url)
            .header(reqwest::header::ACCEPT, headers::CONTENT_TYPE_JSON);

        if self.api_logger.correlation_ids_enabled() {
            builder = builder.header(headers::CORRELATION_ID, context.correlation_id.as_str());
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let context = self.api_logger.start_request("GET", url);
        let response = self
            .retry_policy
            .execute(|| self.request(Method::GET, url, &context).query(query).send())
            .await;
        self.finish(&context, response).await
    }

    async fn send_json<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let context = self.api_logger.start_request(method.as_str(), url);
        let mut builder = self.request(method, url, &context);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(ApiError::Network);
        self.finish(&context, response).await
    }

    async fn finish<T: DeserializeOwned>(
        &self,
        context: &RequestContext,
        response: Result<Response, ApiError>,
    ) -> Result<T, ApiError> {
        let response = match response {
            Ok(response) => response,
            Err(error) => {
                self.api_logger.log_failure(context, &error.to_string());
                return Err(error);
            }
        };

        let status = response.status();
        self.api_logger.log_response(context, status.as_u16());
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }

        decode_body(&body)
    }

    // Auth

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<LoginResponse> {
        let url = constants::login_endpoint(&self.base_url);
        Ok(self
            .send_json(Method::POST, &url, Some(&LoginRequest { email, password }))
            .await
            .context("Login failed")?)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> anyhow::Result<User> {
        let url = constants::register_endpoint(&self.base_url);
        let body = RegisterRequest { name, email, password };
        Ok(self
            .send_json(Method::POST, &url, Some(&body))
            .await
            .context("Registration failed")?)
    }

    pub async fn me(&self) -> anyhow::Result<User> {
        let url = constants::me_endpoint(&self.base_url);
        Ok(self
            .send_json(Method::POST, &url, Some(&json!({})))
            .await
            .context("Failed to load the current user")?)
    }

    // Templates

    pub async fn list_templates(&self, include_inactive: bool) -> anyhow::Result<Vec<Template>> {
        let url = constants::templates_endpoint(&self.base_url);
        let query: &[(&str, &str)] = if include_inactive {
            &[constants::INCLUDE_INACTIVE]
        } else {
            &[]
        };
        Ok(self.get_json(&url, query).await.context("Failed to list templates")?)
    }

    pub async fn list_public_templates(&self) -> anyhow::Result<Vec<Template>> {
        let url = constants::public_templates_endpoint(&self.base_url);
        Ok(self
            .get_json(&url, &[])
            .await
            .context("Failed to list public templates")?)
    }

    pub async fn get_template(&self, id: &str) -> anyhow::Result<Template> {
        let url = constants::template_endpoint(&self.base_url, id);
        Ok(self
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to load template {}", id))?)
    }

    pub async fn create_template(&self, payload: &TemplatePayload) -> anyhow::Result<Template> {
        let url = constants::templates_endpoint(&self.base_url);
        Ok(self
            .send_json(Method::POST, &url, Some(payload))
            .await
            .context("Failed to create template")?)
    }

    pub async fn update_template(&self, id: &str, payload: &TemplatePayload) -> anyhow::Result<Template> {
        let url = constants::template_endpoint(&self.base_url, id);
        Ok(self
            .send_json(Method::PUT, &url, Some(payload))
            .await
            .with_context(|| format!("Failed to update template {}", id))?)
    }

    pub async fn set_template_active(&self, id: &str, is_active: bool) -> anyhow::Result<Template> {
        let url = constants::template_endpoint(&self.base_url, id);
        Ok(self
            .send_json(Method::PATCH, &url, Some(&json!({ "isActive": is_active })))
            .await
            .with_context(|| format!("Failed to update template {}", id))?)
    }

    pub async fn toggle_template_active(&self, id: &str) -> anyhow::Result<Template> {
        let url = constants::template_toggle_active_endpoint(&self.base_url, id);
        Ok(self
            .send_json(Method::PATCH, &url, Some(&json!({})))
            .await
            .with_context(|| format!("Failed to toggle template {}", id))?)
    }

    pub async fn delete_template(&self, id: &str) -> anyhow::Result<()> {
        let url = constants::template_endpoint(&self.base_url, id);
        self.send_json::<(), IgnoredAny>(Method::DELETE, &url, None)
            .await
            .with_context(|| format!("Failed to delete template {}", id))?;
        Ok(())
    }

    // Projects

    pub async fn list_projects(&self) -> anyhow::Result<Vec<Project>> {
        let url = constants::projects_endpoint(&self.base_url);
        Ok(self.get_json(&url, &[]).await.context("Failed to list projects")?)
    }

    pub async fn my_projects(&self) -> anyhow::Result<Vec<Project>> {
        let url = constants::my_projects_endpoint(&self.base_url);
        Ok(self.get_json(&url, &[]).await.context("Failed to list your projects")?)
    }

    pub async fn get_project(&self, id: &str) -> anyhow::Result<Project> {
        let url = constants::project_endpoint(&self.base_url, id);
        Ok(self
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to load project {}", id))?)
    }

    pub async fn project_progress(&self, id: &str) -> anyhow::Result<Value> {
        let url = constants::project_progress_endpoint(&self.base_url, id);
        Ok(self
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to load progress of project {}", id))?)
    }

    pub async fn create_project(&self, request: &CreateProjectRequest) -> anyhow::Result<Project> {
        let url = constants::projects_endpoint(&self.base_url);
        Ok(self
            .send_json(Method::POST, &url, Some(request))
            .await
            .context("Failed to create project")?)
    }

    pub async fn delete_project(&self, id: &str) -> anyhow::Result<()> {
        let url = constants::project_endpoint(&self.base_url, id);
        self.send_json::<(), IgnoredAny>(Method::DELETE, &url, None)
            .await
            .with_context(|| format!("Failed to delete project {}", id))?;
        Ok(())
    }

    // Users (admin)

    pub async fn list_users_with_stats(&self) -> anyhow::Result<Vec<User>> {
        let url = constants::users_with_stats_endpoint(&self.base_url);
        Ok(self.get_json(&url, &[]).await.context("Failed to list users")?)
    }

    pub async fn user_audit_log(&self, user_id: &str) -> anyhow::Result<Vec<AuditLogEntry>> {
        let url = constants::user_audit_log_endpoint(&self.base_url, user_id);
        Ok(self
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to load audit log of user {}", user_id))?)
    }

    pub async fn create_user(&self, payload: &UserPayload) -> anyhow::Result<User> {
        let url = constants::user_create_endpoint(&self.base_url);
        Ok(self
            .send_json(Method::POST, &url, Some(payload))
            .await
            .context("Failed to create user")?)
    }

    pub async fn update_user(&self, user_id: &str, payload: &UserPayload) -> anyhow::Result<User> {
        let url = constants::user_endpoint(&self.base_url, user_id);
        Ok(self
            .send_json(Method::PUT, &url, Some(payload))
            .await
            .with_context(|| format!("Failed to update user {}", user_id))?)
    }

    pub async fn set_user_access(&self, user_id: &str, is_active: bool) -> anyhow::Result<()> {
        let url = constants::user_toggle_access_endpoint(&self.base_url, user_id);
        self.send_json::<_, IgnoredAny>(Method::PATCH, &url, Some(&json!({ "isActive": is_active })))
            .await
            .with_context(|| format!("Failed to change access of user {}", user_id))?;
        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> anyhow::Result<()> {
        let url = constants::user_endpoint(&self.base_url, user_id);
        self.send_json::<(), IgnoredAny>(Method::DELETE, &url, None)
            .await
            .with_context(|| format!("Failed to delete user {}", user_id))?;
        Ok(())
    }

    // Settings (admin)

    pub async fn list_settings(&self) -> anyhow::Result<Vec<Setting>> {
        let url = constants::settings_endpoint(&self.base_url);
        Ok(self.get_json(&url, &[]).await.context("Failed to load settings")?)
    }

    pub async fn update_setting(&self, key: &str, update: &SettingUpdate) -> anyhow::Result<()> {
        let url = constants::setting_endpoint(&self.base_url, key);
        self.send_json::<_, IgnoredAny>(Method::PUT, &url, Some(update))
            .await
            .with_context(|| format!("Failed to save setting {}", key))?;
        Ok(())
    }

    pub async fn version(&self) -> anyhow::Result<VersionInfo> {
        let url = constants::version_endpoint(&self.base_url);
        Ok(self.get_json(&url, &[]).await.context("Failed to load backend version")?)
    }

    // Project board mutations, also reachable through `ProjectBackend`

    pub async fn toggle_subtask(&self, project_id: &str, subtask_id: &str) -> anyhow::Result<ToggleSubtaskResponse> {
        let url = constants::subtask_action_endpoint(&self.base_url, project_id, subtask_id, "toggle");
        let response: Option<ToggleSubtaskResponse> = self
            .send_json(Method::PATCH, &url, Some(&json!({})))
            .await
            .with_context(|| format!("Failed to toggle subtask {}", subtask_id))?;
        debug!("Toggle response for subtask {}: {:?}", subtask_id, response);
        Ok(response.unwrap_or_default())
    }

    pub async fn toggle_task(&self, project_id: &str, task_id: &str) -> anyhow::Result<()> {
        let url = constants::task_action_endpoint(&self.base_url, project_id, task_id, "toggle");
        self.send_json::<_, IgnoredAny>(Method::PATCH, &url, Some(&json!({})))
            .await
            .with_context(|| format!("Failed to toggle task {}", task_id))?;
        Ok(())
    }

    pub async fn save_subtask_answer(&self, project_id: &str, subtask_id: &str, answer: &str) -> anyhow::Result<()> {
        let url = constants::subtask_action_endpoint(&self.base_url, project_id, subtask_id, "answer");
        self.send_json::<_, IgnoredAny>(Method::PATCH, &url, Some(&json!({ "answer": answer })))
            .await
            .with_context(|| format!("Failed to save answer of subtask {}", subtask_id))?;
        Ok(())
    }

    pub async fn set_subtask_link(&self, project_id: &str, subtask_id: &str, link: Option<&str>) -> anyhow::Result<()> {
        let url = constants::subtask_action_endpoint(&self.base_url, project_id, subtask_id, "link");
        self.send_json::<_, IgnoredAny>(Method::PATCH, &url, Some(&json!({ "link": link })))
            .await
            .with_context(|| format!("Failed to update link of subtask {}", subtask_id))?;
        Ok(())
    }

    pub async fn set_task_link(&self, project_id: &str, task_id: &str, link: Option<&str>) -> anyhow::Result<()> {
        let url = constants::task_action_endpoint(&self.base_url, project_id, task_id, "link");
        self.send_json::<_, IgnoredAny>(Method::PATCH, &url, Some(&json!({ "link": link })))
            .await
            .with_context(|| format!("Failed to update link of task {}", task_id))?;
        Ok(())
    }

    pub async fn update_project_details(&self, project_id: &str, details: &ProjectDetailsUpdate) -> anyhow::Result<()> {
        let url = constants::project_details_endpoint(&self.base_url, project_id);
        self.send_json::<_, IgnoredAny>(Method::PATCH, &url, Some(details))
            .await
            .with_context(|| format!("Failed to update details of project {}", project_id))?;
        Ok(())
    }

    pub async fn save_project_structure(&self, project_id: &str, structure: &StructurePayload) -> anyhow::Result<()> {
        let url = constants::project_structure_endpoint(&self.base_url, project_id);
        self.send_json::<_, IgnoredAny>(Method::PUT, &url, Some(structure))
            .await
            .with_context(|| format!("Failed to save structure of project {}", project_id))?;
        Ok(())
    }
}

/// Empty bodies decode as JSON `null`
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let trimmed = body.trim();
    let text = if trimmed.is_empty() { "null" } else { trimmed };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_body() {
        let value: Option<ToggleSubtaskResponse> = decode_body("").unwrap();
        assert!(value.is_none());

        let _: IgnoredAny = decode_body("   ").unwrap();
        let _: IgnoredAny = decode_body(r#"{"deleted":true}"#).unwrap();
    }

    #[test]
    fn test_decode_error_is_typed() {
        let result: Result<Vec<Template>, ApiError> = decode_body("{not json");
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = BlueprintClient::new("http://localhost:3000/api/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert!(!client.has_token());
    }
}
