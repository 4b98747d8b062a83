use async_trait::async_trait;

use super::client::BlueprintClient;
use super::models::{ProjectDetailsUpdate, StructurePayload, ToggleSubtaskResponse};

/// The project mutations the board works against.
///
/// `BlueprintClient` is the production implementation; tests substitute an
/// in-memory server.
#[async_trait]
pub trait ProjectBackend: Send + Sync {
    async fn toggle_subtask(&self, project_id: &str, subtask_id: &str) -> anyhow::Result<ToggleSubtaskResponse>;

    async fn toggle_task(&self, project_id: &str, task_id: &str) -> anyhow::Result<()>;

    async fn save_subtask_answer(&self, project_id: &str, subtask_id: &str, answer: &str) -> anyhow::Result<()>;

    /// `None` removes the link
    async fn set_subtask_link(&self, project_id: &str, subtask_id: &str, link: Option<&str>) -> anyhow::Result<()>;

    /// `None` removes the link
    async fn set_task_link(&self, project_id: &str, task_id: &str, link: Option<&str>) -> anyhow::Result<()>;

    async fn update_project_details(&self, project_id: &str, details: &ProjectDetailsUpdate) -> anyhow::Result<()>;

    async fn save_project_structure(&self, project_id: &str, structure: &StructurePayload) -> anyhow::Result<()>;
}

#[async_trait]
impl ProjectBackend for BlueprintClient {
    async fn toggle_subtask(&self, project_id: &str, subtask_id: &str) -> anyhow::Result<ToggleSubtaskResponse> {
        BlueprintClient::toggle_subtask(self, project_id, subtask_id).await
    }

    async fn toggle_task(&self, project_id: &str, task_id: &str) -> anyhow::Result<()> {
        BlueprintClient::toggle_task(self, project_id, task_id).await
    }

    async fn save_subtask_answer(&self, project_id: &str, subtask_id: &str, answer: &str) -> anyhow::Result<()> {
        BlueprintClient::save_subtask_answer(self, project_id, subtask_id, answer).await
    }

    async fn set_subtask_link(&self, project_id: &str, subtask_id: &str, link: Option<&str>) -> anyhow::Result<()> {
        BlueprintClient::set_subtask_link(self, project_id, subtask_id, link).await
    }

    async fn set_task_link(&self, project_id: &str, task_id: &str, link: Option<&str>) -> anyhow::Result<()> {
        BlueprintClient::set_task_link(self, project_id, task_id, link).await
    }

    async fn update_project_details(&self, project_id: &str, details: &ProjectDetailsUpdate) -> anyhow::Result<()> {
        BlueprintClient::update_project_details(self, project_id, details).await
    }

    async fn save_project_structure(&self, project_id: &str, structure: &StructurePayload) -> anyhow::Result<()> {
        BlueprintClient::save_project_structure(self, project_id, structure).await
    }
}
