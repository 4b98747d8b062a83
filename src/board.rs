//! Client-side state of one project and the mutations a user performs on it
//!
//! The server is authoritative: local state changes only after a request
//! succeeds. Derived values (task completion, progress) are recomputed from
//! the confirmed state after every change.

use anyhow::{Result, bail};
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::api::backend::ProjectBackend;
use crate::api::error::is_unauthorized;
use crate::api::models::{
    CURRENCIES, GemType, Project, ProjectDetailsUpdate, ProjectStatus, Stage, Subtask, Task,
    TaskStatus,
};
use crate::links::{normalize_url, parse_link_input};
use crate::notify::{Notifier, Reported};
use crate::progress::{derive_task_completion, project_progress};
use crate::structure::{StructureDraft, TaskRef};

/// The gem-unlocked dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AchievementModal {
    #[default]
    Hidden,
    Showing(GemType),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleOutcome {
    pub completed: bool,
    pub task_completed: bool,
    pub progress: f64,
    /// Set when this toggle unlocked a new gem
    pub unlocked: Option<GemType>,
}

/// Result of saving every answer of a stage at once
#[derive(Debug, Default)]
pub struct BulkSaveReport {
    pub saved: Vec<String>,
    pub failed: Vec<(String, anyhow::Error)>,
}

impl BulkSaveReport {
    pub fn total(&self) -> usize {
        self.saved.len() + self.failed.len()
    }

    pub fn all_saved(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when a failure was caused by an expired session
    pub fn requires_login(&self) -> bool {
        self.failed.iter().any(|(_, e)| is_unauthorized(e))
    }
}

/// Answers typed but not yet saved, keyed by subtask id
#[derive(Debug, Clone, Default)]
pub struct AnswerDrafts {
    drafts: HashMap<String, String>,
}

impl AnswerDrafts {
    pub fn set(&mut self, subtask_id: impl Into<String>, answer: impl Into<String>) {
        self.drafts.insert(subtask_id.into(), answer.into());
    }

    pub fn get(&self, subtask_id: &str) -> Option<&str> {
        self.drafts.get(subtask_id).map(String::as_str)
    }

    pub fn discard(&mut self, subtask_id: &str) {
        self.drafts.remove(subtask_id);
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

/// Where a task lives inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLocation {
    Stage { stage: usize, task: usize },
    Standalone { task: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskLocation {
    pub task: TaskLocation,
    pub subtask: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct KanbanCard<'a> {
    pub task: &'a Task,
    pub project_name: &'a str,
    pub stage_name: Option<&'a str>,
    pub gem: Option<GemType>,
}

/// All tasks of a project grouped by status
#[derive(Debug, Default)]
pub struct Kanban<'a> {
    pub todo: Vec<KanbanCard<'a>>,
    pub in_progress: Vec<KanbanCard<'a>>,
    pub done: Vec<KanbanCard<'a>>,
}

impl<'a> Kanban<'a> {
    /// Every task of every project, stage tasks first, grouped by status
    pub fn from_projects(projects: impl IntoIterator<Item = &'a Project>) -> Self {
        let mut kanban = Kanban::default();
        for project in projects {
            let mut stages: Vec<&Stage> = project.project_stages.iter().collect();
            stages.sort_by_key(|s| s.order);

            for stage in stages {
                for task in &stage.tasks {
                    kanban.push(KanbanCard {
                        task,
                        project_name: &project.name,
                        stage_name: Some(&stage.name),
                        gem: Some(stage.gem_type),
                    });
                }
            }
            for task in &project.project_tasks {
                kanban.push(KanbanCard {
                    task,
                    project_name: &project.name,
                    stage_name: None,
                    gem: None,
                });
            }
        }
        kanban
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, status: TaskStatus) -> &[KanbanCard<'a>] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    fn push(&mut self, card: KanbanCard<'a>) {
        match card.task.status() {
            TaskStatus::Todo => self.todo.push(card),
            TaskStatus::InProgress => self.in_progress.push(card),
            TaskStatus::Done => self.done.push(card),
        }
    }
}

/// Controlled-input state of the project details panel
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsForm {
    pub name: String,
    pub status: ProjectStatus,
    pub price: String,
    pub currency: String,
    pub sale_start_date: String,
    pub links: BTreeMap<String, String>,
    dirty: bool,
}

impl DetailsForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            status: project.status.unwrap_or_default(),
            price: project.price.clone().unwrap_or_default(),
            currency: project.currency.clone().unwrap_or_else(|| "BRL".to_string()),
            sale_start_date: project
                .sale_start_date
                .as_deref()
                .map(|d| d.chars().take(10).collect())
                .unwrap_or_default(),
            links: project.links.clone(),
            dirty: false,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Drops every edit and goes back to the project's values
    pub fn reset(&mut self, project: &Project) {
        *self = Self::from_project(project);
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.status = status;
        self.dirty = true;
    }

    pub fn set_price(&mut self, price: impl Into<String>) {
        self.price = price.into();
        self.dirty = true;
    }

    pub fn set_currency(&mut self, currency: &str) -> Result<()> {
        let currency = currency.trim().to_ascii_uppercase();
        if !CURRENCIES.contains(&currency.as_str()) {
            bail!("Moeda não suportada: {} (use {})", currency, CURRENCIES.join(", "));
        }
        self.currency = currency;
        self.dirty = true;
        Ok(())
    }

    pub fn set_sale_start_date(&mut self, date: impl Into<String>) {
        self.sale_start_date = date.into();
        self.dirty = true;
    }

    pub fn add_link(&mut self, name: &str, url: &str) -> Result<()> {
        if name.trim().is_empty() || url.trim().is_empty() {
            bail!("Preencha o nome e a URL do link");
        }
        self.links.insert(name.trim().to_string(), normalize_url(url));
        self.dirty = true;
        Ok(())
    }

    pub fn remove_link(&mut self, name: &str) -> bool {
        let removed = self.links.remove(name).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn to_update(&self) -> Result<ProjectDetailsUpdate> {
        if self.name.trim().is_empty() {
            bail!("O nome do projeto é obrigatório");
        }

        let price = match self.price.trim() {
            "" => None,
            raw => Some(
                raw.replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("Preço inválido: {}", raw))?,
            ),
        };

        let sale_start_date = match self.sale_start_date.trim() {
            "" => None,
            raw => {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| anyhow::anyhow!("Data inválida: {} (use AAAA-MM-DD)", raw))?;
                Some(raw.to_string())
            }
        };

        Ok(ProjectDetailsUpdate {
            name: self.name.trim().to_string(),
            status: self.status,
            price,
            currency: self.currency.clone(),
            sale_start_date,
            links: self.links.clone(),
        })
    }

    fn mark_saved(&mut self) {
        self.dirty = false;
    }
}

pub struct ProjectBoard {
    project: Project,
    achievement: AchievementModal,
    drafts: AnswerDrafts,
    notifier: Arc<dyn Notifier>,
}

impl ProjectBoard {
    pub fn new(mut project: Project, notifier: Arc<dyn Notifier>) -> Self {
        project.progress = project_progress(&project);
        Self {
            project,
            achievement: AchievementModal::Hidden,
            drafts: AnswerDrafts::default(),
            notifier,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn achievement(&self) -> AchievementModal {
        self.achievement
    }

    pub fn dismiss_achievement(&mut self) {
        self.achievement = AchievementModal::Hidden;
    }

    pub fn drafts(&self) -> &AnswerDrafts {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut AnswerDrafts {
        &mut self.drafts
    }

    pub fn progress(&self) -> f64 {
        self.project.progress
    }

    pub fn current_gem(&self) -> Option<GemType> {
        self.project.current_gem
    }

    fn fail(&self, message: &str, error: anyhow::Error) -> anyhow::Error {
        warn!("{}: {:#}", message, error);
        self.notifier.error(message);
        error.context(Reported(message.to_string()))
    }

    fn reject(&self, message: &str) -> anyhow::Error {
        self.notifier.warning(message);
        anyhow::Error::msg(message.to_string()).context(Reported(message.to_string()))
    }

    fn task(&self, location: TaskLocation) -> Option<&Task> {
        match location {
            TaskLocation::Stage { stage, task } => self.project.project_stages.get(stage)?.tasks.get(task),
            TaskLocation::Standalone { task } => self.project.project_tasks.get(task),
        }
    }

    fn task_mut(&mut self, location: TaskLocation) -> Option<&mut Task> {
        match location {
            TaskLocation::Stage { stage, task } => {
                self.project.project_stages.get_mut(stage)?.tasks.get_mut(task)
            }
            TaskLocation::Standalone { task } => self.project.project_tasks.get_mut(task),
        }
    }

    fn subtask_mut(&mut self, location: SubtaskLocation) -> Option<&mut Subtask> {
        self.task_mut(location.task)?.subtasks.get_mut(location.subtask)
    }

    fn task_locations(&self) -> Vec<TaskLocation> {
        let stage_tasks = self
            .project
            .project_stages
            .iter()
            .enumerate()
            .flat_map(|(stage, s)| (0..s.tasks.len()).map(move |task| TaskLocation::Stage { stage, task }));
        let standalone = (0..self.project.project_tasks.len()).map(|task| TaskLocation::Standalone { task });
        stage_tasks.chain(standalone).collect()
    }

    pub fn locate_task(&self, task_id: &str) -> Option<TaskLocation> {
        self.task_locations()
            .into_iter()
            .find(|&loc| self.task(loc).and_then(|t| t.id.as_deref()) == Some(task_id))
    }

    pub fn locate_subtask(&self, subtask_id: &str) -> Option<SubtaskLocation> {
        self.task_locations().into_iter().find_map(|loc| {
            let task = self.task(loc)?;
            let subtask = task
                .subtasks
                .iter()
                .position(|s| s.id.as_deref() == Some(subtask_id))?;
            Some(SubtaskLocation { task: loc, subtask })
        })
    }

    /// Accepts a subtask id or a 1-based `stage.task.subtask` path; stage `0` means standalone tasks
    pub fn resolve_subtask_id(&self, key: &str) -> Result<String> {
        if self.locate_subtask(key).is_some() {
            return Ok(key.to_string());
        }

        let parts: Vec<usize> = key
            .split('.')
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| anyhow::anyhow!("Subtarefa não encontrada: {}", key))?;

        let (stage, task, subtask) = match parts.as_slice() {
            [stage, task, subtask] if *task > 0 && *subtask > 0 => (*stage, task - 1, subtask - 1),
            _ => bail!("Subtarefa não encontrada: {}", key),
        };
        let tasks = if stage == 0 {
            &self.project.project_tasks
        } else {
            match self.sorted_stage(stage - 1) {
                Some(s) => &s.tasks,
                None => bail!("Etapa {} não existe", stage),
            }
        };
        let mut ordered: Vec<&Task> = tasks.iter().collect();
        ordered.sort_by_key(|t| t.order);

        ordered
            .get(task)
            .and_then(|t| t.subtasks.get(subtask))
            .and_then(|s| s.id.clone())
            .ok_or_else(|| anyhow::anyhow!("Subtarefa não encontrada: {}", key))
    }

    /// Accepts a task id or a 1-based `stage.task` path; stage `0` means standalone tasks
    pub fn resolve_task_id(&self, key: &str) -> Result<String> {
        if self.locate_task(key).is_some() {
            return Ok(key.to_string());
        }
        let not_found = || anyhow::anyhow!("Tarefa não encontrada: {}", key);

        let (tasks, index) = match TaskRef::parse(key).map_err(|_| not_found())? {
            TaskRef::Standalone(task) => (&self.project.project_tasks, task),
            TaskRef::Stage { stage, task } => (&self.sorted_stage(stage).ok_or_else(not_found)?.tasks, task),
        };
        let mut ordered: Vec<&Task> = tasks.iter().collect();
        ordered.sort_by_key(|t| t.order);

        ordered
            .get(index)
            .and_then(|t| t.id.clone())
            .ok_or_else(not_found)
    }

    fn sorted_stage(&self, index: usize) -> Option<&Stage> {
        let mut stages: Vec<&Stage> = self.project.project_stages.iter().collect();
        stages.sort_by_key(|s| s.order);
        stages.get(index).copied()
    }

    /// Accepts a stage id or its 1-based position
    pub fn resolve_stage(&self, key: &str) -> Option<&Stage> {
        if let Some(stage) = self
            .project
            .project_stages
            .iter()
            .find(|s| s.id.as_deref() == Some(key))
        {
            return Some(stage);
        }
        let position: usize = key.parse().ok()?;
        self.sorted_stage(position.checked_sub(1)?)
    }

    fn recompute(&mut self, location: TaskLocation) {
        if let Some(task) = self.task_mut(location) {
            derive_task_completion(task);
        }
        self.project.progress = project_progress(&self.project);
    }

    /// Toggles one subtask; local state changes only after the server confirms
    pub async fn toggle_subtask<B>(&mut self, api: &B, subtask_id: &str) -> Result<ToggleOutcome>
    where
        B: ProjectBackend + ?Sized,
    {
        let Some(location) = self.locate_subtask(subtask_id) else {
            return Err(self.reject("Subtarefa não encontrada"));
        };

        let response = match api.toggle_subtask(&self.project.id, subtask_id).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail("Erro ao atualizar subtarefa", e)),
        };

        let subtask = self
            .subtask_mut(location)
            .ok_or_else(|| anyhow::anyhow!("Subtask {} disappeared", subtask_id))?;
        let completed = response.completed.unwrap_or(!subtask.completed);
        subtask.completed = completed;

        self.recompute(location.task);
        let task_completed = self.task(location.task).map(|t| t.completed).unwrap_or(false);

        let unlocked = response
            .gem_change
            .filter(|change| change.changed)
            .and_then(|change| change.new_gem);
        if let Some(gem) = unlocked {
            info!("Gem unlocked on project {}: {}", self.project.id, gem);
            self.project.current_gem = Some(gem);
            self.achievement = AchievementModal::Showing(gem);
        }

        self.notifier.success(if completed {
            "Subtarefa concluída!"
        } else {
            "Subtarefa reaberta"
        });

        Ok(ToggleOutcome {
            completed,
            task_completed,
            progress: self.project.progress,
            unlocked,
        })
    }

    /// Toggles a task that has no subtasks; tasks with subtasks follow their subtasks
    pub async fn toggle_task<B>(&mut self, api: &B, task_id: &str) -> Result<bool>
    where
        B: ProjectBackend + ?Sized,
    {
        let Some(location) = self.locate_task(task_id) else {
            return Err(self.reject("Tarefa não encontrada"));
        };
        if self.task(location).is_some_and(|t| !t.subtasks.is_empty()) {
            return Err(self.reject("Esta tarefa é concluída pelas suas subtarefas"));
        }

        if let Err(e) = api.toggle_task(&self.project.id, task_id).await {
            return Err(self.fail("Erro ao atualizar tarefa", e));
        }

        let task = self
            .task_mut(location)
            .ok_or_else(|| anyhow::anyhow!("Task {} disappeared", task_id))?;
        task.completed = !task.completed;
        let completed = task.completed;
        self.project.progress = project_progress(&self.project);

        self.notifier
            .success(if completed { "Tarefa concluída!" } else { "Tarefa reaberta" });
        Ok(completed)
    }

    pub async fn save_answer<B>(&mut self, api: &B, subtask_id: &str, answer: &str) -> Result<()>
    where
        B: ProjectBackend + ?Sized,
    {
        let Some(location) = self.locate_subtask(subtask_id) else {
            return Err(self.reject("Subtarefa não encontrada"));
        };

        if let Err(e) = api.save_subtask_answer(&self.project.id, subtask_id, answer).await {
            return Err(self.fail("Erro ao salvar resposta", e));
        }

        if let Some(subtask) = self.subtask_mut(location) {
            subtask.answer = Some(answer.to_string());
        }
        self.drafts.discard(subtask_id);
        self.notifier.success("Resposta salva!");
        Ok(())
    }

    /// Saves the answer of every subtask in a stage concurrently.
    ///
    /// Each subtask sends its draft if one exists, else its current answer.
    /// Successes are applied locally, failures keep their draft, and exactly
    /// one notice summarizes the batch.
    pub async fn save_all_answers<B>(&mut self, api: &B, stage_key: &str) -> Result<BulkSaveReport>
    where
        B: ProjectBackend + ?Sized,
    {
        let Some(stage) = self.resolve_stage(stage_key) else {
            return Err(self.reject("Etapa não encontrada"));
        };

        let jobs: Vec<(String, String)> = stage
            .tasks
            .iter()
            .flat_map(|t| t.subtasks.iter())
            .filter_map(|s| {
                let id = s.id.clone()?;
                let answer = self
                    .drafts
                    .get(&id)
                    .map(str::to_string)
                    .or_else(|| s.answer.clone())
                    .unwrap_or_default();
                Some((id, answer))
            })
            .collect();

        debug!("Saving {} answers of stage {}", jobs.len(), stage_key);
        let project_id = self.project.id.clone();
        let results = join_all(
            jobs.iter()
                .map(|(id, answer)| api.save_subtask_answer(&project_id, id, answer)),
        )
        .await;

        let mut report = BulkSaveReport::default();
        for ((id, answer), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    if let Some(subtask) = self
                        .locate_subtask(&id)
                        .and_then(|loc| self.subtask_mut(loc))
                    {
                        subtask.answer = Some(answer);
                    }
                    self.drafts.discard(&id);
                    report.saved.push(id);
                }
                Err(e) => {
                    warn!("Failed to save answer of subtask {}: {:#}", id, e);
                    report.failed.push((id, e));
                }
            }
        }

        if report.all_saved() {
            self.notifier.success("Todas as respostas foram salvas!");
        } else {
            self.notifier.error("Erro ao salvar respostas");
        }

        Ok(report)
    }

    /// Sets (`Some`) or removes (`None`) a subtask's link
    pub async fn set_subtask_link<B>(&mut self, api: &B, subtask_id: &str, link: Option<&str>) -> Result<()>
    where
        B: ProjectBackend + ?Sized,
    {
        let Some(location) = self.locate_subtask(subtask_id) else {
            return Err(self.reject("Subtarefa não encontrada"));
        };
        let link = match link.map(parse_link_input).transpose() {
            Ok(link) => link,
            Err(e) => return Err(self.reject(&e.to_string())),
        };

        if let Err(e) = api
            .set_subtask_link(&self.project.id, subtask_id, link.as_deref())
            .await
        {
            return Err(self.fail("Erro ao salvar link", e));
        }

        let removed = link.is_none();
        if let Some(subtask) = self.subtask_mut(location) {
            subtask.link = link;
        }
        self.notifier
            .success(if removed { "Link removido!" } else { "Link salvo!" });
        Ok(())
    }

    /// Sets (`Some`) or removes (`None`) a task's link
    pub async fn set_task_link<B>(&mut self, api: &B, task_id: &str, link: Option<&str>) -> Result<()>
    where
        B: ProjectBackend + ?Sized,
    {
        let Some(location) = self.locate_task(task_id) else {
            return Err(self.reject("Tarefa não encontrada"));
        };
        let link = match link.map(parse_link_input).transpose() {
            Ok(link) => link,
            Err(e) => return Err(self.reject(&e.to_string())),
        };

        if let Err(e) = api.set_task_link(&self.project.id, task_id, link.as_deref()).await {
            return Err(self.fail("Erro ao salvar link", e));
        }

        let removed = link.is_none();
        if let Some(task) = self.task_mut(location) {
            task.link = link;
        }
        self.notifier
            .success(if removed { "Link removido!" } else { "Link salvo!" });
        Ok(())
    }

    pub async fn save_details<B>(&mut self, api: &B, form: &mut DetailsForm) -> Result<()>
    where
        B: ProjectBackend + ?Sized,
    {
        let update = match form.to_update() {
            Ok(update) => update,
            Err(e) => return Err(self.reject(&e.to_string())),
        };

        if let Err(e) = api.update_project_details(&self.project.id, &update).await {
            return Err(self.fail("Erro ao salvar alterações", e));
        }

        self.project.name = update.name;
        self.project.status = Some(update.status);
        self.project.price = update.price.map(|p| p.to_string());
        self.project.currency = Some(update.currency);
        self.project.sale_start_date = update.sale_start_date;
        self.project.links = update.links;
        form.mark_saved();

        self.notifier.success("Alterações salvas com sucesso!");
        Ok(())
    }

    /// Replaces the project's stages with an edited structure once the server accepts it
    pub async fn save_structure<B>(&mut self, api: &B, draft: &StructureDraft) -> Result<()>
    where
        B: ProjectBackend + ?Sized,
    {
        if let Err(e) = draft.validate_structure() {
            return Err(self.reject(&e.to_string()));
        }

        if let Err(e) = api
            .save_project_structure(&self.project.id, &draft.to_structure_payload())
            .await
        {
            let message = format!(
                "Erro ao salvar: {}",
                crate::api::error::message_or(&e, "Erro desconhecido")
            );
            return Err(self.fail(&message, e));
        }

        self.project.project_stages = draft.stages.clone();
        for location in self.task_locations() {
            if let Some(task) = self.task_mut(location) {
                derive_task_completion(task);
            }
        }
        self.project.progress = project_progress(&self.project);

        self.notifier.success("Alterações salvas com sucesso!");
        Ok(())
    }

    pub fn kanban(&self) -> Kanban<'_> {
        Kanban::from_projects(std::iter::once(&self.project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{GemChange, StructurePayload, ToggleSubtaskResponse};
    use crate::notify::{NoticeLevel, NoticeLog, is_reported};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripted {
        fail: bool,
        gem_change: Option<GemChange>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProjectBackend for Scripted {
        async fn toggle_subtask(&self, _: &str, id: &str) -> Result<ToggleSubtaskResponse> {
            self.calls.lock().unwrap().push(format!("toggle {}", id));
            if self.fail {
                bail!("HTTP 500");
            }
            Ok(ToggleSubtaskResponse {
                gem_change: self.gem_change,
                ..Default::default()
            })
        }
        async fn toggle_task(&self, _: &str, _: &str) -> Result<()> {
            if self.fail { bail!("HTTP 500") } else { Ok(()) }
        }
        async fn save_subtask_answer(&self, _: &str, _: &str, _: &str) -> Result<()> {
            if self.fail { bail!("HTTP 500") } else { Ok(()) }
        }
        async fn set_subtask_link(&self, _: &str, _: &str, link: Option<&str>) -> Result<()> {
            self.calls.lock().unwrap().push(format!("link {:?}", link));
            Ok(())
        }
        async fn set_task_link(&self, _: &str, _: &str, _: Option<&str>) -> Result<()> {
            Ok(())
        }
        async fn update_project_details(&self, _: &str, _: &ProjectDetailsUpdate) -> Result<()> {
            if self.fail { bail!("HTTP 500") } else { Ok(()) }
        }
        async fn save_project_structure(&self, _: &str, _: &StructurePayload) -> Result<()> {
            Ok(())
        }
    }

    fn project() -> Project {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Projeto",
            "projectStages": [{
                "id": "s1", "name": "Etapa", "order": 0, "gemType": "ESMERALDA",
                "tasks": [
                    { "id": "t1", "title": "Com subtarefas", "order": 0, "status": "IN_PROGRESS",
                      "subtasks": [ { "id": "a", "description": "A" }, { "id": "b", "description": "B" } ] },
                    { "id": "t2", "title": "Sem subtarefas", "order": 1 }
                ]
            }],
            "projectTasks": [ { "id": "t3", "title": "Avulsa", "status": "DONE", "completed": true } ]
        }))
        .unwrap()
    }

    fn board() -> (ProjectBoard, Arc<NoticeLog>) {
        let log = Arc::new(NoticeLog::new());
        (ProjectBoard::new(project(), log.clone()), log)
    }

    #[tokio::test]
    async fn test_toggle_updates_after_confirmation() {
        let (mut board, log) = board();
        let api = Scripted::default();

        let outcome = board.toggle_subtask(&api, "a").await.unwrap();
        assert!(outcome.completed);
        assert!(!outcome.task_completed);
        assert_eq!(outcome.progress, 50.0);
        assert_eq!(outcome.unlocked, None);
        assert_eq!(board.achievement(), AchievementModal::Hidden);
        assert_eq!(log.count(NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_last_subtask_completes_owning_task() {
        let (mut board, _) = board();
        let api = Scripted::default();
        let owner = board.locate_subtask("a").unwrap().task;

        board.toggle_subtask(&api, "a").await.unwrap();
        let outcome = board.toggle_subtask(&api, "b").await.unwrap();
        assert!(outcome.task_completed);
        assert_eq!(outcome.progress, 100.0);
        assert!(board.task(owner).unwrap().completed);

        let outcome = board.toggle_subtask(&api, "b").await.unwrap();
        assert!(!outcome.completed);
        assert!(!outcome.task_completed);
        assert!(!board.task(owner).unwrap().completed);
        assert_eq!(outcome.progress, 50.0);
    }

    #[tokio::test]
    async fn test_failed_toggle_leaves_state_untouched() {
        let (mut board, log) = board();
        let before = board.project().clone();
        let api = Scripted {
            fail: true,
            ..Default::default()
        };

        let err = board.toggle_subtask(&api, "a").await.unwrap_err();
        assert!(is_reported(&err));
        assert_eq!(board.project(), &before);
        assert_eq!(log.count(NoticeLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_gem_change_opens_modal_once() {
        let (mut board, _) = board();
        let api = Scripted {
            gem_change: Some(GemChange {
                changed: true,
                new_gem: Some(GemType::Rubi),
                previous_gem: None,
            }),
            ..Default::default()
        };

        let outcome = board.toggle_subtask(&api, "a").await.unwrap();
        assert_eq!(outcome.unlocked, Some(GemType::Rubi));
        assert_eq!(board.achievement(), AchievementModal::Showing(GemType::Rubi));
        assert_eq!(board.current_gem(), Some(GemType::Rubi));

        board.dismiss_achievement();
        board.save_answer(&api, "a", "resposta").await.unwrap();
        board.set_subtask_link(&api, "a", Some("site.com")).await.unwrap();
        assert_eq!(board.achievement(), AchievementModal::Hidden);
    }

    #[tokio::test]
    async fn test_unchanged_gem_flag_is_ignored() {
        let (mut board, _) = board();
        let api = Scripted {
            gem_change: Some(GemChange {
                changed: false,
                new_gem: Some(GemType::Safira),
                previous_gem: None,
            }),
            ..Default::default()
        };
        let outcome = board.toggle_subtask(&api, "a").await.unwrap();
        assert_eq!(outcome.unlocked, None);
        assert_eq!(board.achievement(), AchievementModal::Hidden);
    }

    #[tokio::test]
    async fn test_toggle_task_rejects_tasks_with_subtasks() {
        let (mut board, log) = board();
        let api = Scripted::default();

        assert!(board.toggle_task(&api, "t1").await.is_err());
        assert_eq!(log.count(NoticeLevel::Warning), 1);

        assert!(board.toggle_task(&api, "t2").await.unwrap());
        assert!(!board.toggle_task(&api, "t2").await.unwrap());
    }

    #[tokio::test]
    async fn test_link_is_normalized_and_blank_rejected() {
        let (mut board, _) = board();
        let api = Scripted::default();

        board.set_subtask_link(&api, "b", Some("drive.google.com/x")).await.unwrap();
        let loc = board.locate_subtask("b").unwrap();
        let task = board.task(loc.task).unwrap();
        assert_eq!(task.subtasks[1].link.as_deref(), Some("https://drive.google.com/x"));

        assert!(board.set_subtask_link(&api, "b", Some("  ")).await.is_err());
        assert_eq!(api.calls.lock().unwrap().len(), 1);

        board.set_subtask_link(&api, "b", None).await.unwrap();
        let task = board.task(loc.task).unwrap();
        assert_eq!(task.subtasks[1].link, None);
    }

    #[tokio::test]
    async fn test_save_details_applies_after_success() {
        let (mut board, _) = board();
        let api = Scripted::default();
        let mut form = DetailsForm::from_project(board.project());
        assert!(!form.has_unsaved_changes());

        form.set_name("Novo nome");
        form.set_price("1.997,00".replace('.', ""));
        form.set_currency("usd").unwrap();
        form.add_link("Página", "hotmart.com/produto").unwrap();
        assert!(form.has_unsaved_changes());

        board.save_details(&api, &mut form).await.unwrap();
        assert!(!form.has_unsaved_changes());
        assert_eq!(board.project().name, "Novo nome");
        assert_eq!(board.project().price.as_deref(), Some("1997"));
        assert_eq!(board.project().currency.as_deref(), Some("USD"));
        assert_eq!(
            board.project().links.get("Página").map(String::as_str),
            Some("https://hotmart.com/produto")
        );
    }

    #[test]
    fn test_details_form_validation() {
        let mut form = DetailsForm::from_project(&project());
        assert!(form.set_currency("JPY").is_err());
        assert!(form.add_link("", "x.com").is_err());

        form.set_sale_start_date("31/12/2025");
        assert!(form.to_update().is_err());
        form.set_sale_start_date("2025-12-31");
        form.set_price("abc");
        assert!(form.to_update().is_err());
        form.set_price("");
        let update = form.to_update().unwrap();
        assert_eq!(update.price, None);
        assert_eq!(update.sale_start_date.as_deref(), Some("2025-12-31"));

        let project = project();
        form.reset(&project);
        assert!(!form.has_unsaved_changes());
        assert!(!form.remove_link("nope"));
    }

    #[test]
    fn test_kanban_grouping() {
        let (board, _) = board();
        let kanban = board.kanban();
        assert_eq!(kanban.column(TaskStatus::InProgress).len(), 1);
        assert_eq!(kanban.column(TaskStatus::Todo).len(), 1);
        assert_eq!(kanban.column(TaskStatus::Done).len(), 1);
        assert_eq!(kanban.todo[0].stage_name, Some("Etapa"));
        assert_eq!(kanban.done[0].stage_name, None);
    }

    #[test]
    fn test_resolve_subtask_by_path() {
        let (board, _) = board();
        assert_eq!(board.resolve_subtask_id("1.1.2").unwrap(), "b");
        assert_eq!(board.resolve_subtask_id("a").unwrap(), "a");
        assert!(board.resolve_subtask_id("1.2.1").is_err());
        assert!(board.resolve_subtask_id("9.1.1").is_err());
        assert!(board.resolve_subtask_id("x.y").is_err());
        assert_eq!(board.resolve_stage("1").and_then(|s| s.id.as_deref()), Some("s1"));
        assert!(board.resolve_stage("0").is_none());
        assert_eq!(board.resolve_task_id("1.2").unwrap(), "t2");
        assert_eq!(board.resolve_task_id("0.1").unwrap(), "t3");
        assert_eq!(board.resolve_task_id("t1").unwrap(), "t1");
        assert!(board.resolve_task_id("2.1").is_err());
    }
}
