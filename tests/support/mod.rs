//! In-memory BluePrint server for workflow tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use blueprint_cli::api::ApiError;
use blueprint_cli::api::ProjectBackend;
use blueprint_cli::api::models::{
    GemChange, GemType, Project, ProjectDetailsUpdate, Stage, StructurePayload, Subtask, Task,
    ToggleSubtaskResponse,
};

pub fn subtask(id: &str, description: &str) -> Subtask {
    Subtask {
        id: Some(id.to_string()),
        description: description.to_string(),
        ..Default::default()
    }
}

pub fn task(id: &str, title: &str, order: u32, subtasks: Vec<Subtask>) -> Task {
    Task {
        id: Some(id.to_string()),
        title: title.to_string(),
        order,
        subtasks,
        ..Default::default()
    }
}

pub fn stage(id: &str, name: &str, order: u32, gem_type: GemType, tasks: Vec<Task>) -> Stage {
    Stage {
        id: Some(id.to_string()),
        name: name.to_string(),
        order,
        gem_type,
        tasks,
        ..Default::default()
    }
}

/// One stage, one task, two subtasks
pub fn two_step_project() -> Project {
    Project {
        id: "p1".to_string(),
        name: "Lançamento".to_string(),
        project_stages: vec![stage(
            "s1",
            "Fundação",
            0,
            GemType::Esmeralda,
            vec![task(
                "t1",
                "Definir público",
                0,
                vec![subtask("st1", "Pesquisa"), subtask("st2", "Persona")],
            )],
        )],
        ..Default::default()
    }
}

/// Two stages and a standalone task; the first stage holds three subtasks
pub fn questionnaire_project() -> Project {
    Project {
        id: "p2".to_string(),
        name: "Mentoria".to_string(),
        project_stages: vec![
            stage(
                "s1",
                "Diagnóstico",
                0,
                GemType::Esmeralda,
                vec![
                    task(
                        "t1",
                        "Perguntas iniciais",
                        0,
                        vec![subtask("q1", "Qual o nicho?"), subtask("q2", "Qual o público?")],
                    ),
                    task("t2", "Oferta", 1, vec![subtask("q3", "Qual o preço?")]),
                ],
            ),
            stage(
                "s2",
                "Execução",
                1,
                GemType::Rubi,
                vec![task("t3", "Gravar aulas", 0, vec![subtask("q4", "Módulo 1")])],
            ),
        ],
        project_tasks: vec![task("t4", "Revisão final", 0, vec![])],
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeServer {
    project: Mutex<Project>,
    failing: Mutex<HashSet<String>>,
    gems: Mutex<HashMap<String, GemType>>,
    expired: AtomicBool,
    calls: AtomicUsize,
}

impl FakeServer {
    pub fn new(project: Project) -> Self {
        Self {
            project: Mutex::new(project),
            ..Default::default()
        }
    }

    /// Every request touching `id` fails with a 500
    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    /// Completing `subtask_id` unlocks `gem`
    pub fn award_gem_on(&self, subtask_id: &str, gem: GemType) {
        self.gems.lock().unwrap().insert(subtask_id.to_string(), gem);
    }

    /// Every following request answers 401
    pub fn expire_session(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn project(&self) -> Project {
        self.project.lock().unwrap().clone()
    }

    pub fn subtask(&self, id: &str) -> Option<Subtask> {
        let project = self.project();
        project
            .project_stages
            .iter()
            .flat_map(|s| s.tasks.iter())
            .chain(project.project_tasks.iter())
            .flat_map(|t| t.subtasks.iter())
            .find(|s| s.id.as_deref() == Some(id))
            .cloned()
    }

    fn check(&self, id: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.expired.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized.into());
        }
        if self.failing.lock().unwrap().contains(id) {
            return Err(ApiError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: Some("Falha simulada".to_string()),
            }
            .into());
        }
        Ok(())
    }

    fn with_task<T>(&self, id: &str, f: impl FnOnce(&mut Task) -> T) -> Option<T> {
        let mut guard = self.project.lock().unwrap();
        let project = &mut *guard;
        project
            .project_stages
            .iter_mut()
            .flat_map(|s| s.tasks.iter_mut())
            .chain(project.project_tasks.iter_mut())
            .find(|t| t.id.as_deref() == Some(id))
            .map(f)
    }

    fn with_subtask<T>(&self, id: &str, f: impl FnOnce(&mut Subtask) -> T) -> Option<T> {
        let mut guard = self.project.lock().unwrap();
        let project = &mut *guard;
        project
            .project_stages
            .iter_mut()
            .flat_map(|s| s.tasks.iter_mut())
            .chain(project.project_tasks.iter_mut())
            .flat_map(|t| t.subtasks.iter_mut())
            .find(|s| s.id.as_deref() == Some(id))
            .map(f)
    }
}

#[async_trait]
impl ProjectBackend for FakeServer {
    async fn toggle_subtask(&self, _project_id: &str, subtask_id: &str) -> Result<ToggleSubtaskResponse> {
        self.check(subtask_id)?;
        let completed = self
            .with_subtask(subtask_id, |s| {
                s.completed = !s.completed;
                s.completed
            })
            .ok_or_else(|| anyhow::anyhow!("unknown subtask {}", subtask_id))?;

        let gem_change = if completed {
            self.gems.lock().unwrap().get(subtask_id).map(|&gem| GemChange {
                changed: true,
                new_gem: Some(gem),
                previous_gem: None,
            })
        } else {
            None
        };

        Ok(ToggleSubtaskResponse {
            completed: Some(completed),
            gem_change,
            progress: None,
        })
    }

    async fn toggle_task(&self, _project_id: &str, task_id: &str) -> Result<()> {
        self.check(task_id)?;
        self.with_task(task_id, |t| t.completed = !t.completed);
        Ok(())
    }

    async fn save_subtask_answer(&self, _project_id: &str, subtask_id: &str, answer: &str) -> Result<()> {
        self.check(subtask_id)?;
        self.with_subtask(subtask_id, |s| s.answer = Some(answer.to_string()));
        Ok(())
    }

    async fn set_subtask_link(&self, _project_id: &str, subtask_id: &str, link: Option<&str>) -> Result<()> {
        self.check(subtask_id)?;
        self.with_subtask(subtask_id, |s| s.link = link.map(str::to_string));
        Ok(())
    }

    async fn set_task_link(&self, _project_id: &str, task_id: &str, link: Option<&str>) -> Result<()> {
        self.check(task_id)?;
        self.with_task(task_id, |t| t.link = link.map(str::to_string));
        Ok(())
    }

    async fn update_project_details(&self, project_id: &str, details: &ProjectDetailsUpdate) -> Result<()> {
        self.check(project_id)?;
        self.project.lock().unwrap().name = details.name.clone();
        Ok(())
    }

    async fn save_project_structure(&self, project_id: &str, _structure: &StructurePayload) -> Result<()> {
        self.check(project_id)
    }
}
