//! Editing the stage/task/subtask tree of a template or project
//!
//! A [`StructureDraft`] is edited locally and only reaches the server when it
//! is saved as a whole. Stage and task `order` values are kept dense and
//! zero-based after every change.

use anyhow::{Result, bail};

use crate::links::normalize_html_links;

use crate::api::models::{
    GemType, Project, Stage, StagePayload, StructurePayload, Subtask, SubtaskPayload, Task,
    TaskPayload, Template, TemplatePayload,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Preencha os campos obrigatórios")]
    MissingName,
    #[error("Todas as tarefas devem ter um título")]
    UntitledTask,
    #[error("Todas as subtarefas devem ter uma descrição")]
    EmptySubtask,
}

/// Identifies a task either inside a stage or among the standalone tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRef {
    Stage { stage: usize, task: usize },
    Standalone(usize),
}

fn parse_indices(path: &str) -> Result<Vec<usize>> {
    path.split('.')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("Invalid position '{}' in '{}'", part, path))
        })
        .collect()
}

fn zero_based(position: usize, path: &str) -> Result<usize> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("Positions start at 1: '{}'", path),
    }
}

impl TaskRef {
    /// Parses a 1-based `stage.task` path; stage `0` addresses standalone tasks
    pub fn parse(path: &str) -> Result<Self> {
        match parse_indices(path)?.as_slice() {
            [stage, task] => Self::from_positions(*stage, *task, path),
            _ => bail!("Expected STAGE.TASK, got '{}'", path),
        }
    }

    fn from_positions(stage: usize, task: usize, path: &str) -> Result<Self> {
        let task = zero_based(task, path)?;
        Ok(match stage {
            0 => TaskRef::Standalone(task),
            stage => TaskRef::Stage { stage: stage - 1, task },
        })
    }
}

/// Parses a 1-based `stage.task.subtask` path into a task and a zero-based subtask index
pub fn parse_subtask_path(path: &str) -> Result<(TaskRef, usize)> {
    match parse_indices(path)?.as_slice() {
        [stage, task, subtask] => Ok((
            TaskRef::from_positions(*stage, *task, path)?,
            zero_based(*subtask, path)?,
        )),
        _ => bail!("Expected STAGE.TASK.SUBTASK, got '{}'", path),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureDraft {
    pub name: String,
    pub description: String,
    pub stages: Vec<Stage>,
    /// Tasks that belong to no stage
    pub tasks: Vec<Task>,
}

impl StructureDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn from_template(template: &Template) -> Self {
        let mut draft = Self {
            name: template.name.clone(),
            description: template.description.clone().unwrap_or_default(),
            stages: template.stages.clone(),
            tasks: template.tasks.clone(),
        };
        draft.renumber();
        draft
    }

    pub fn from_project(project: &Project) -> Self {
        let mut draft = Self {
            name: project.name.clone(),
            description: String::new(),
            stages: project.project_stages.clone(),
            tasks: project.project_tasks.clone(),
        };
        draft.renumber();
        draft
    }

    /// Draft from loosely ordered parts, e.g. a JSON file
    pub fn from_parts(name: impl Into<String>, description: impl Into<String>, stages: Vec<Stage>, tasks: Vec<Task>) -> Self {
        let mut draft = Self {
            name: name.into(),
            description: description.into(),
            stages,
            tasks,
        };
        draft.renumber();
        draft
    }

    /// Sorts by `order`, then renumbers every level to `0..n` without gaps
    fn renumber(&mut self) {
        self.stages.sort_by_key(|s| s.order);
        reorder_stages(&mut self.stages);
        for stage in &mut self.stages {
            stage.tasks.sort_by_key(|t| t.order);
            reorder_tasks(&mut stage.tasks);
        }
        self.tasks.sort_by_key(|t| t.order);
        reorder_tasks(&mut self.tasks);
    }

    pub fn stage_mut(&mut self, index: usize) -> Result<&mut Stage> {
        let count = self.stages.len();
        match self.stages.get_mut(index) {
            Some(stage) => Ok(stage),
            None => bail!("Stage {} does not exist ({} stages)", index, count),
        }
    }

    pub fn task_mut(&mut self, task: TaskRef) -> Result<&mut Task> {
        let tasks = match task {
            TaskRef::Stage { stage, .. } => &mut self.stage_mut(stage)?.tasks,
            TaskRef::Standalone(_) => &mut self.tasks,
        };
        let index = match task {
            TaskRef::Stage { task, .. } | TaskRef::Standalone(task) => task,
        };
        let count = tasks.len();
        match tasks.get_mut(index) {
            Some(task) => Ok(task),
            None => bail!("Task {} does not exist ({} tasks)", index, count),
        }
    }

    /// Appends a stage with the next order; returns its index
    pub fn add_stage(&mut self, name: impl Into<String>, gem_type: Option<GemType>) -> usize {
        let index = self.stages.len();
        self.stages.push(Stage {
            name: name.into(),
            order: index as u32,
            gem_type: gem_type.unwrap_or_default(),
            ..Default::default()
        });
        index
    }

    pub fn remove_stage(&mut self, index: usize) -> Result<Stage> {
        self.stage_mut(index)?;
        let removed = self.stages.remove(index);
        reorder_stages(&mut self.stages);
        Ok(removed)
    }

    pub fn add_task_to_stage(&mut self, stage: usize, title: impl Into<String>, description: Option<String>) -> Result<usize> {
        let tasks = &mut self.stage_mut(stage)?.tasks;
        Ok(push_task(tasks, title.into(), description))
    }

    pub fn remove_task_from_stage(&mut self, stage: usize, task: usize) -> Result<Task> {
        self.task_mut(TaskRef::Stage { stage, task })?;
        let tasks = &mut self.stage_mut(stage)?.tasks;
        let removed = tasks.remove(task);
        reorder_tasks(tasks);
        Ok(removed)
    }

    pub fn add_standalone_task(&mut self, title: impl Into<String>, description: Option<String>) -> usize {
        push_task(&mut self.tasks, title.into(), description)
    }

    pub fn remove_standalone_task(&mut self, task: usize) -> Result<Task> {
        self.task_mut(TaskRef::Standalone(task))?;
        let removed = self.tasks.remove(task);
        reorder_tasks(&mut self.tasks);
        Ok(removed)
    }

    pub fn add_subtask(&mut self, task: TaskRef, description: impl Into<String>) -> Result<usize> {
        let task = self.task_mut(task)?;
        task.subtasks.push(Subtask {
            description: description.into(),
            ..Default::default()
        });
        Ok(task.subtasks.len() - 1)
    }

    pub fn remove_subtask(&mut self, task: TaskRef, subtask: usize) -> Result<Subtask> {
        let task = self.task_mut(task)?;
        if subtask >= task.subtasks.len() {
            bail!("Subtask {} does not exist ({} subtasks)", subtask, task.subtasks.len());
        }
        Ok(task.subtasks.remove(subtask))
    }

    fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.stages
            .iter()
            .flat_map(|s| s.tasks.iter())
            .chain(self.tasks.iter())
    }

    /// Checks every task has a title and every subtask a description
    pub fn validate_structure(&self) -> Result<(), ValidationError> {
        for task in self.all_tasks() {
            if task.title.trim().is_empty() {
                return Err(ValidationError::UntitledTask);
            }
            if task.subtasks.iter().any(|s| s.description.trim().is_empty()) {
                return Err(ValidationError::EmptySubtask);
            }
        }
        Ok(())
    }

    /// Template saves additionally require a name
    pub fn validate_template(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        self.validate_structure()
    }

    pub fn to_template_payload(&self) -> TemplatePayload {
        TemplatePayload {
            name: self.name.clone(),
            description: rich_text(Some(&self.description)),
            stages: self.stages.iter().map(stage_payload).collect(),
            tasks: self.tasks.iter().map(task_payload).collect(),
        }
    }

    pub fn to_structure_payload(&self) -> StructurePayload {
        StructurePayload {
            stages: self.stages.iter().map(stage_payload).collect(),
        }
    }
}

fn push_task(tasks: &mut Vec<Task>, title: String, description: Option<String>) -> usize {
    let index = tasks.len();
    tasks.push(Task {
        title,
        description,
        order: index as u32,
        ..Default::default()
    });
    index
}

fn reorder_stages(stages: &mut [Stage]) {
    for (i, stage) in stages.iter_mut().enumerate() {
        stage.order = i as u32;
    }
}

fn reorder_tasks(tasks: &mut [Task]) {
    for (i, task) in tasks.iter_mut().enumerate() {
        task.order = i as u32;
    }
}

fn rich_text(html: Option<&str>) -> String {
    html.map(normalize_html_links).unwrap_or_default()
}

fn task_payload(task: &Task) -> TaskPayload {
    TaskPayload {
        id: task.id.clone(),
        title: task.title.clone(),
        description: rich_text(task.description.as_deref()),
        order: task.order,
        subtasks: task
            .subtasks
            .iter()
            .map(|s| SubtaskPayload {
                id: s.id.clone(),
                description: s.description.clone(),
            })
            .collect(),
    }
}

fn stage_payload(stage: &Stage) -> StagePayload {
    StagePayload {
        id: stage.id.clone(),
        name: stage.name.clone(),
        description: rich_text(stage.description.as_deref()),
        order: stage.order,
        gem_type: stage.gem_type,
        tasks: stage.tasks.iter().map(task_payload).collect(),
    }
}
