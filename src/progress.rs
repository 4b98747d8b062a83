//! Progress derived from subtask completion
//!
//! Only the `completed` flag of subtasks counts. Answers and links never move
//! progress, and tasks without subtasks contribute nothing to the ratios.

use crate::api::models::{Project, Stage, Task};

/// `(completed, total)` subtasks of a task
pub fn task_counts(task: &Task) -> (usize, usize) {
    let completed = task.subtasks.iter().filter(|s| s.completed).count();
    (completed, task.subtasks.len())
}

fn sum_counts<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> (usize, usize) {
    tasks.into_iter().map(task_counts).fold((0, 0), |(c, t), (tc, tt)| (c + tc, t + tt))
}

/// `(completed, total)` subtasks across all of a stage's tasks
pub fn stage_counts(stage: &Stage) -> (usize, usize) {
    sum_counts(&stage.tasks)
}

/// `(completed, total)` subtasks across every stage and standalone task
pub fn project_counts(project: &Project) -> (usize, usize) {
    let stages = project.project_stages.iter().flat_map(|s| s.tasks.iter());
    sum_counts(stages.chain(project.project_tasks.iter()))
}

fn ratio(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * completed as f64 / total as f64
    }
}

/// Whole-number percentage of a stage's subtasks that are completed
pub fn stage_progress(stage: &Stage) -> u8 {
    let (completed, total) = stage_counts(stage);
    ratio(completed, total).round() as u8
}

/// Project-wide completion ratio in percent, unrounded
pub fn project_progress(project: &Project) -> f64 {
    let (completed, total) = project_counts(project);
    ratio(completed, total)
}

pub fn task_progress(task: &Task) -> u8 {
    let (completed, total) = task_counts(task);
    ratio(completed, total).round() as u8
}

/// Re-derives `task.completed` from its subtasks.
///
/// A task without subtasks keeps whatever value the server gave it.
pub fn derive_task_completion(task: &mut Task) {
    if !task.subtasks.is_empty() {
        task.completed = task.subtasks.iter().all(|s| s.completed);
    }
}

/// "2/3 subtarefas", or "Sem subtarefas" for a task without subtasks
pub fn task_progress_label(task: &Task) -> String {
    let (completed, total) = task_counts(task);
    if total == 0 {
        "Sem subtarefas".to_string()
    } else {
        format!("{}/{} subtarefas", completed, total)
    }
}

pub fn completed_tasks_in_stage(stage: &Stage) -> usize {
    stage.tasks.iter().filter(|t| t.completed).count()
}

/// Rounded for display, e.g. `"67%"`
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}
