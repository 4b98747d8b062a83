use colored::Colorize;

use super::widgets::{gem_badge, heading, indent};
use crate::api::models::{Stage, Task, Template};
use crate::links::rich_text_to_plain;

fn counts(template: &Template) -> (usize, usize, usize) {
    let tasks = template
        .stages
        .iter()
        .flat_map(|s| s.tasks.iter())
        .chain(template.tasks.iter());
    let (mut task_count, mut subtask_count) = (0, 0);
    for task in tasks {
        task_count += 1;
        subtask_count += task.subtasks.len();
    }
    (template.stages.len(), task_count, subtask_count)
}

pub fn render_template_summary(template: &Template) -> String {
    let (stages, tasks, subtasks) = counts(template);
    let version = template
        .version
        .as_deref()
        .map(|v| format!(" v{}", v))
        .unwrap_or_default();
    let state = if template.is_active {
        String::new()
    } else {
        format!(" {}", "(inativo)".bright_red())
    };
    format!(
        "{}{}{}  {}  {}",
        template.name.bold(),
        version.dimmed(),
        state,
        format!("{} etapas · {} tarefas · {} subtarefas", stages, tasks, subtasks).dimmed(),
        template.id.dimmed()
    )
}

pub fn render_template_list(templates: &[Template]) -> String {
    if templates.is_empty() {
        return "Nenhum template encontrado".dimmed().to_string();
    }
    templates
        .iter()
        .map(render_template_summary)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_task_outline(task: &Task, number: &str) -> String {
    let mut lines = vec![format!("{} {}", number.dimmed(), task.title)];
    for (i, subtask) in task.subtasks.iter().enumerate() {
        lines.push(format!("  {} {}", format!("{}.{}", number, i + 1).dimmed(), subtask.description));
    }
    lines.join("\n")
}

fn render_stage_outline(stage: &Stage, number: usize) -> String {
    let mut lines = vec![format!(
        "{} {}  {}",
        format!("{}.", number).bold(),
        stage.name.bold(),
        gem_badge(Some(stage.gem_type))
    )];
    if let Some(description) = stage.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(indent(&rich_text_to_plain(description), 3).dimmed().to_string());
    }
    for (t, task) in stage.tasks.iter().enumerate() {
        lines.push(indent(&render_task_outline(task, &format!("{}.{}", number, t + 1)), 3));
    }
    lines.join("\n")
}

/// Outline with the same numbering the edit commands accept
pub fn render_template(template: &Template) -> String {
    let mut out = vec![heading(&template.name), render_template_summary(template)];
    if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
        out.push(rich_text_to_plain(description));
    }

    let mut stages: Vec<&Stage> = template.stages.iter().collect();
    stages.sort_by_key(|s| s.order);
    for (i, stage) in stages.into_iter().enumerate() {
        out.push(String::new());
        out.push(render_stage_outline(stage, i + 1));
    }

    if !template.tasks.is_empty() {
        out.push(String::new());
        out.push("Tarefas avulsas".bold().to_string());
        for (t, task) in template.tasks.iter().enumerate() {
            out.push(indent(&render_task_outline(task, &format!("0.{}", t + 1)), 2));
        }
    }
    out.join("\n")
}
