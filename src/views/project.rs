//! Project screens: list, detail (stages and subtasks), kanban and details panel

use colored::Colorize;

use super::widgets::{
    BAR_WIDTH, check_mark, currency_symbol, gem_badge, heading, indent, progress_bar,
    project_status_badge, task_status_label,
};
use crate::api::models::{GemType, Project, Stage, Task, TaskStatus};
use crate::board::{AchievementModal, Kanban, ProjectBoard};
use crate::gems::gem_description;
use crate::links::rich_text_to_plain;
use crate::progress::{completed_tasks_in_stage, stage_progress, task_progress_label};

/// What the project detail command shows
pub enum ProjectScreen<'a> {
    Failed(String),
    Board(&'a ProjectBoard),
    Kanban(&'a ProjectBoard),
}

impl ProjectScreen<'_> {
    pub fn render(&self) -> String {
        match self {
            ProjectScreen::Failed(message) => {
                format!("{} {}", "✗".bright_red().bold(), message.bright_red())
            }
            ProjectScreen::Board(board) => {
                let mut out = render_project(board.project());
                if let AchievementModal::Showing(gem) = board.achievement() {
                    out.push_str("\n\n");
                    out.push_str(&render_achievement(gem));
                }
                out
            }
            ProjectScreen::Kanban(board) => {
                format!(
                    "{}\n\n{}",
                    heading(&board.project().name),
                    render_kanban(&board.kanban(), false)
                )
            }
        }
    }
}

fn sorted_stages(project: &Project) -> Vec<&Stage> {
    let mut stages: Vec<&Stage> = project.project_stages.iter().collect();
    stages.sort_by_key(|s| s.order);
    stages
}

fn sorted_tasks(tasks: &[Task]) -> Vec<&Task> {
    let mut tasks: Vec<&Task> = tasks.iter().collect();
    tasks.sort_by_key(|t| t.order);
    tasks
}

pub fn render_project_summary(project: &Project) -> String {
    let template = project
        .template
        .as_ref()
        .map(|t| format!(" · {}", t.name))
        .unwrap_or_default();
    format!(
        "{}{}  {}\n  {}  {}",
        project.name.bold(),
        template.dimmed(),
        project.id.dimmed(),
        progress_bar(project.progress, BAR_WIDTH),
        gem_badge(project.current_gem)
    )
}

pub fn render_project_list(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "Nenhum projeto ainda".dimmed().to_string();
    }
    projects
        .iter()
        .map(render_project_summary)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full project detail; subtasks are numbered `stage.task.subtask`
pub fn render_project(project: &Project) -> String {
    let mut out = vec![
        heading(&project.name),
        format!(
            "Progresso: {}   Gema atual: {}",
            progress_bar(project.progress, BAR_WIDTH),
            gem_badge(project.current_gem)
        ),
    ];

    for (i, stage) in sorted_stages(project).into_iter().enumerate() {
        out.push(String::new());
        out.push(render_stage(stage, i + 1));
    }

    if !project.project_tasks.is_empty() {
        out.push(String::new());
        out.push("Tarefas avulsas".bold().to_string());
        for (t, task) in sorted_tasks(&project.project_tasks).into_iter().enumerate() {
            out.push(indent(&render_task(task, &format!("0.{}", t + 1)), 2));
        }
    }

    out.join("\n")
}

pub fn render_stage(stage: &Stage, number: usize) -> String {
    let mut out = vec![format!(
        "{} {}  {}  {}/{} tarefas  {}",
        format!("{}.", number).bold(),
        stage.name.bold(),
        gem_badge(Some(stage.gem_type)),
        completed_tasks_in_stage(stage),
        stage.tasks.len(),
        progress_bar(f64::from(stage_progress(stage)), 10)
    )];

    if let Some(description) = stage.description.as_deref().filter(|d| !d.is_empty()) {
        out.push(indent(&rich_text_to_plain(description), 3).dimmed().to_string());
    }
    for (t, task) in sorted_tasks(&stage.tasks).into_iter().enumerate() {
        out.push(indent(&render_task(task, &format!("{}.{}", number, t + 1)), 3));
    }
    out.join("\n")
}

pub fn render_task(task: &Task, number: &str) -> String {
    let mut out = vec![format!(
        "{} {} {}  {}",
        check_mark(task.completed),
        number.dimmed(),
        task.title,
        task_progress_label(task).dimmed()
    )];
    if let Some(link) = &task.link {
        out.push(format!("    🔗 {}", link.underline()));
    }
    for (s, subtask) in task.subtasks.iter().enumerate() {
        out.push(format!(
            "    {} {} {}",
            check_mark(subtask.completed),
            format!("{}.{}", number, s + 1).dimmed(),
            subtask.description
        ));
        if let Some(answer) = subtask.answer.as_deref().filter(|a| !a.is_empty()) {
            out.push(format!("        ✎ {}", answer.italic()));
        }
        if let Some(link) = &subtask.link {
            out.push(format!("        🔗 {}", link.underline()));
        }
    }
    out.join("\n")
}

/// Three columns; `show_project` prefixes each card's origin with its project
pub fn render_kanban(kanban: &Kanban<'_>, show_project: bool) -> String {
    [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done]
        .into_iter()
        .map(|status| {
            let cards = kanban.column(status);
            let mut lines = vec![format!("{} ({})", task_status_label(status).bold(), cards.len())];
            for card in cards {
                let mut origin = match (card.stage_name, card.gem) {
                    (Some(stage), gem) => format!("{} · {}", stage, gem_badge(gem)),
                    (None, _) => "avulsa".to_string(),
                };
                if show_project {
                    origin = format!("{} · {}", card.project_name, origin);
                }
                lines.push(format!("  • {}  {}", card.task.title, origin.dimmed()));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_achievement(gem: GemType) -> String {
    let frame = "✦".repeat(40);
    [
        gem.paint(&frame).to_string(),
        "🎉 Parabéns!".bold().to_string(),
        format!(
            "Você conquistou a insígnia {}!",
            gem.paint(&format!("{} {}", gem.emoji(), gem.display_name())).bold()
        ),
        gem_description(Some(gem)).to_string(),
        "Continue assim para conquistar as próximas insígnias e completar seu projeto! 🚀".to_string(),
        gem.paint(&frame).to_string(),
    ]
    .join("\n")
}

pub fn render_details(project: &Project) -> String {
    let mut out = vec![heading("Detalhes do projeto")];
    out.push(format!("Nome:     {}", project.name));
    out.push(format!(
        "Status:   {}",
        project_status_badge(project.status.unwrap_or_default())
    ));
    let currency = project.currency.as_deref().unwrap_or("BRL");
    out.push(format!(
        "Preço:    {}",
        project
            .price
            .as_deref()
            .map(|p| format!("{} {}", currency_symbol(currency), p))
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push(format!(
        "Início das vendas: {}",
        project.sale_start_date.as_deref().unwrap_or("-")
    ));
    if project.links.is_empty() {
        out.push("Links:    -".to_string());
    } else {
        out.push("Links:".to_string());
        for (name, url) in &project.links {
            out.push(format!("  {} {}", format!("{}:", name).bold(), url.underline()));
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoticeLog;
    use std::sync::Arc;

    fn project() -> Project {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Lançamento",
            "price": 497,
            "currency": "EUR",
            "links": { "Página": "https://x.com" },
            "projectStages": [{
                "id": "s1", "name": "Fundação", "order": 0, "gemType": "RUBI",
                "description": "<p>Primeiros <a href=\"https://y.com\">passos</a></p>",
                "tasks": [{ "id": "t1", "title": "Definir oferta", "order": 0,
                    "subtasks": [ { "id": "a", "description": "Público", "completed": true, "answer": "Empreendedores" } ] }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_project_render_numbers_subtasks() {
        let out = render_project(&project());
        assert!(out.contains("Fundação"));
        assert!(out.contains("Definir oferta"));
        assert!(out.contains("1.1.1"));
        assert!(out.contains("Empreendedores"));
        assert!(out.contains("passos (https://y.com)"));
    }

    #[test]
    fn test_details_render() {
        let out = render_details(&project());
        assert!(out.contains("€ 497"));
        assert!(out.contains("Página:"));
    }

    #[test]
    fn test_achievement_banner_mentions_gem() {
        let out = render_achievement(GemType::Safira);
        assert!(out.contains("Parabéns!"));
        assert!(out.contains("Safira"));
    }

    #[test]
    fn test_screen_variants() {
        let board = ProjectBoard::new(project(), Arc::new(NoticeLog::new()));
        assert!(ProjectScreen::Board(&board).render().contains("Lançamento"));
        assert!(ProjectScreen::Kanban(&board).render().contains("Concluído"));
        assert!(ProjectScreen::Failed("Erro ao carregar projeto".into())
            .render()
            .contains("Erro ao carregar projeto"));
    }
}
