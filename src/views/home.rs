use colored::Colorize;

use super::project::{render_kanban, render_project_summary};
use super::templates::render_template_summary;
use super::widgets::heading;
use crate::api::models::{Project, Template, User};
use crate::board::Kanban;

pub enum HomeScreen<'a> {
    Failed(String),
    Ready {
        user: &'a User,
        projects: &'a [Project],
        templates: &'a [Template],
        kanban: &'a Kanban<'a>,
    },
}

impl HomeScreen<'_> {
    pub fn render(&self) -> String {
        match self {
            HomeScreen::Failed(message) => {
                format!("{} {}", "✗".bright_red().bold(), message.bright_red())
            }
            HomeScreen::Ready {
                user,
                projects,
                templates,
                kanban,
            } => {
                let name = if user.name.is_empty() { "Usuário" } else { user.name.as_str() };
                let mut out = vec![
                    heading(&format!("Bem-vindo(a), {} 👋", name)),
                    String::new(),
                    "📊 Meus Projetos".bold().to_string(),
                ];

                if projects.is_empty() {
                    out.push("  Nenhum projeto ainda".dimmed().to_string());
                    out.push(
                        "  Crie um com `blueprint projects create <template-id> <nome>`"
                            .dimmed()
                            .to_string(),
                    );
                } else {
                    for project in projects.iter() {
                        out.push(format!("  {}", render_project_summary(project)));
                    }
                }

                out.push(String::new());
                out.push(format!("📋 Minhas Tarefas ({} tarefas)", kanban.len()).bold().to_string());
                if kanban.is_empty() {
                    out.push("  Nenhuma tarefa ainda".dimmed().to_string());
                } else {
                    out.push(super::widgets::indent(&render_kanban(kanban, true), 2));
                }

                let active: Vec<&Template> = templates.iter().filter(|t| t.is_active).collect();
                out.push(String::new());
                out.push("📋 Templates disponíveis".bold().to_string());
                if active.is_empty() {
                    out.push("  Nenhum template disponível".dimmed().to_string());
                } else {
                    for template in active {
                        out.push(format!("  {}", render_template_summary(template)));
                    }
                }

                out.join("\n")
            }
        }
    }
}
