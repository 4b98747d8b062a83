//! Small text building blocks shared by the screens

use colored::Colorize;

use crate::api::models::{GemType, ProjectStatus, TaskStatus};
use crate::breadcrumb::{DynamicLabels, render_trail};
use crate::gems::{gem_emoji, gem_name};
use crate::progress::format_percent;
use crate::routes::Route;

pub const BAR_WIDTH: usize = 20;

/// `████████░░░░░░░░░░░░ 40%`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!(
        "{}{} {}",
        "█".repeat(filled).bright_green(),
        "░".repeat(width - filled).dimmed(),
        format_percent(clamped)
    )
}

pub fn heading(title: &str) -> String {
    format!(
        "{}\n{}",
        title.bright_blue().bold(),
        "═".repeat(title.chars().count()).bright_blue()
    )
}

pub fn breadcrumb_line(route: &Route, dynamic: &DynamicLabels) -> String {
    render_trail(&route.breadcrumbs(dynamic)).dimmed().to_string()
}

pub fn gem_badge(gem: Option<GemType>) -> String {
    let label = format!("{} {}", gem_emoji(gem), gem_name(gem));
    match gem {
        Some(gem) => gem.paint(&label).bold().to_string(),
        None => label.dimmed().to_string(),
    }
}

pub fn check_mark(done: bool) -> String {
    if done {
        "[✓]".bright_green().bold().to_string()
    } else {
        "[ ]".to_string()
    }
}

pub fn task_status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => "A fazer",
        TaskStatus::InProgress => "Em andamento",
        TaskStatus::Done => "Concluído",
    }
}

pub fn project_status_badge(status: ProjectStatus) -> String {
    match status {
        ProjectStatus::Ativo => status.label().bright_green().to_string(),
        ProjectStatus::Inativo => status.label().bright_red().to_string(),
    }
}

pub fn currency_symbol(currency: &str) -> &str {
    match currency {
        "BRL" => "R$",
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        other => other,
    }
}

/// Indents every line of `text`
pub fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| format!("{}{}", pad, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert!(progress_bar(50.0, 10).ends_with("50%"));
        assert!(progress_bar(140.0, 10).ends_with("100%"));
        assert!(progress_bar(-3.0, 10).ends_with("0%"));
    }

    #[test]
    fn test_currency_symbol() {
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(currency_symbol("JPY"), "JPY");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\nb", 2), "  a\n  b");
    }
}
