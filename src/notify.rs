//! Transient user notices
//!
//! Workflows report outcomes through a [`Notifier`] instead of printing, so the
//! same code drives the terminal and the tests.

use colored::Colorize;
use log::{info, warn};
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Success,
            message: message.to_string(),
        });
    }

    fn info(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Info,
            message: message.to_string(),
        });
    }

    fn warning(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Warning,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.notify(Notice {
            level: NoticeLevel::Error,
            message: message.to_string(),
        });
    }
}

/// Marks an error whose notice has already been shown to the user
#[derive(Debug)]
pub struct Reported(pub String);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_reported(error: &anyhow::Error) -> bool {
    error.downcast_ref::<Reported>().is_some()
}

/// Prints notices to stderr
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => {
                info!("notice: {}", notice.message);
                eprintln!("{} {}", "✓".bright_green().bold(), notice.message);
            }
            NoticeLevel::Info => {
                info!("notice: {}", notice.message);
                eprintln!("{} {}", "ℹ".bright_blue().bold(), notice.message);
            }
            NoticeLevel::Warning => {
                warn!("notice: {}", notice.message);
                eprintln!("{} {}", "⚠️".bright_yellow().bold(), notice.message.bright_yellow());
            }
            NoticeLevel::Error => {
                warn!("notice: {}", notice.message);
                eprintln!("{} {}", "✗".bright_red().bold(), notice.message.bright_red());
            }
        }
    }
}

/// Keeps every notice in memory
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|n| n.level == level).count()
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_log_records_levels() {
        let log = NoticeLog::new();
        log.success("Resposta salva!");
        log.error("Erro ao salvar respostas");
        log.error("Erro ao atualizar subtarefa");

        assert_eq!(log.count(NoticeLevel::Success), 1);
        assert_eq!(log.count(NoticeLevel::Error), 2);
        assert_eq!(log.notices()[0].message, "Resposta salva!");

        log.clear();
        assert!(log.notices().is_empty());
    }
}
