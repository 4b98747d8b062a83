//! Project board workflows against an in-memory server

mod support;

use std::sync::Arc;

use blueprint_cli::api::models::GemType;
use blueprint_cli::board::{AchievementModal, ProjectBoard};
use blueprint_cli::notify::{NoticeLevel, NoticeLog, is_reported};
use support::{FakeServer, questionnaire_project, two_step_project};

fn board_for(server: &FakeServer) -> (ProjectBoard, Arc<NoticeLog>) {
    let log = Arc::new(NoticeLog::new());
    (ProjectBoard::new(server.project(), log.clone()), log)
}

#[tokio::test]
async fn test_subtasks_drive_progress_to_completion() {
    let server = FakeServer::new(two_step_project());
    let (mut board, _log) = board_for(&server);
    assert_eq!(board.progress(), 0.0);

    let first = board.toggle_subtask(&server, "st1").await.unwrap();
    assert!(first.completed);
    assert!(!first.task_completed);
    assert_eq!(first.progress, 50.0);

    let second = board.toggle_subtask(&server, "st2").await.unwrap();
    assert!(second.task_completed);
    assert_eq!(second.progress, 100.0);
    assert!(board.project().project_stages[0].tasks[0].completed);
    assert!(server.subtask("st1").unwrap().completed);
}

#[tokio::test]
async fn test_toggling_twice_restores_state() {
    let server = FakeServer::new(two_step_project());
    let (mut board, _log) = board_for(&server);
    let before = board.project().clone();

    board.toggle_subtask(&server, "st1").await.unwrap();
    let outcome = board.toggle_subtask(&server, "st1").await.unwrap();

    assert!(!outcome.completed);
    assert_eq!(board.project(), &before);
    assert_eq!(server.project(), before);
}

#[tokio::test]
async fn test_failed_toggle_leaves_board_unchanged() {
    let server = FakeServer::new(two_step_project());
    server.fail_on("st1");
    let (mut board, log) = board_for(&server);
    let before = board.project().clone();

    let err = board.toggle_subtask(&server, "st1").await.unwrap_err();

    assert!(is_reported(&err));
    assert_eq!(board.project(), &before);
    assert_eq!(board.achievement(), AchievementModal::Hidden);
    assert_eq!(log.count(NoticeLevel::Error), 1);
    assert_eq!(log.notices()[0].message, "Erro ao atualizar subtarefa");
}

#[tokio::test]
async fn test_gem_unlock_opens_achievement_once() {
    let server = FakeServer::new(two_step_project());
    server.award_gem_on("st2", GemType::Rubi);
    let (mut board, _log) = board_for(&server);

    board.toggle_subtask(&server, "st1").await.unwrap();
    assert_eq!(board.achievement(), AchievementModal::Hidden);

    let outcome = board.toggle_subtask(&server, "st2").await.unwrap();
    assert_eq!(outcome.unlocked, Some(GemType::Rubi));
    assert_eq!(board.achievement(), AchievementModal::Showing(GemType::Rubi));
    assert_eq!(board.current_gem(), Some(GemType::Rubi));

    board.dismiss_achievement();
    board.toggle_subtask(&server, "st2").await.unwrap();
    assert_eq!(board.achievement(), AchievementModal::Hidden);
}

#[tokio::test]
async fn test_answers_and_links_never_move_progress() {
    let server = FakeServer::new(two_step_project());
    server.award_gem_on("st1", GemType::Safira);
    let (mut board, log) = board_for(&server);

    board.save_answer(&server, "st1", "Mulheres de 30 a 45 anos").await.unwrap();
    board.set_subtask_link(&server, "st1", Some("docs.google.com/doc")).await.unwrap();
    board.set_task_link(&server, "t1", Some("https://miro.com/board")).await.unwrap();

    assert_eq!(board.progress(), 0.0);
    assert_eq!(board.achievement(), AchievementModal::Hidden);
    let stored = server.subtask("st1").unwrap();
    assert_eq!(stored.answer.as_deref(), Some("Mulheres de 30 a 45 anos"));
    assert_eq!(stored.link.as_deref(), Some("https://docs.google.com/doc"));
    assert!(!stored.completed);

    let messages: Vec<String> = log.notices().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["Resposta salva!", "Link salvo!", "Link salvo!"]);
}

#[tokio::test]
async fn test_link_removal_and_blank_input() {
    let server = FakeServer::new(two_step_project());
    let (mut board, log) = board_for(&server);

    board.set_subtask_link(&server, "st2", Some("site.com")).await.unwrap();
    board.set_subtask_link(&server, "st2", None).await.unwrap();
    assert_eq!(server.subtask("st2").unwrap().link, None);
    assert_eq!(log.notices().last().unwrap().message, "Link removido!");

    let calls = server.calls();
    assert!(board.set_subtask_link(&server, "st2", Some("   ")).await.is_err());
    assert_eq!(server.calls(), calls);
}

#[tokio::test]
async fn test_save_all_answers_reports_partial_failure_once() {
    let server = FakeServer::new(questionnaire_project());
    server.fail_on("q2");
    let (mut board, log) = board_for(&server);
    board.drafts_mut().set("q1", "Finanças");
    board.drafts_mut().set("q2", "Iniciantes");
    board.drafts_mut().set("q3", "R$ 497");

    let report = board.save_all_answers(&server, "s1").await.unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.saved.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "q2");
    assert!(!report.requires_login());

    assert_eq!(server.subtask("q1").unwrap().answer.as_deref(), Some("Finanças"));
    assert_eq!(server.subtask("q3").unwrap().answer.as_deref(), Some("R$ 497"));
    assert_eq!(server.subtask("q2").unwrap().answer, None);
    assert_eq!(board.drafts().get("q2"), Some("Iniciantes"));
    assert_eq!(board.drafts().get("q1"), None);

    let notices = log.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Erro ao salvar respostas");
}

#[tokio::test]
async fn test_save_all_answers_by_position_leaves_other_stages_alone() {
    let server = FakeServer::new(questionnaire_project());
    let (mut board, log) = board_for(&server);
    board.drafts_mut().set("q4", "Roteiro pronto");
    board.drafts_mut().set("q1", "Saúde");

    let report = board.save_all_answers(&server, "1").await.unwrap();

    assert!(report.all_saved());
    assert_eq!(report.total(), 3);
    assert_eq!(server.subtask("q4").unwrap().answer, None);
    assert_eq!(board.drafts().get("q4"), Some("Roteiro pronto"));
    assert_eq!(log.count(NoticeLevel::Success), 1);
    assert_eq!(board.progress(), 0.0);
}

#[tokio::test]
async fn test_task_toggle_rules() {
    let server = FakeServer::new(questionnaire_project());
    let (mut board, log) = board_for(&server);

    let err = board.toggle_task(&server, "t1").await.unwrap_err();
    assert!(is_reported(&err));
    assert_eq!(log.count(NoticeLevel::Warning), 1);
    assert_eq!(server.calls(), 0);

    assert!(board.toggle_task(&server, "t4").await.unwrap());
    assert!(board.project().project_tasks[0].completed);
    assert_eq!(board.progress(), 0.0);
}

#[tokio::test]
async fn test_kanban_groups_board_tasks() {
    let server = FakeServer::new(questionnaire_project());
    let (board, _log) = board_for(&server);

    let kanban = board.kanban();
    assert_eq!(kanban.len(), 4);
    assert_eq!(kanban.todo.len(), 4);
    assert!(kanban.done.is_empty());
}
