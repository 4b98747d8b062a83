use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use log::info;

use super::templates::EditOp;
use crate::api::client::BlueprintClient;
use crate::api::error::{ApiError, message_or};
use crate::api::models::{CreateProjectRequest, Project, ProjectStatus};
use crate::board::{AchievementModal, DetailsForm, ProjectBoard};
use crate::breadcrumb::DynamicLabels;
use crate::cli::context::AppContext;
use crate::cli::ui::{confirm, is_interactive, text_or_prompt, with_spinner};
use crate::notify::Reported;
use crate::progress::format_percent;
use crate::routes::Route;
use crate::structure::{StructureDraft, TaskRef, parse_subtask_path};
use crate::views::ProjectScreen;
use crate::views::project::{render_achievement, render_details, render_project_list};
use crate::views::widgets::breadcrumb_line;

#[derive(Args)]
pub struct ProjectsCommands {
    #[command(subcommand)]
    pub command: ProjectsSubcommands,
}

/// Subtasks and tasks are addressed by id or by the `stage.task[.subtask]`
/// numbers printed by `projects show`
#[derive(Subcommand)]
pub enum ProjectsSubcommands {
    /// List your projects
    List {
        /// Every project on the server (administrators)
        #[arg(long)]
        all: bool,
    },
    /// Show a project's stages, tasks and subtasks
    Show { id: String },
    /// Show a project's tasks as a kanban board
    Board { id: String },
    /// Print the progress computed by the server next to the local one
    Progress { id: String },
    /// Create a project from a template
    Create {
        template_id: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete a project
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Check or uncheck one or more subtasks
    Toggle {
        id: String,
        #[arg(required = true)]
        subtasks: Vec<String>,
    },
    /// Check or uncheck a task without subtasks
    ToggleTask { id: String, task: String },
    /// Save the answer of one subtask
    Answer {
        id: String,
        subtask: String,
        /// Prompted for when omitted in a terminal
        #[arg(long)]
        text: Option<String>,
    },
    /// Save the answers of every subtask in a stage at once
    SaveAnswers {
        id: String,
        /// Stage id or position
        stage: String,
        /// SUBTASK=TEXT, repeatable; other subtasks resend their current answer
        #[arg(long = "answer", value_parser = parse_key_value)]
        answers: Vec<(String, String)>,
    },
    /// Set or remove the link of a subtask or task
    Link {
        id: String,
        #[arg(long, conflicts_with = "task", required_unless_present = "task")]
        subtask: Option<String>,
        #[arg(long)]
        task: Option<String>,
        #[arg(long, conflicts_with = "remove", required_unless_present = "remove")]
        url: Option<String>,
        #[arg(long)]
        remove: bool,
    },
    /// Show or edit name, status, price, sale date and links
    Details {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// ATIVO or INATIVO
        #[arg(long)]
        status: Option<ProjectStatus>,
        /// Empty clears the price
        #[arg(long)]
        price: Option<String>,
        /// BRL, USD, EUR or GBP
        #[arg(long)]
        currency: Option<String>,
        /// YYYY-MM-DD, empty clears it
        #[arg(long)]
        sale_start: Option<String>,
        /// NAME=URL, repeatable
        #[arg(long = "add-link", value_parser = parse_key_value)]
        add_links: Vec<(String, String)>,
        /// Link name, repeatable
        #[arg(long = "remove-link")]
        remove_links: Vec<String>,
    },
    /// Edit a project's stages, tasks and subtasks
    Manage {
        id: String,
        #[arg(short, long)]
        yes: bool,
        #[command(subcommand)]
        op: EditOp,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

pub async fn projects_command(args: ProjectsCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        ProjectsSubcommands::List { all } => list(ctx, all).await,
        ProjectsSubcommands::Show { id } => {
            let (_, board) = open_board(ctx, &Route::ProjectDetail(id.clone()), &id).await?;
            println!("{}", ProjectScreen::Board(&board).render());
            Ok(())
        }
        ProjectsSubcommands::Board { id } => {
            let (_, board) = open_board(ctx, &Route::ProjectDetail(id.clone()), &id).await?;
            println!("{}", ProjectScreen::Kanban(&board).render());
            Ok(())
        }
        ProjectsSubcommands::Progress { id } => progress(ctx, &id).await,
        ProjectsSubcommands::Create { template_id, name } => create(ctx, &template_id, name).await,
        ProjectsSubcommands::Delete { id, yes } => delete(ctx, &id, yes).await,
        ProjectsSubcommands::Toggle { id, subtasks } => toggle(ctx, &id, &subtasks).await,
        ProjectsSubcommands::ToggleTask { id, task } => {
            let (client, mut board) = open_board(ctx, &Route::ProjectDetail(id.clone()), &id).await?;
            let task_id = board.resolve_task_id(&task)?;
            board.toggle_task(&client, &task_id).await?;
            print_progress(&board);
            Ok(())
        }
        ProjectsSubcommands::Answer { id, subtask, text } => {
            let (client, mut board) = open_board(ctx, &Route::ProjectDetail(id.clone()), &id).await?;
            let subtask_id = board.resolve_subtask_id(&subtask)?;
            let text = text_or_prompt(text, "Resposta", "--text")?;
            with_spinner("Salvando...", board.save_answer(&client, &subtask_id, &text)).await
        }
        ProjectsSubcommands::SaveAnswers { id, stage, answers } => save_answers(ctx, &id, &stage, answers).await,
        ProjectsSubcommands::Link {
            id,
            subtask,
            task,
            url,
            remove: _,
        } => {
            let (client, mut board) = open_board(ctx, &Route::ProjectDetail(id.clone()), &id).await?;
            let url = url.as_deref();
            match (subtask, task) {
                (Some(subtask), _) => {
                    let subtask_id = board.resolve_subtask_id(&subtask)?;
                    board.set_subtask_link(&client, &subtask_id, url).await
                }
                (None, Some(task)) => {
                    let task_id = board.resolve_task_id(&task)?;
                    board.set_task_link(&client, &task_id, url).await
                }
                (None, None) => bail!("Informe --subtask ou --task"),
            }
        }
        ProjectsSubcommands::Details {
            id,
            name,
            status,
            price,
            currency,
            sale_start,
            add_links,
            remove_links,
        } => {
            let (client, mut board) = open_board(ctx, &Route::ProjectDetail(id.clone()), &id).await?;
            let mut form = DetailsForm::from_project(board.project());
            let edits = DetailsEdits {
                name,
                status,
                price,
                currency,
                sale_start,
                add_links,
                remove_links,
            };
            edit_details(ctx, &client, &mut board, &mut form, edits).await
        }
        ProjectsSubcommands::Manage { id, yes, op } => manage(ctx, &id, yes, op).await,
    }
}

/// Loads a project behind the route's guard; load failures are reported once
async fn open_board(ctx: &AppContext, route: &Route, id: &str) -> Result<(BlueprintClient, ProjectBoard)> {
    let client = ctx.enter(route)?;
    match with_spinner("Carregando projeto...", client.get_project(id)).await {
        Ok(project) => {
            let mut labels = DynamicLabels::default();
            labels.set(id, project.name.clone());
            println!("{}", breadcrumb_line(route, &labels));
            Ok((client, ProjectBoard::new(project, ctx.notifier.clone())))
        }
        Err(e) => {
            println!("{}", ProjectScreen::Failed("Erro ao carregar projeto".into()).render());
            Err(e.context(Reported("Erro ao carregar projeto".into())))
        }
    }
}

fn print_progress(board: &ProjectBoard) {
    println!(
        "Progresso do projeto: {}",
        format_percent(board.progress()).bold()
    );
}

async fn list(ctx: &AppContext, all: bool) -> Result<()> {
    let route = Route::Projects;
    let client = ctx.enter(&route)?;
    if all {
        ctx.session.require_admin()?;
    }

    let projects: Vec<Project> = if all {
        with_spinner("Carregando projetos...", client.list_projects()).await?
    } else {
        with_spinner("Carregando projetos...", client.my_projects()).await?
    };

    println!("{}", breadcrumb_line(&route, &DynamicLabels::default()));
    println!("{}", render_project_list(&projects));
    Ok(())
}

async fn progress(ctx: &AppContext, id: &str) -> Result<()> {
    let (client, board) = open_board(ctx, &Route::ProjectDetail(id.to_string()), id).await?;
    let reported = with_spinner("Carregando progresso...", client.project_progress(id)).await?;

    print_progress(&board);
    match reported.get("progress").and_then(|v| v.as_f64()) {
        Some(value) => println!("Progresso no servidor: {}", format_percent(value)),
        None => println!("Progresso no servidor: {}", reported),
    }
    Ok(())
}

async fn create(ctx: &AppContext, template_id: &str, name: Option<String>) -> Result<()> {
    let client = ctx.enter(&Route::ProjectCreate(template_id.to_string()))?;

    let template = match with_spinner("Carregando template...", client.get_template(template_id)).await {
        Ok(template) => template,
        Err(e) => {
            ctx.notifier.error("Erro ao carregar template");
            return Err(e.context(Reported("Erro ao carregar template".into())));
        }
    };
    println!("Template: {}", template.name.bold());

    let name = text_or_prompt(name, "Nome do projeto", "--name")?;
    if name.trim().is_empty() {
        ctx.notifier.warning("Nome do projeto é obrigatório");
        return Err(anyhow::anyhow!("Nome do projeto é obrigatório")
            .context(Reported("Nome do projeto é obrigatório".into())));
    }

    let request = CreateProjectRequest {
        name: name.trim().to_string(),
        template_id: template_id.to_string(),
    };
    match with_spinner("Criando projeto...", client.create_project(&request)).await {
        Ok(project) => {
            info!("Created project {} from template {}", project.id, template_id);
            ctx.notifier.success("Projeto criado com sucesso!");
            println!("Abra com `blueprint projects show {}`", project.id);
            Ok(())
        }
        Err(e) => {
            let message = format!("Erro ao criar projeto: {}", message_or(&e, "Erro desconhecido"));
            ctx.notifier.error(&message);
            Err(e.context(Reported(message)))
        }
    }
}

async fn delete(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    let client = ctx.enter(&Route::Projects)?;
    if !confirm("Tem certeza que deseja excluir este projeto?", yes)? {
        ctx.notifier.info("Operação cancelada");
        return Ok(());
    }

    match with_spinner("Excluindo...", client.delete_project(id)).await {
        Ok(()) => {
            ctx.notifier.success("Projeto excluído com sucesso!");
            Ok(())
        }
        Err(e) => {
            ctx.notifier.error("Erro ao excluir projeto");
            Err(e.context(Reported("Erro ao excluir projeto".into())))
        }
    }
}

async fn toggle(ctx: &AppContext, id: &str, keys: &[String]) -> Result<()> {
    let (client, mut board) = open_board(ctx, &Route::ProjectDetail(id.to_string()), id).await?;

    for key in keys {
        let subtask_id = board.resolve_subtask_id(key)?;
        let outcome = board.toggle_subtask(&client, &subtask_id).await?;
        if outcome.task_completed {
            println!("  {} tarefa concluída", "✓".bright_green());
        }

        if let AchievementModal::Showing(gem) = board.achievement() {
            println!("\n{}\n", render_achievement(gem));
            if is_interactive() {
                dialoguer::Confirm::new()
                    .with_prompt("Continuar")
                    .default(true)
                    .show_default(false)
                    .interact()?;
            }
            board.dismiss_achievement();
        }
    }

    print_progress(&board);
    Ok(())
}

async fn save_answers(ctx: &AppContext, id: &str, stage: &str, answers: Vec<(String, String)>) -> Result<()> {
    let (client, mut board) = open_board(ctx, &Route::ProjectDetail(id.to_string()), id).await?;

    for (key, text) in answers {
        let subtask_id = board.resolve_subtask_id(&key)?;
        board.drafts_mut().set(subtask_id, text);
    }

    let report = with_spinner("Salvando respostas...", board.save_all_answers(&client, stage)).await?;
    println!("{}/{} respostas salvas", report.saved.len(), report.total());
    for (subtask_id, error) in &report.failed {
        println!("  {} {}: {}", "✗".bright_red(), subtask_id, message_or(error, "erro"));
    }

    if report.requires_login() {
        return Err(ApiError::Unauthorized.into());
    }
    if !report.all_saved() {
        return Err(anyhow::anyhow!("{} respostas não foram salvas", report.failed.len())
            .context(Reported("Erro ao salvar respostas".into())));
    }
    Ok(())
}

struct DetailsEdits {
    name: Option<String>,
    status: Option<ProjectStatus>,
    price: Option<String>,
    currency: Option<String>,
    sale_start: Option<String>,
    add_links: Vec<(String, String)>,
    remove_links: Vec<String>,
}

/// Applies the edits to the form; any rejected edit cancels the whole change
fn apply_details(ctx: &AppContext, form: &mut DetailsForm, edits: DetailsEdits) -> Result<()> {
    if let Some(name) = edits.name {
        form.set_name(name);
    }
    if let Some(status) = edits.status {
        form.set_status(status);
    }
    if let Some(price) = edits.price {
        form.set_price(price);
    }
    if let Some(currency) = edits.currency {
        form.set_currency(&currency)?;
    }
    if let Some(date) = edits.sale_start {
        form.set_sale_start_date(date);
    }
    for (name, url) in edits.add_links {
        if let Err(e) = form.add_link(&name, &url) {
            ctx.notifier.error(&e.to_string());
            return Err(e.context(Reported("Link inválido".into())));
        }
        ctx.notifier.success("Link adicionado");
    }
    for name in edits.remove_links {
        if form.remove_link(&name) {
            ctx.notifier.success("Link removido");
        } else {
            ctx.notifier.warning(&format!("Link \"{}\" não encontrado", name));
        }
    }
    Ok(())
}

async fn edit_details(
    ctx: &AppContext,
    client: &BlueprintClient,
    board: &mut ProjectBoard,
    form: &mut DetailsForm,
    edits: DetailsEdits,
) -> Result<()> {
    if let Err(e) = apply_details(ctx, form, edits) {
        form.reset(board.project());
        ctx.notifier.info("Alterações canceladas");
        return Err(e);
    }

    if !form.has_unsaved_changes() {
        println!("{}", render_details(board.project()));
        return Ok(());
    }

    with_spinner("Salvando...", board.save_details(client, form)).await?;
    println!("{}", render_details(board.project()));
    Ok(())
}

/// Project structures only carry stages, so stage 0 is not addressable here
fn reject_standalone(op: &EditOp) -> Result<()> {
    let standalone = match op {
        EditOp::AddTask { stage, .. } => *stage == 0,
        EditOp::RemoveTask { path } | EditOp::AddSubtask { path, .. } => {
            matches!(TaskRef::parse(path)?, TaskRef::Standalone(_))
        }
        EditOp::RemoveSubtask { path } => matches!(parse_subtask_path(path)?.0, TaskRef::Standalone(_)),
        EditOp::AddStage { .. } | EditOp::RemoveStage { .. } => false,
    };
    if standalone {
        bail!("Tarefas avulsas não podem ser editadas na estrutura do projeto");
    }
    Ok(())
}

async fn manage(ctx: &AppContext, id: &str, yes: bool, op: EditOp) -> Result<()> {
    reject_standalone(&op)?;
    let (client, mut board) = open_board(ctx, &Route::ProjectManage(id.to_string()), id).await?;

    let destructive = matches!(
        op,
        EditOp::RemoveStage { .. } | EditOp::RemoveTask { .. } | EditOp::RemoveSubtask { .. }
    );
    if destructive
        && !confirm(
            "Tem certeza que deseja remover? Esta ação não pode ser desfeita.",
            yes,
        )?
    {
        ctx.notifier.info("Alterações canceladas");
        return Ok(());
    }

    let mut draft = StructureDraft::from_project(board.project());
    let summary = super::templates::apply_edit(&mut draft, op)?;
    println!("{}", summary);

    with_spinner("Salvando...", board.save_structure(&client, &draft)).await?;
    println!("{}", ProjectScreen::Board(&board).render());
    Ok(())
}
