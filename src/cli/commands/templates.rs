use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::api::client::BlueprintClient;
use crate::api::error::message_or;
use crate::api::models::{GemType, Stage, Task, Template};
use crate::breadcrumb::DynamicLabels;
use crate::cli::context::AppContext;
use crate::cli::ui::{confirm, with_spinner};
use crate::notify::Reported;
use crate::routes::Route;
use crate::structure::{StructureDraft, TaskRef, parse_subtask_path};
use crate::views::templates::{render_template, render_template_list};
use crate::views::widgets::breadcrumb_line;

#[derive(Args)]
pub struct TemplatesCommands {
    #[command(subcommand)]
    pub command: TemplatesSubcommands,
}

#[derive(Subcommand)]
pub enum TemplatesSubcommands {
    /// List active templates
    List {
        /// Include inactive templates (administrators)
        #[arg(long)]
        all: bool,
    },
    /// Show a template's stages, tasks and subtasks
    Show { id: String },
    /// Create a template from a JSON draft (administrators)
    Create {
        #[arg(long)]
        file: PathBuf,
    },
    /// Replace a template's content with a JSON draft (administrators)
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a template (administrators)
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Activate or deactivate a template (administrators)
    ToggleActive {
        id: String,
        /// Set this state instead of flipping the current one
        #[arg(long)]
        active: Option<bool>,
    },
    /// Edit a template's structure in place (administrators)
    Edit {
        id: String,
        #[command(subcommand)]
        op: EditOp,
    },
}

/// Positions are 1-based as shown by `templates show`; stage 0 holds standalone tasks
#[derive(Subcommand)]
pub enum EditOp {
    AddStage {
        #[arg(long)]
        name: String,
        /// ESMERALDA, RUBI, SAFIRA or DIAMANTE
        #[arg(long)]
        gem: Option<GemType>,
        #[arg(long)]
        description: Option<String>,
    },
    RemoveStage { stage: usize },
    AddTask {
        /// Stage position, 0 for a standalone task
        #[arg(long)]
        stage: usize,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove the task at STAGE.TASK
    RemoveTask { path: String },
    /// Add a subtask to the task at STAGE.TASK
    AddSubtask {
        path: String,
        #[arg(long)]
        description: String,
    },
    /// Remove the subtask at STAGE.TASK.SUBTASK
    RemoveSubtask { path: String },
}

/// Shape of the JSON files accepted by `create` and `update`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftFile {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    stages: Vec<Stage>,
    #[serde(default)]
    tasks: Vec<Task>,
}

fn read_draft(path: &Path) -> Result<StructureDraft> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: DraftFile = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid template draft in {}", path.display()))?;
    Ok(StructureDraft::from_parts(file.name, file.description, file.stages, file.tasks))
}

pub async fn templates_command(args: TemplatesCommands, ctx: &mut AppContext) -> Result<()> {
    match args.command {
        TemplatesSubcommands::List { all } => list(ctx, all).await,
        TemplatesSubcommands::Show { id } => show(ctx, &id).await,
        TemplatesSubcommands::Create { file } => {
            let client = ctx.enter(&Route::AdminTemplates)?;
            let draft = read_draft(&file)?;
            save(ctx, &client, None, &draft).await
        }
        TemplatesSubcommands::Update { id, file } => {
            let client = ctx.enter(&Route::AdminTemplateEdit(id.clone()))?;
            let draft = read_draft(&file)?;
            save(ctx, &client, Some(&id), &draft).await
        }
        TemplatesSubcommands::Delete { id, yes } => delete(ctx, &id, yes).await,
        TemplatesSubcommands::ToggleActive { id, active } => toggle_active(ctx, &id, active).await,
        TemplatesSubcommands::Edit { id, op } => edit(ctx, &id, op).await,
    }
}

async fn list(ctx: &AppContext, all: bool) -> Result<()> {
    let route = if all { Route::AdminTemplates } else { Route::Templates };
    let client = ctx.enter(&route)?;

    let templates = with_spinner("Carregando templates...", client.list_templates(all)).await?;
    let templates: Vec<Template> = if all {
        templates
    } else {
        templates.into_iter().filter(|t| t.is_active).collect()
    };

    println!("{}", breadcrumb_line(&route, &DynamicLabels::default()));
    println!("{}", render_template_list(&templates));
    Ok(())
}

async fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let route = Route::TemplateDetail(id.to_string());
    let client = ctx.enter(&route)?;

    let template = match with_spinner("Carregando template...", client.get_template(id)).await {
        Ok(template) => template,
        Err(e) => {
            ctx.notifier.error("Erro ao carregar template");
            return Err(e.context(Reported("Erro ao carregar template".into())));
        }
    };

    let mut labels = DynamicLabels::default();
    labels.set(id, template.name.clone());
    println!("{}", breadcrumb_line(&route, &labels));
    println!("{}", render_template(&template));
    Ok(())
}

/// Validates and sends a draft; `id` selects update over create
async fn save(ctx: &AppContext, client: &BlueprintClient, id: Option<&str>, draft: &StructureDraft) -> Result<()> {
    if let Err(e) = draft.validate_template() {
        let message = e.to_string();
        ctx.notifier.warning(&message);
        return Err(anyhow::Error::new(e).context(Reported(message)));
    }

    let payload = draft.to_template_payload();
    let result = match id {
        Some(id) => with_spinner("Salvando template...", client.update_template(id, &payload)).await,
        None => with_spinner("Criando template...", client.create_template(&payload)).await,
    };

    match result {
        Ok(template) => {
            info!("Saved template {}", template.id);
            ctx.notifier.success(if id.is_some() {
                "Template atualizado com sucesso!"
            } else {
                "Template criado com sucesso!"
            });
            println!("{}", render_template(&template));
            Ok(())
        }
        Err(e) => {
            let message = format!("Erro ao salvar template: {}", message_or(&e, "Erro desconhecido"));
            ctx.notifier.error(&message);
            Err(e.context(Reported(message)))
        }
    }
}

async fn delete(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    let client = ctx.enter(&Route::AdminTemplates)?;
    let template = with_spinner("Carregando template...", client.get_template(id)).await?;

    if !confirm(&format!("Excluir o template \"{}\"?", template.name), yes)? {
        ctx.notifier.info("Operação cancelada");
        return Ok(());
    }

    match with_spinner("Excluindo...", client.delete_template(id)).await {
        Ok(()) => {
            ctx.notifier.success("Template excluído com sucesso!");
            Ok(())
        }
        Err(e) => {
            let message = format!("Erro ao excluir template: {}", message_or(&e, "Erro desconhecido"));
            ctx.notifier.error(&message);
            Err(e.context(Reported(message)))
        }
    }
}

async fn toggle_active(ctx: &AppContext, id: &str, active: Option<bool>) -> Result<()> {
    let client = ctx.enter(&Route::AdminTemplates)?;
    let result = match active {
        Some(active) => with_spinner("Salvando...", client.set_template_active(id, active)).await,
        None => with_spinner("Salvando...", client.toggle_template_active(id)).await,
    };

    match result {
        Ok(template) => {
            let action = if template.is_active { "ativado" } else { "desativado" };
            ctx.notifier.success(&format!("Template {} com sucesso!", action));
            Ok(())
        }
        Err(e) => {
            let message = format!("Erro ao alterar status: {}", message_or(&e, "Erro desconhecido"));
            ctx.notifier.error(&message);
            Err(e.context(Reported(message)))
        }
    }
}

fn stage_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| anyhow::anyhow!("Positions start at 1"))
}

pub(crate) fn apply_edit(draft: &mut StructureDraft, op: EditOp) -> Result<String> {
    Ok(match op {
        EditOp::AddStage { name, gem, description } => {
            let index = draft.add_stage(name.clone(), gem);
            draft.stage_mut(index)?.description = description;
            format!("Etapa \"{}\" adicionada na posição {}", name, index + 1)
        }
        EditOp::RemoveStage { stage } => {
            let removed = draft.remove_stage(stage_index(stage)?)?;
            format!("Etapa \"{}\" removida", removed.name)
        }
        EditOp::AddTask { stage: 0, title, description } => {
            let index = draft.add_standalone_task(title.clone(), description);
            format!("Tarefa \"{}\" adicionada em 0.{}", title, index + 1)
        }
        EditOp::AddTask { stage, title, description } => {
            let index = draft.add_task_to_stage(stage_index(stage)?, title.clone(), description)?;
            format!("Tarefa \"{}\" adicionada em {}.{}", title, stage, index + 1)
        }
        EditOp::RemoveTask { path } => {
            let removed = match TaskRef::parse(&path)? {
                TaskRef::Stage { stage, task } => draft.remove_task_from_stage(stage, task)?,
                TaskRef::Standalone(task) => draft.remove_standalone_task(task)?,
            };
            format!("Tarefa \"{}\" removida", removed.title)
        }
        EditOp::AddSubtask { path, description } => {
            let index = draft.add_subtask(TaskRef::parse(&path)?, description.clone())?;
            format!("Subtarefa \"{}\" adicionada em {}.{}", description, path, index + 1)
        }
        EditOp::RemoveSubtask { path } => {
            let (task, subtask) = parse_subtask_path(&path)?;
            let removed = draft.remove_subtask(task, subtask)?;
            format!("Subtarefa \"{}\" removida", removed.description)
        }
    })
}

async fn edit(ctx: &AppContext, id: &str, op: EditOp) -> Result<()> {
    let client = ctx.enter(&Route::AdminTemplateEdit(id.to_string()))?;

    let template = match with_spinner("Carregando template...", client.get_template(id)).await {
        Ok(template) => template,
        Err(e) => {
            ctx.notifier.error("Erro ao carregar template");
            return Err(e.context(Reported("Erro ao carregar template".into())));
        }
    };

    let mut draft = StructureDraft::from_template(&template);
    let summary = apply_edit(&mut draft, op)?;
    info!("Template {}: {}", id, summary);
    println!("{}", summary);

    save(ctx, &client, Some(id), &draft).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edit_ops() {
        let mut draft = StructureDraft::new("T", "");
        apply_edit(
            &mut draft,
            EditOp::AddStage {
                name: "Fundação".into(),
                gem: Some(GemType::Rubi),
                description: None,
            },
        )
        .unwrap();
        apply_edit(
            &mut draft,
            EditOp::AddTask {
                stage: 1,
                title: "Oferta".into(),
                description: None,
            },
        )
        .unwrap();
        apply_edit(
            &mut draft,
            EditOp::AddTask {
                stage: 0,
                title: "Avulsa".into(),
                description: None,
            },
        )
        .unwrap();
        let summary = apply_edit(
            &mut draft,
            EditOp::AddSubtask {
                path: "1.1".into(),
                description: "Definir preço".into(),
            },
        )
        .unwrap();
        assert!(summary.contains("1.1.1"));
        assert_eq!(draft.stages[0].gem_type, GemType::Rubi);
        assert_eq!(draft.tasks.len(), 1);

        apply_edit(&mut draft, EditOp::RemoveSubtask { path: "1.1.1".into() }).unwrap();
        assert!(draft.stages[0].tasks[0].subtasks.is_empty());
        apply_edit(&mut draft, EditOp::RemoveTask { path: "0.1".into() }).unwrap();
        assert!(draft.tasks.is_empty());
        assert!(apply_edit(&mut draft, EditOp::RemoveStage { stage: 0 }).is_err());
        apply_edit(&mut draft, EditOp::RemoveStage { stage: 1 }).unwrap();
        assert!(draft.stages.is_empty());
    }

    #[test]
    fn test_draft_file_parsing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("template.json");
        std::fs::write(
            &path,
            r#"{ "name": "Lançamento", "stages": [ { "name": "E1", "gemType": "SAFIRA",
                 "tasks": [ { "title": "T", "subtasks": [ { "description": "S" } ] } ] } ] }"#,
        )
        .unwrap();

        let draft = read_draft(&path).unwrap();
        assert_eq!(draft.name, "Lançamento");
        assert_eq!(draft.stages[0].gem_type, GemType::Safira);
        assert!(draft.validate_template().is_ok());
        assert!(read_draft(&dir.path().join("missing.json")).is_err());
    }
}
