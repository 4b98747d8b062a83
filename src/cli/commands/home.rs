use anyhow::Result;

use crate::api::error::message_or;
use crate::board::Kanban;
use crate::cli::context::AppContext;
use crate::cli::ui::with_spinner;
use crate::notify::Reported;
use crate::routes::Route;
use crate::views::HomeScreen;
use crate::views::widgets::breadcrumb_line;

pub async fn home_command(ctx: &mut AppContext) -> Result<()> {
    let route = Route::Home;
    let client = ctx.enter(&route)?;
    let user = ctx.session.require_user()?;

    let (projects, templates) = with_spinner("Carregando...", async {
        tokio::join!(client.my_projects(), client.list_templates(false))
    })
    .await;

    let projects = match projects {
        Ok(projects) => projects,
        Err(e) => {
            let message = message_or(&e, "Erro ao carregar projetos");
            println!("{}", HomeScreen::Failed(message.clone()).render());
            return Err(e.context(Reported(message)));
        }
    };
    let templates = templates.unwrap_or_else(|e| {
        log::warn!("Failed to load templates for the dashboard: {:#}", e);
        Vec::new()
    });

    let kanban = Kanban::from_projects(&projects);
    println!("{}", breadcrumb_line(&route, &Default::default()));
    println!(
        "{}",
        HomeScreen::Ready {
            user,
            projects: &projects,
            templates: &templates,
            kanban: &kanban,
        }
        .render()
    );
    Ok(())
}
