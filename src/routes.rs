//! Route table and access guards
//!
//! Every screen the CLI renders corresponds to one [`Route`]. Commands check
//! the route's guard before they talk to the server.

use std::fmt;

use crate::api::models::User;
use crate::breadcrumb::{Breadcrumb, DynamicLabels, RouteNode, build_breadcrumbs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Public,
    Authenticated,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
    RedirectHome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Templates,
    TemplateDetail(String),
    Projects,
    ProjectDetail(String),
    ProjectManage(String),
    ProjectCreate(String),
    AdminTemplates,
    AdminTemplateEdit(String),
    AdminUsers,
    AdminSettings,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Home => "/home".to_string(),
            Route::Templates => "/templates".to_string(),
            Route::TemplateDetail(id) => format!("/templates/{}", id),
            Route::Projects => "/projects".to_string(),
            Route::ProjectDetail(id) => format!("/projects/{}", id),
            Route::ProjectManage(id) => format!("/projects/{}/manage", id),
            Route::ProjectCreate(template_id) => format!("/projects/create/{}", template_id),
            Route::AdminTemplates => "/admin/templates".to_string(),
            Route::AdminTemplateEdit(id) => format!("/admin/templates/{}/edit", id),
            Route::AdminUsers => "/admin/users".to_string(),
            Route::AdminSettings => "/admin/settings".to_string(),
        }
    }

    pub fn guard(&self) -> Guard {
        match self {
            Route::Login => Guard::Public,
            Route::AdminTemplates
            | Route::AdminTemplateEdit(_)
            | Route::AdminUsers
            | Route::AdminSettings => Guard::Admin,
            _ => Guard::Authenticated,
        }
    }

    /// Parses a path back into a route; unknown paths yield `None`
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let route = match segments.as_slice() {
            [] | ["home"] => Route::Home,
            ["login"] => Route::Login,
            ["templates"] => Route::Templates,
            ["templates", id] => Route::TemplateDetail(id.to_string()),
            ["projects"] => Route::Projects,
            ["projects", "create", template_id] => Route::ProjectCreate(template_id.to_string()),
            ["projects", id] => Route::ProjectDetail(id.to_string()),
            ["projects", id, "manage"] => Route::ProjectManage(id.to_string()),
            ["admin", "templates"] => Route::AdminTemplates,
            ["admin", "templates", id, "edit"] => Route::AdminTemplateEdit(id.to_string()),
            ["admin", "users"] => Route::AdminUsers,
            ["admin", "settings"] => Route::AdminSettings,
            _ => return None,
        };
        Some(route)
    }

    /// Route tree as matched by the router; `/projects/create/:id` carries its own label
    pub fn route_tree(&self) -> RouteNode {
        match self {
            Route::ProjectCreate(template_id) => RouteNode {
                children: vec![RouteNode {
                    segments: vec!["projects".to_string()],
                    breadcrumb: None,
                    children: vec![
                        RouteNode {
                            segments: vec!["create".to_string(), template_id.clone()],
                            ..Default::default()
                        }
                        .with_breadcrumb("Novo projeto"),
                    ],
                }],
                ..Default::default()
            },
            _ => RouteNode::from_path(&self.path()),
        }
    }

    pub fn breadcrumbs(&self, dynamic: &DynamicLabels) -> Vec<Breadcrumb> {
        build_breadcrumbs(&self.route_tree(), dynamic)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn check_access(route: &Route, user: Option<&User>) -> Access {
    match (route.guard(), user) {
        (Guard::Public, _) => Access::Granted,
        (_, None) => Access::RedirectToLogin,
        (Guard::Admin, Some(user)) if !user.is_admin() => Access::RedirectHome,
        _ => Access::Granted,
    }
}
