//! Breadcrumb trail for the active route
//!
//! The active route is a tree of [`RouteNode`]s, one level per nesting depth.
//! Building the trail is a pure function of that tree and the registered
//! dynamic labels.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Label of the fixed first crumb that links to `/`
pub const HOME_LABEL: &str = "Início";

/// 20+ character lowercase ids and UUIDs are never shown
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-z0-9]{20,}$|^(?i:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$",
    )
    .expect("id pattern is valid")
});

const ROUTE_LABELS: [(&str, &str); 10] = [
    ("home", "Dashboard"),
    ("projects", "Projetos"),
    ("templates", "Templates"),
    ("admin", "Admin"),
    ("users", "Usuários"),
    ("settings", "Configurações"),
    ("login", "Login"),
    ("manage", "Gerenciar"),
    ("create", "Criar"),
    ("edit", "Editar"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

/// One matched level of the active route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteNode {
    pub segments: Vec<String>,
    /// Label supplied by the route definition, applied to each of its segments
    pub breadcrumb: Option<String>,
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// An unnamed root with the path's segments nested one per level
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path
            .split('?')
            .next()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut node: Option<RouteNode> = None;
        for segment in segments.into_iter().rev() {
            node = Some(RouteNode {
                segments: vec![segment.to_string()],
                breadcrumb: None,
                children: node.into_iter().collect(),
            });
        }

        RouteNode {
            children: node.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_breadcrumb(mut self, label: impl Into<String>) -> Self {
        self.breadcrumb = Some(label.into());
        self
    }
}

/// Labels registered at runtime for specific segments, such as a project's name for its id
#[derive(Debug, Clone, Default)]
pub struct DynamicLabels {
    labels: HashMap<String, String>,
}

impl DynamicLabels {
    pub fn set(&mut self, segment: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(segment.into(), label.into());
    }

    pub fn get(&self, segment: &str) -> Option<&str> {
        self.labels
            .get(segment)
            .map(String::as_str)
            .filter(|l| !l.is_empty())
    }

    pub fn clear(&mut self, segment: &str) {
        self.labels.remove(segment);
    }

    pub fn clear_all(&mut self) {
        self.labels.clear();
    }
}

pub fn is_id_segment(segment: &str) -> bool {
    ID_PATTERN.is_match(segment)
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Static label for a segment; `None` for id segments
pub fn label_for(segment: &str) -> Option<String> {
    if let Some((_, label)) = ROUTE_LABELS.iter().find(|(key, _)| *key == segment) {
        return Some((*label).to_string());
    }
    if is_id_segment(segment) {
        return None;
    }
    Some(capitalize(segment))
}

/// Walks the route tree one child level at a time, following the first child
pub fn build_breadcrumbs(root: &RouteNode, dynamic: &DynamicLabels) -> Vec<Breadcrumb> {
    let mut breadcrumbs = Vec::new();
    let mut url = String::new();
    let mut current = root;

    while let Some(child) = current.children.first() {
        for segment in child.segments.iter().filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(segment);

            let label = child
                .breadcrumb
                .clone()
                .filter(|l| !l.is_empty())
                .or_else(|| dynamic.get(segment).map(str::to_string))
                .or_else(|| label_for(segment));

            if let Some(label) = label {
                breadcrumbs.push(Breadcrumb {
                    label,
                    url: url.clone(),
                });
            }
        }
        current = child;
    }

    breadcrumbs
}

/// Convenience for a plain path without route-provided labels
pub fn breadcrumbs_for_path(path: &str, dynamic: &DynamicLabels) -> Vec<Breadcrumb> {
    build_breadcrumbs(&RouteNode::from_path(path), dynamic)
}

/// `Início / Projetos / Gerenciar`; empty when there are no crumbs
pub fn render_trail(breadcrumbs: &[Breadcrumb]) -> String {
    if breadcrumbs.is_empty() {
        return String::new();
    }
    std::iter::once(HOME_LABEL)
        .chain(breadcrumbs.iter().map(|b| b.label.as_str()))
        .collect::<Vec<_>>()
        .join(" / ")
}
