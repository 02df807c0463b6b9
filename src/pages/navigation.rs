//! Site navigation: the header menu as a tree.
//!
//! `GET api/navigation.php?entity=menu_items` returns a flat list where each
//! entry names its parent.  [`build_tree`] turns it into nested
//! [`MenuNode`]s ordered by `position`.

use std::collections::{HashMap, HashSet};

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde::Deserialize;

use super::{Lifecycle, Page};
use crate::fetch::{fetch, Transport};
use crate::lifecycle::{DataView, Outcome, ViewState};
use crate::normalize::{decode_items_with, lenient, Aliases, NO_RECORDS};
use crate::render::{render_state, BranchCopy};
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuItem {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    /// `None`, `0` or an unknown id all mean "top level".
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub position: Option<i64>,
    #[serde(default = "active", deserialize_with = "lenient::flag")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

const MENU_ALIASES: Aliases = &[
    ("name", &["link_name", "title"]),
    ("link", &["url", "href"]),
    ("position", &["sort_order"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub item: MenuItem,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MenuNode::count).sum::<usize>()
    }
}

/// Build the menu tree from a flat list.
///
/// Siblings are ordered by `position` (missing positions last), ties keep
/// input order.  Entries whose parent is missing become top-level.  Entries
/// caught in a parent cycle are never reachable from the top, so the first of
/// each cycle (in input order) is promoted to top level, breaking it.
pub fn build_tree(items: Vec<MenuItem>) -> Vec<MenuNode> {
    let items: Vec<MenuItem> = items.into_iter().filter(|i| i.is_active).collect();
    let ids: HashSet<i64> = items.iter().filter_map(|i| i.id).collect();

    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match item.parent_id {
            Some(parent) if parent != 0 && ids.contains(&parent) && item.id != Some(parent) => {
                children.entry(parent).or_default().push(index)
            }
            _ => roots.push(index),
        }
    }

    let order = |list: &mut Vec<usize>| {
        list.sort_by_key(|&i| (items[i].position.is_none(), items[i].position));
    };
    order(&mut roots);
    for list in children.values_mut() {
        order(list);
    }

    let mut visited = vec![false; items.len()];
    let mut tree: Vec<MenuNode> = roots
        .iter()
        .filter_map(|&i| grow(i, &items, &children, &mut visited))
        .collect();

    // Whatever is left hangs off a cycle.
    for index in 0..items.len() {
        if let Some(node) = grow(index, &items, &children, &mut visited) {
            tree.push(node);
        }
    }
    tree
}

fn grow(
    index: usize,
    items: &[MenuItem],
    children: &HashMap<i64, Vec<usize>>,
    visited: &mut [bool],
) -> Option<MenuNode> {
    if visited[index] {
        return None;
    }
    visited[index] = true;

    let item = &items[index];
    let kids = item
        .id
        .and_then(|id| children.get(&id))
        .map(|list| {
            list.iter()
                .filter_map(|&child| grow(child, items, children, visited))
                .collect()
        })
        .unwrap_or_default();

    Some(MenuNode {
        item: item.clone(),
        children: kids,
    })
}

fn tree_lines(tree: &[MenuNode]) -> Vec<Line<'static>> {
    fn walk(nodes: &[MenuNode], depth: usize, lines: &mut Vec<Line<'static>>) {
        for node in nodes {
            let style = if depth == 0 {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let mut spans = vec![Span::styled(
                format!("{}{}", "  ".repeat(depth), node.item.name),
                style,
            )];
            if let Some(link) = &node.item.link {
                spans.push(Span::styled(format!("  {link}"), Style::default().fg(Color::DarkGray)));
            }
            lines.push(Line::from(spans));
            walk(&node.children, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(tree, 0, &mut lines);
    lines
}

const COPY: BranchCopy = BranchCopy {
    subject: "menu",
    empty: "The site menu is empty.",
    retry: true,
};

pub struct NavigationPage {
    view: DataView<Vec<MenuNode>>,
}

impl NavigationPage {
    pub fn new() -> Self {
        let resource = Resource::get("api/navigation.php").param("entity", "menu_items");
        let view = DataView::new("navigation", "Error loading the site menu", move |transport: &dyn Transport| {
            let normalized = fetch(transport, &resource)?;
            if let Some(reason) = normalized.no_data_reason() {
                return Ok(Outcome::Empty(reason.to_string()));
            }
            let tree = build_tree(decode_items_with(normalized.into_items(), MENU_ALIASES)?);
            Ok(Outcome::from_vec(tree, NO_RECORDS))
        });
        Self { view }
    }

    pub fn state(&self) -> &ViewState<Vec<MenuNode>> {
        self.view.state()
    }
}

impl Default for NavigationPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for NavigationPage {
    fn title(&self) -> &str {
        "Menu"
    }

    fn slug(&self) -> &'static str {
        "navigation"
    }

    fn view(&self) -> &dyn Lifecycle {
        &self.view
    }

    fn view_mut(&mut self) -> &mut dyn Lifecycle {
        &mut self.view
    }

    fn lines(&self) -> Vec<Line<'static>> {
        render_state(self.view.state(), &COPY, |tree| tree_lines(tree))
    }
}
