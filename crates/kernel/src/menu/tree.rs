//! Nested navigation tree for rendering.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{MenuItem, Principal};

/// One rendered menu entry with its visible children.
#[derive(Debug, Clone, Serialize)]
pub struct MenuNode {
    #[serde(flatten)]
    pub item: MenuItem,

    /// Whether the item has any active submenus, visible or not.
    pub has_submenus: bool,

    pub children: Vec<MenuNode>,
}

/// Assemble the navigation tree a viewer sees.
///
/// `items` should hold the active items; order does not matter. Roots and
/// children are both filtered by [`MenuItem::visible_to`], and a hidden item
/// hides its whole subtree. Items whose parent is absent from `items` are
/// unreachable and dropped.
pub fn build_tree(items: Vec<MenuItem>, viewer: &dyn Principal) -> Vec<MenuNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<MenuItem>> = HashMap::new();
    for item in items {
        by_parent.entry(item.parent_id).or_default().push(item);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(MenuItem::display_cmp);
    }

    attach(None, &mut by_parent, viewer)
}

fn attach(
    parent: Option<Uuid>,
    by_parent: &mut HashMap<Option<Uuid>, Vec<MenuItem>>,
    viewer: &dyn Principal,
) -> Vec<MenuNode> {
    // Taking the sibling list out of the map means a corrupt cycle can
    // never be walked twice.
    let Some(siblings) = by_parent.remove(&parent) else {
        return Vec::new();
    };

    siblings
        .into_iter()
        .filter(|item| item.visible_to(viewer))
        .map(|item| {
            let has_submenus = by_parent.contains_key(&Some(item.id));
            let children = attach(Some(item.id), by_parent, viewer);
            MenuNode {
                item,
                has_submenus,
                children,
            }
        })
        .collect()
}
